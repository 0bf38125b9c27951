//! Fixed-window passage chunking
//!
//! Splits a page's Markdown into overlapping character windows for
//! retrieval. Windows are measured in characters but sliced on UTF-8
//! boundaries, and the output is deterministic for identical input.

use crate::config::ChunkConfig;
use crate::corpus::PageRecord;
use serde::Serialize;

/// A bounded-length slice of one document, the unit of retrieval.
#[derive(Debug, Clone, Serialize)]
pub struct Passage {
    pub source_url: String,
    pub text: String,
    /// Position of this passage within its page, preserving document order.
    pub sequence_index: usize,
}

/// Split a record's Markdown into passages of at most `chunk_size` chars,
/// each window after the first starting `chunk_size - overlap` chars after
/// the previous one. The final passage may be shorter.
///
/// `config` must have been validated ([`ChunkConfig::validate`]) before any
/// crawl work; this function assumes `overlap < chunk_size`.
pub fn split(record: &PageRecord, config: &ChunkConfig) -> Vec<Passage> {
    let boundaries: Vec<usize> = record
        .markdown
        .char_indices()
        .map(|(byte, _)| byte)
        .collect();
    let total_chars = boundaries.len();
    if total_chars == 0 {
        return Vec::new();
    }

    let stride = config.chunk_size - config.overlap;
    let mut passages = Vec::new();
    let mut start_char = 0;
    let mut sequence_index = 0;

    while start_char < total_chars {
        let end_char = (start_char + config.chunk_size).min(total_chars);
        let start_byte = boundaries[start_char];
        let end_byte = if end_char == total_chars {
            record.markdown.len()
        } else {
            boundaries[end_char]
        };

        passages.push(Passage {
            source_url: record.url.clone(),
            text: record.markdown[start_byte..end_byte].to_string(),
            sequence_index,
        });
        sequence_index += 1;

        if end_char == total_chars {
            break;
        }
        start_char += stride;
    }

    passages
}

/// Chunk an ordered corpus, keeping page order and per-page passage order.
pub fn split_all(records: &[PageRecord], config: &ChunkConfig) -> Vec<Passage> {
    records.iter().flat_map(|r| split(r, config)).collect()
}
