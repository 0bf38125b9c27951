//! Corpus sink: durable accumulation of extracted pages
//!
//! Stores `{url, content}` records in insertion order, deduplicated by URL.
//! The sink is shared across crawl workers, so appends go through an
//! interior mutex. Export/import uses CSV with two named columns, which
//! decouples the crawl phase from indexing and answering.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::Mutex;

/// One successfully fetched and extracted page. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    #[serde(rename = "content")]
    pub markdown: String,
}

#[derive(Default)]
struct CorpusInner {
    records: Vec<PageRecord>,
    by_url: HashMap<String, usize>,
}

/// Insertion-ordered, URL-keyed record store.
#[derive(Default)]
pub struct CorpusSink {
    inner: Mutex<CorpusInner>,
}

impl CorpusSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record keyed by URL. A duplicate URL replaces the earlier
    /// record in place (last write wins).
    pub async fn append(&self, record: PageRecord) {
        let mut inner = self.inner.lock().await;
        match inner.by_url.get(&record.url).copied() {
            Some(idx) => inner.records[idx] = record,
            None => {
                let next = inner.records.len();
                inner.by_url.insert(record.url.clone(), next);
                inner.records.push(record);
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.records.len()
    }

    /// All stored records in insertion order.
    pub async fn export_all(&self) -> Vec<PageRecord> {
        self.inner.lock().await.records.clone()
    }

    /// Write the corpus as CSV rows with `url` and `content` columns.
    pub async fn export_csv(&self, path: &Path) -> Result<usize> {
        export_csv(&self.export_all().await, path)
    }
}

/// Write records as CSV rows with `url` and `content` columns.
/// Any write failure is fatal: a partial corpus must not look complete.
pub fn export_csv(records: &[PageRecord], path: &Path) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| Error::SinkWrite(format!("{}: {e}", path.display())))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| Error::SinkWrite(format!("{}: {e}", path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| Error::SinkWrite(format!("{}: {e}", path.display())))?;
    Ok(records.len())
}

/// Read a previously exported corpus back in, preserving row order.
pub fn import_csv(path: &Path) -> Result<Vec<PageRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: PageRecord = row?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, markdown: &str) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            markdown: markdown.to_string(),
        }
    }

    #[tokio::test]
    async fn test_append_preserves_insertion_order() {
        let sink = CorpusSink::new();
        sink.append(record("https://a", "first")).await;
        sink.append(record("https://b", "second")).await;
        sink.append(record("https://c", "third")).await;

        let all = sink.export_all().await;
        let urls: Vec<_> = all.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a", "https://b", "https://c"]);
    }

    #[tokio::test]
    async fn test_duplicate_url_last_write_wins() {
        let sink = CorpusSink::new();
        sink.append(record("https://a", "old")).await;
        sink.append(record("https://b", "other")).await;
        sink.append(record("https://a", "new")).await;

        let all = sink.export_all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].url, "https://a");
        assert_eq!(all[0].markdown, "new");
    }

    #[tokio::test]
    async fn test_csv_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.csv");

        let sink = CorpusSink::new();
        sink.append(record("https://a", "# Heading\n\nBody, with commas.")).await;
        sink.append(record("https://b", "line one\nline two")).await;
        let written = sink.export_csv(&path).await.unwrap();
        assert_eq!(written, 2);

        let imported = import_csv(&path).unwrap();
        assert_eq!(imported.len(), 2);
        assert_eq!(imported[0].url, "https://a");
        assert_eq!(imported[0].markdown, "# Heading\n\nBody, with commas.");
        assert_eq!(imported[1].markdown, "line one\nline two");
    }

    #[tokio::test]
    async fn test_export_to_bad_path_is_fatal() {
        let sink = CorpusSink::new();
        sink.append(record("https://a", "body")).await;
        let err = sink
            .export_csv(Path::new("/nonexistent-dir/corpus.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SinkWrite(_)));
    }
}
