//! Ask command implementation
//!
//! Runs the whole pipeline for one question: obtain a corpus (crawl a site
//! or load an exported CSV), chunk it, build the vector index, retrieve the
//! top passages, and compose a grounded answer.

use crate::answer::{AnswerComposer, OpenAiChat};
use crate::chunk;
use crate::config::Config;
use crate::corpus;
use crate::crawl::{Crawler, CrawlStats, HttpFetcher};
use crate::error::{Error, Result};
use crate::extract::ContentExtractor;
use crate::index::{OpenAiEmbedder, Retriever, VectorIndex};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// CLI options for answering a question
#[derive(Debug, Clone, Default)]
pub struct AskOptions {
    /// Crawl this URL to build the corpus
    pub url: Option<String>,
    /// Load a previously exported corpus instead of crawling
    pub corpus: Option<PathBuf>,
    /// Number of passages to retrieve
    pub k: Option<usize>,
    /// Also export the crawled corpus to this path
    pub export: Option<PathBuf>,
}

/// Answer result for CLI display
#[derive(Debug, Clone, Serialize)]
pub struct AskReport {
    pub question: String,
    pub answer: String,
    pub pages: usize,
    pub passages_indexed: usize,
    pub passages_skipped: usize,
    pub crawl: Option<CrawlStats>,
}

/// Answer a question against a documentation corpus.
pub async fn cmd_ask(config: &Config, question: &str, options: AskOptions) -> Result<AskReport> {
    // Both checks fail before any crawl work is started
    config.chunk.validate()?;
    config.openai.api_key()?;

    let (records, crawl_stats) = match (&options.corpus, &options.url) {
        (Some(path), _) => (corpus::import_csv(path)?, None),
        (None, Some(url)) => {
            let fetcher = Arc::new(HttpFetcher::new(&config.crawl)?);
            let extractor = Arc::new(ContentExtractor::new(&config.extract));
            let crawler = Crawler::new(fetcher, extractor, config.crawl.clone());

            let progress = super::crawl::crawl_progress_bar();
            let outcome = crawler.run(url, Some(progress.clone())).await?;
            progress.finish_and_clear();

            if let Some(path) = &options.export {
                corpus::export_csv(&outcome.records, path)?;
                info!("Exported corpus to {}", path.display());
            }
            (outcome.records, Some(outcome.stats))
        }
        (None, None) => {
            return Err(Error::Config(
                "either a corpus file or a URL to crawl is required".to_string(),
            ))
        }
    };

    if records.is_empty() {
        return Err(Error::EmptyCorpus(
            "no pages cleared the extraction threshold; nothing to index".to_string(),
        ));
    }

    let passages = chunk::split_all(&records, &config.chunk);
    info!(
        "Split {} pages into {} passages",
        records.len(),
        passages.len()
    );

    let embedder = Arc::new(OpenAiEmbedder::new(&config.openai)?);
    let mut index = VectorIndex::new(embedder);
    let progress = embed_progress_bar(passages.len() as u64);
    let build = index
        .build(
            passages,
            config.openai.batch_size,
            config.openai.embed_concurrency,
            Some(progress.clone()),
        )
        .await?;
    progress.finish_and_clear();

    let k = options.k.unwrap_or(config.query.top_k);
    let retriever = Retriever::new(index, k);
    let context = retriever.retrieve(question).await?;

    let composer = AnswerComposer::new(Box::new(OpenAiChat::new(&config.openai)?));
    let answer = composer.answer(question, &context).await?;

    Ok(AskReport {
        question: question.to_string(),
        answer,
        pages: records.len(),
        passages_indexed: build.indexed,
        passages_skipped: build.skipped,
        crawl: crawl_stats,
    })
}

fn embed_progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    let style = ProgressStyle::with_template("{bar:40} {pos}/{len} passages embedded")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bad_chunk_config_fails_before_any_crawl_work() {
        let mut config = Config::default();
        config.chunk.overlap = config.chunk.chunk_size;

        // Errors out of validation; no fetch, no credential lookup
        let err = cmd_ask(&config, "q", AskOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ChunkConfig { .. }));
    }
}

pub fn print_ask_report(report: &AskReport) {
    println!("\n🔍 Question: {}\n", report.question);
    println!("{}\n", report.answer);
    if let Some(stats) = &report.crawl {
        println!("  Pages crawled:    {}", stats.pages_crawled);
    }
    println!("  Pages in corpus:  {}", report.pages);
    println!("  Passages indexed: {}", report.passages_indexed);
    if report.passages_skipped > 0 {
        println!("  Passages skipped: {}", report.passages_skipped);
    }
}
