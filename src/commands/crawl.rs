//! Crawl command implementation

use crate::config::Config;
use crate::corpus;
use crate::crawl::{Crawler, CrawlStats, HttpFetcher};
use crate::error::Result;
use crate::extract::ContentExtractor;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// CLI overrides for the crawl phase
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Restrict crawling to this URL prefix instead of the root itself
    pub scope: Option<String>,
    pub max_pages: Option<u32>,
    pub concurrency: Option<usize>,
}

/// Crawl result for CLI display
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub root_url: String,
    pub output: PathBuf,
    pub stats: CrawlStats,
}

/// Crawl a documentation site and export the corpus as CSV.
pub async fn cmd_crawl(
    config: &Config,
    url: &str,
    out: &Path,
    options: CrawlOptions,
) -> Result<CrawlReport> {
    let mut crawl_config = config.crawl.clone();
    if options.scope.is_some() {
        crawl_config.scope = options.scope;
    }
    if let Some(n) = options.max_pages {
        crawl_config.max_pages = n;
    }
    if let Some(n) = options.concurrency {
        crawl_config.concurrency = n;
    }

    let fetcher = Arc::new(HttpFetcher::new(&crawl_config)?);
    let extractor = Arc::new(ContentExtractor::new(&config.extract));
    let crawler = Crawler::new(fetcher, extractor, crawl_config);

    let progress = crawl_progress_bar();
    let outcome = crawler.run(url, Some(progress.clone())).await?;
    progress.finish_and_clear();

    corpus::export_csv(&outcome.records, out)?;
    info!("Wrote {} records to {}", outcome.records.len(), out.display());

    Ok(CrawlReport {
        root_url: url.to_string(),
        output: out.to_path_buf(),
        stats: outcome.stats,
    })
}

pub(super) fn crawl_progress_bar() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner} {pos} pages  {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    bar.set_style(style);
    bar
}

pub fn print_crawl_report(report: &CrawlReport) {
    println!("\n📄 Corpus written to {}\n", report.output.display());
    println!("  Pages crawled:   {}", report.stats.pages_crawled);
    println!("  Fetch failures:  {}", report.stats.pages_failed);
    println!("  Below threshold: {}", report.stats.pages_skipped);
}
