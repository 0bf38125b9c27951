//! Web crawling: fetcher boundary, link discovery, bounded worker pool
//!
//! The crawl phase runs fetch → extract → sink pipelines over a shared
//! [`Frontier`]. Fetching sits behind the [`PageFetcher`] trait so tests can
//! crawl without a network; link discovery feeds same-scope links back into
//! the frontier.

mod frontier;

pub use frontier::{normalize_url, EntryState, Frontier};

use crate::config::CrawlConfig;
use crate::corpus::{CorpusSink, PageRecord};
use crate::error::{Error, Result};
use crate::extract::ContentExtractor;
use async_trait::async_trait;
use indicatif::ProgressBar;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

/// Raw page representation returned by a fetcher
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    pub html: String,
}

/// External fetch collaborator
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// Plain HTTP fetcher
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| Error::Fetch(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        debug!("Fetching: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!("HTTP {status}: {url}")));
        }

        if let Some(ct) = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !ct.contains("html") && !ct.contains("text") {
                return Err(Error::Fetch(format!("unsupported content type {ct}: {url}")));
            }
        }

        let final_url = response.url().to_string();
        let html = response
            .text()
            .await
            .map_err(|e| Error::Fetch(format!("{url}: {e}")))?;

        Ok(FetchedPage {
            url: final_url,
            html,
        })
    }
}

/// Extract absolute same-protocol hyperlinks from a page, resolving
/// relative hrefs against the page URL.
pub fn discover_links(html: &str, page_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut links = Vec::new();
    for el in document.select(&selector) {
        if let Some(href) = el.value().attr("href") {
            if let Ok(resolved) = base.join(href) {
                if matches!(resolved.scheme(), "http" | "https") {
                    links.push(resolved.to_string());
                }
            }
        }
    }
    links
}

static DATE_ARCHIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\d{4}/\d{2}/\d{2}/").expect("static regex"));

/// Filter out URLs that are never worth fetching from a docs site.
pub fn should_enqueue(url: &str) -> bool {
    let lower = url.to_lowercase();

    let skip_patterns = [
        "/login", "/logout", "/signin", "/signout", "/register", "/admin", "/cgi-bin/",
        "javascript:", "mailto:", "tel:",
    ];
    for pattern in skip_patterns {
        if lower.contains(pattern) {
            return false;
        }
    }

    !DATE_ARCHIVE.is_match(&lower)
}

/// Counters shared across crawl workers
#[derive(Default)]
struct Counters {
    crawled: AtomicU32,
    failed: AtomicU32,
    skipped: AtomicU32,
}

/// Summary of one crawl run
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CrawlStats {
    /// Pages fetched and extracted into the corpus
    pub pages_crawled: u32,
    /// Fetch attempts that errored
    pub pages_failed: u32,
    /// Pages fetched but dropped below the extraction threshold
    pub pages_skipped: u32,
}

/// Records plus stats from one crawl run
pub struct CrawlOutcome {
    pub records: Vec<PageRecord>,
    pub stats: CrawlStats,
}

enum Pull {
    Url(String),
    Wait,
    Done,
}

/// Drives the crawl phase: a bounded pool of workers pulling from one
/// frontier, each running fetch → extract → sink.
pub struct Crawler {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<ContentExtractor>,
    config: CrawlConfig,
}

impl Crawler {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<ContentExtractor>,
        config: CrawlConfig,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            config,
        }
    }

    /// Crawl from a seed URL until the frontier is exhausted or a budget
    /// (page count, wall clock) runs out. In-flight fetches complete before
    /// the run returns.
    pub async fn run(&self, root_url: &str, progress: Option<ProgressBar>) -> Result<CrawlOutcome> {
        let frontier = Arc::new(Mutex::new(Frontier::new(
            root_url,
            self.config.scope.as_deref(),
        )?));
        info!(
            "Restricting crawl to scope: {}",
            frontier.lock().await.scope()
        );

        let sink = Arc::new(CorpusSink::new());
        let counters = Arc::new(Counters::default());
        let deadline = self
            .config
            .max_seconds
            .map(|s| Instant::now() + Duration::from_secs(s));

        let workers = (0..self.config.concurrency.max(1)).map(|_| {
            self.worker(
                Arc::clone(&frontier),
                Arc::clone(&sink),
                Arc::clone(&counters),
                deadline,
                progress.clone(),
            )
        });
        futures::future::join_all(workers).await;

        let stats = CrawlStats {
            pages_crawled: counters.crawled.load(Ordering::Relaxed),
            pages_failed: counters.failed.load(Ordering::Relaxed),
            pages_skipped: counters.skipped.load(Ordering::Relaxed),
        };
        info!(
            "Crawled {} pages from {} ({} failed, {} below threshold)",
            stats.pages_crawled, root_url, stats.pages_failed, stats.pages_skipped
        );

        Ok(CrawlOutcome {
            records: sink.export_all().await,
            stats,
        })
    }

    async fn worker(
        &self,
        frontier: Arc<Mutex<Frontier>>,
        sink: Arc<CorpusSink>,
        counters: Arc<Counters>,
        deadline: Option<Instant>,
        progress: Option<ProgressBar>,
    ) {
        loop {
            if deadline.map(|d| Instant::now() > d).unwrap_or(false) {
                debug!("Crawl time budget exceeded; worker stopping");
                break;
            }

            let pull = {
                let mut f = frontier.lock().await;
                if f.attempts() >= self.config.max_pages {
                    Pull::Done
                } else if let Some(url) = f.next_pending() {
                    Pull::Url(url)
                } else if f.is_exhausted() {
                    Pull::Done
                } else {
                    // Another worker may still discover links
                    Pull::Wait
                }
            };

            let url = match pull {
                Pull::Url(url) => url,
                Pull::Wait => {
                    tokio::time::sleep(Duration::from_millis(25)).await;
                    continue;
                }
                Pull::Done => break,
            };

            match self.fetcher.fetch(&url).await {
                Ok(page) => {
                    let links = discover_links(&page.html, &page.url);
                    let extraction = self.extractor.extract(&url, &page.html);

                    {
                        let mut f = frontier.lock().await;
                        for link in &links {
                            if should_enqueue(link) {
                                f.enqueue(link);
                            }
                        }
                        f.mark_visited(&url);
                    }

                    match extraction {
                        Ok(markdown) => {
                            info!("Crawled {}", url);
                            sink.append(PageRecord {
                                url: url.clone(),
                                markdown,
                            })
                            .await;
                            counters.crawled.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(Error::ExtractionFailed {
                            chars, threshold, ..
                        }) => {
                            warn!(
                                "Dropping {}: extracted {} chars, below threshold {}",
                                url, chars, threshold
                            );
                            counters.skipped.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => {
                            warn!("Dropping {}: {}", url, e);
                            counters.skipped.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
                Err(e) => {
                    warn!("Failed to fetch {}: {}", url, e);
                    frontier.lock().await.mark_failed(&url, &e.to_string());
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                }
            }

            if let Some(pb) = &progress {
                pb.inc(1);
                pb.set_message(url);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LONG_PARAGRAPH: &str = "This page describes the system in enough detail to clear \
        any reasonable extraction threshold. It explains the controls, the indicator lights, \
        and the conditions under which each feature can be engaged safely on the road.";

    fn html_page(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(
            format!("<html><body><article>{body}</article></body></html>").into_bytes(),
            "text/html",
        )
    }

    fn crawler(threshold: usize, config: CrawlConfig) -> Crawler {
        let fetcher = Arc::new(HttpFetcher::new(&config).expect("client should build"));
        let extractor = Arc::new(ContentExtractor::new(&ExtractConfig {
            char_threshold: threshold,
        }));
        Crawler::new(fetcher, extractor, config)
    }

    fn test_config() -> CrawlConfig {
        CrawlConfig {
            max_pages: 50,
            concurrency: 2,
            timeout_secs: 5,
            ..CrawlConfig::default()
        }
    }

    #[test]
    fn test_discover_links_resolves_relative_hrefs() {
        let html = r#"<a href="/docs/a">A</a> <a href="b">B</a> <a href="mailto:x@y">M</a>"#;
        let links = discover_links(html, "https://example.com/docs/index");
        assert_eq!(
            links,
            vec![
                "https://example.com/docs/a",
                "https://example.com/docs/b",
            ]
        );
    }

    #[test]
    fn test_should_enqueue_filters_non_document_urls() {
        assert!(should_enqueue("https://example.com/docs/intro"));
        assert!(!should_enqueue("https://example.com/login"));
        assert!(!should_enqueue("javascript:void(0)"));
        assert!(!should_enqueue("https://example.com/2024/01/15/post"));
    }

    #[tokio::test]
    async fn test_crawl_visits_exactly_the_in_scope_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/docs"))
            .respond_with(html_page(&format!(
                r#"<p>{LONG_PARAGRAPH}</p>
                   <a href="/docs/a">A</a>
                   <a href="/docs/b">B</a>
                   <a href="/other/c">Off scope</a>"#
            )))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/a"))
            .respond_with(html_page(LONG_PARAGRAPH))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/b"))
            .respond_with(html_page(LONG_PARAGRAPH))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/other/c"))
            .respond_with(html_page(LONG_PARAGRAPH))
            .expect(0)
            .mount(&server)
            .await;

        let root = format!("{}/docs", server.uri());
        let outcome = crawler(50, test_config()).run(&root, None).await.unwrap();

        assert_eq!(outcome.stats.pages_crawled, 3);
        assert_eq!(outcome.stats.pages_failed, 0);
        let urls: Vec<_> = outcome.records.iter().map(|r| r.url.as_str()).collect();
        assert!(urls.iter().all(|u| u.contains("/docs")));
        assert_eq!(urls.len(), 3);
    }

    #[tokio::test]
    async fn test_thin_page_is_dropped_and_crawl_continues() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/docs"))
            .respond_with(html_page(&format!(
                r#"<p>{LONG_PARAGRAPH}</p>
                   <a href="/docs/thin">Thin</a>
                   <a href="/docs/full">Full</a>"#
            )))
            .mount(&server)
            .await;
        // 50 characters of content against a threshold of 200
        Mock::given(method("GET"))
            .and(path("/docs/thin"))
            .respond_with(html_page("Fifty characters of content, not nearly enough md."))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/full"))
            .respond_with(html_page(LONG_PARAGRAPH))
            .mount(&server)
            .await;

        let root = format!("{}/docs", server.uri());
        let outcome = crawler(200, test_config()).run(&root, None).await.unwrap();

        assert_eq!(outcome.stats.pages_crawled, 2);
        assert_eq!(outcome.stats.pages_skipped, 1);
        assert!(outcome.records.iter().all(|r| !r.url.ends_with("/thin")));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_isolated() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/docs"))
            .respond_with(html_page(&format!(
                r#"<p>{LONG_PARAGRAPH}</p>
                   <a href="/docs/missing">Missing</a>
                   <a href="/docs/ok">Ok</a>"#
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/ok"))
            .respond_with(html_page(LONG_PARAGRAPH))
            .mount(&server)
            .await;

        let root = format!("{}/docs", server.uri());
        let outcome = crawler(50, test_config()).run(&root, None).await.unwrap();

        assert_eq!(outcome.stats.pages_failed, 1);
        assert_eq!(outcome.stats.pages_crawled, 2);
    }

    #[tokio::test]
    async fn test_max_pages_budget_stops_pulling() {
        let server = MockServer::start().await;

        let mut links = String::new();
        for i in 0..20 {
            links.push_str(&format!(r#"<a href="/docs/p{i}">p{i}</a>"#));
        }
        Mock::given(method("GET"))
            .and(path("/docs"))
            .respond_with(html_page(&format!("<p>{LONG_PARAGRAPH}</p>{links}")))
            .mount(&server)
            .await;
        for i in 0..20 {
            Mock::given(method("GET"))
                .and(path(format!("/docs/p{i}")))
                .respond_with(html_page(LONG_PARAGRAPH))
                .mount(&server)
                .await;
        }

        let mut config = test_config();
        config.max_pages = 3;
        let root = format!("{}/docs", server.uri());
        let outcome = crawler(50, config).run(&root, None).await.unwrap();

        let total = outcome.stats.pages_crawled + outcome.stats.pages_failed
            + outcome.stats.pages_skipped;
        assert!(total <= 3, "budget exceeded: {total} fetch attempts");
    }
}
