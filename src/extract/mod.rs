//! Main-content extraction from noisy HTML
//!
//! Given a fetched page, isolates the human-readable content block and
//! normalizes it to Markdown. The selection heuristic lives behind
//! [`ExtractStrategy`] so it can be swapped without touching the contract:
//! threshold-gated, deterministic, no I/O.

mod markdown;

pub use markdown::to_markdown;

use crate::config::ExtractConfig;
use crate::error::{Error, Result};
use scraper::{ElementRef, Html, Selector};

/// Strategy for locating the main content block of a page.
///
/// Returns the inner HTML of the best content candidate, or `None` when the
/// page has no textual content at all.
pub trait ExtractStrategy: Send + Sync {
    fn select_content(&self, html: &str) -> Option<String>;
}

/// Readability-style heuristic: strip obvious chrome, then score candidate
/// blocks by textual density against link density and keep the best one.
pub struct DensityExtractor;

impl ExtractStrategy for DensityExtractor {
    fn select_content(&self, html: &str) -> Option<String> {
        let cleaned = strip_chrome(html);
        let doc = Html::parse_document(&cleaned);

        let candidate_sel =
            Selector::parse(r#"main, article, [role="main"], section, div, body"#).ok()?;
        let link_sel = Selector::parse("a").ok()?;

        let mut best: Option<(f32, String)> = None;
        for el in doc.select(&candidate_sel) {
            let text_chars = visible_text_len(&el);
            if text_chars == 0 {
                continue;
            }

            let link_chars: usize = el.select(&link_sel).map(|a| visible_text_len(&a)).sum();
            let link_density = (link_chars as f32 / text_chars as f32).min(1.0);
            // Square the penalty so link farms lose decisively to prose.
            let mut score = text_chars as f32 * (1.0 - link_density) * (1.0 - link_density);

            // Semantic content containers beat anonymous blocks of the
            // same density.
            if matches!(el.value().name(), "main" | "article") {
                score *= 1.5;
            }

            if best.as_ref().map(|(s, _)| score > *s).unwrap_or(true) {
                best = Some((score, el.inner_html()));
            }
        }

        best.map(|(_, html)| html)
    }
}

/// Extracts readable page content as Markdown, rejecting pages whose
/// content falls below the configured character threshold.
pub struct ContentExtractor {
    strategy: Box<dyn ExtractStrategy>,
    char_threshold: usize,
}

impl ContentExtractor {
    pub fn new(config: &ExtractConfig) -> Self {
        Self::with_strategy(Box::new(DensityExtractor), config)
    }

    pub fn with_strategy(strategy: Box<dyn ExtractStrategy>, config: &ExtractConfig) -> Self {
        Self {
            strategy,
            char_threshold: config.char_threshold,
        }
    }

    /// Extract the main content of `html` as Markdown.
    ///
    /// Fails with [`Error::ExtractionFailed`] when the result is shorter
    /// than the char threshold; an empty record is never produced.
    pub fn extract(&self, url: &str, html: &str) -> Result<String> {
        let content_html = self.strategy.select_content(html).unwrap_or_default();
        let markdown = if content_html.is_empty() {
            String::new()
        } else {
            to_markdown(&content_html)?
        };

        let chars = markdown.chars().count();
        if chars < self.char_threshold {
            return Err(Error::ExtractionFailed {
                url: url.to_string(),
                chars,
                threshold: self.char_threshold,
            });
        }
        Ok(markdown)
    }
}

/// Remove navigation/chrome elements before candidate scoring.
fn strip_chrome(html: &str) -> String {
    let Ok(chrome_sel) = Selector::parse("nav, header, footer, aside, script, style, noscript")
    else {
        return html.to_string();
    };
    let doc = Html::parse_document(html);

    let mut result = html.to_string();
    for el in doc.select(&chrome_sel) {
        let outer = el.html();
        result = result.replace(&outer, "");
    }
    result
}

/// Visible character count of an element's text, whitespace collapsed.
fn visible_text_len(el: &ElementRef) -> usize {
    el.text()
        .flat_map(|t| t.split_whitespace())
        .map(|w| w.chars().count() + 1)
        .sum::<usize>()
        .saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor(threshold: usize) -> ContentExtractor {
        ContentExtractor::new(&ExtractConfig {
            char_threshold: threshold,
        })
    }

    const PAGE: &str = r#"
        <html><head><title>Manual</title></head>
        <body>
            <nav><a href="/">Home</a><a href="/docs">Docs</a><a href="/blog">Blog</a></nav>
            <article>
                <h1>Charging</h1>
                <p>Connect the charge cable to the charge port and wait for the
                indicator light to turn green. Charging speed depends on the
                connected equipment and the current state of the battery.</p>
            </article>
            <footer>Copyright 2024. All rights reserved.</footer>
        </body></html>
    "#;

    #[test]
    fn test_extracts_article_and_drops_chrome() {
        let md = extractor(50).extract("https://example.com/charging", PAGE).unwrap();
        assert!(md.contains("# Charging"));
        assert!(md.contains("charge cable"));
        assert!(!md.contains("Blog"));
        assert!(!md.contains("Copyright"));
    }

    #[test]
    fn test_threshold_gates_thin_pages() {
        let thin = "<html><body><article><p>Too short.</p></article></body></html>";
        let err = extractor(200).extract("https://example.com/thin", thin).unwrap_err();
        match err {
            Error::ExtractionFailed { url, chars, threshold } => {
                assert_eq!(url, "https://example.com/thin");
                assert!(chars < 200);
                assert_eq!(threshold, 200);
            }
            other => panic!("expected ExtractionFailed, got {other}"),
        }
    }

    #[test]
    fn test_empty_page_never_yields_empty_record() {
        let err = extractor(1).extract("https://example.com/empty", "<html></html>");
        assert!(err.is_err());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let a = extractor(50).extract("https://example.com/p", PAGE).unwrap();
        let b = extractor(50).extract("https://example.com/p", PAGE).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_link_density_prefers_prose_over_link_farms() {
        let html = r#"
            <html><body>
                <div id="toc">
                    <a href="/1">First chapter</a> <a href="/2">Second chapter</a>
                    <a href="/3">Third chapter</a> <a href="/4">Fourth chapter</a>
                </div>
                <div id="content">
                    <p>Actual prose describing the system in enough detail to
                    matter for retrieval, with no links at all inside it.</p>
                </div>
            </body></html>
        "#;
        let block = DensityExtractor.select_content(html).unwrap();
        assert!(block.contains("Actual prose"));
    }
}
