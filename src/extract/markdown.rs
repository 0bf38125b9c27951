//! HTML-to-Markdown normalization
//!
//! Converts an extracted content block to Markdown via `htmd`, then applies
//! cleanup passes. The output is deterministic for identical input.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

static EXCESS_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("static regex"));

static TRAILING_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").expect("static regex"));

/// Convert a content HTML fragment to cleaned Markdown.
///
/// Headings, lists, emphasis, links, and code blocks are preserved;
/// scripts, styles, and attributes are stripped.
pub fn to_markdown(content_html: &str) -> Result<String> {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "nav", "iframe", "noscript", "svg"])
        .build();

    let raw = converter
        .convert(content_html)
        .map_err(|e| Error::Parse(format!("htmd conversion failed: {e}")))?;

    Ok(cleanup(&raw))
}

/// Normalize whitespace: no trailing spaces, at most one blank line in a
/// row, trimmed document edges.
fn cleanup(markdown: &str) -> String {
    let no_trailing = TRAILING_SPACES.replace_all(markdown, "");
    let collapsed = EXCESS_BLANK_LINES.replace_all(&no_trailing, "\n\n");
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_structure() {
        let html = r#"
            <h1>Autopilot</h1>
            <p>Use <em>caution</em> when <strong>enabling</strong> it.</p>
            <ul><li>Step one</li><li>Step two</li></ul>
        "#;
        let md = to_markdown(html).unwrap();
        assert!(md.contains("# Autopilot"));
        assert!(md.contains("*caution*"));
        assert!(md.contains("**enabling**"));
        assert!(md.contains("Step one"));
    }

    #[test]
    fn test_strips_scripts_and_styles() {
        let html = r#"<p>Visible</p><script>alert(1)</script><style>p{color:red}</style>"#;
        let md = to_markdown(html).unwrap();
        assert!(md.contains("Visible"));
        assert!(!md.contains("alert"));
        assert!(!md.contains("color:red"));
    }

    #[test]
    fn test_deterministic() {
        let html = "<h2>Title</h2>\n<p>Body text with a <a href=\"/x\">link</a>.</p>";
        let first = to_markdown(html).unwrap();
        let second = to_markdown(html).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cleanup_collapses_blank_lines() {
        assert_eq!(cleanup("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(cleanup("a   \nb\n"), "a\nb");
    }
}
