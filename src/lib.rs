//! docqa - question answering over crawled documentation sites
//!
//! The pipeline has two phases. The crawl phase walks a documentation site
//! within a URL scope, extracts the readable content of each page as
//! Markdown, and accumulates `{url, content}` records in a corpus that can
//! be exported as CSV. The answer phase splits the corpus into overlapping
//! passages, embeds them into an in-memory vector index, retrieves the
//! passages closest to a question, and asks a chat model to answer from
//! that context alone.

pub mod answer;
pub mod chunk;
pub mod commands;
pub mod config;
pub mod corpus;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod index;
