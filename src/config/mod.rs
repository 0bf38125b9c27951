//! Configuration management for docqa
//!
//! Handles loading and validating configuration from TOML files. Every
//! setting has a sensible default so running without a config file works.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Web crawling configuration
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// Content extraction configuration
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub query: QueryConfig,

    /// OpenAI-compatible model configuration
    #[serde(default)]
    pub openai: OpenAiConfig,
}

/// Web crawling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// URL prefix restricting which discovered links are followed.
    /// Defaults to the crawl root itself.
    #[serde(default)]
    pub scope: Option<String>,

    /// Maximum fetch attempts per crawl
    #[serde(default = "default_crawl_max_pages")]
    pub max_pages: u32,

    /// Wall-clock budget for the crawl phase in seconds (no limit if unset)
    #[serde(default)]
    pub max_seconds: Option<u64>,

    /// Number of concurrent fetch workers
    #[serde(default = "default_crawl_concurrency")]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_crawl_timeout")]
    pub timeout_secs: u64,

    /// User agent string sent with every request
    #[serde(default = "default_crawl_user_agent")]
    pub user_agent: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            scope: None,
            max_pages: default_crawl_max_pages(),
            max_seconds: None,
            concurrency: default_crawl_concurrency(),
            timeout_secs: default_crawl_timeout(),
            user_agent: default_crawl_user_agent(),
        }
    }
}

/// Content extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Minimum extracted characters below which a page is dropped
    #[serde(default = "default_extract_char_threshold")]
    pub char_threshold: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            char_threshold: default_extract_char_threshold(),
        }
    }
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum characters per passage
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared between adjacent passages
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
}

impl ChunkConfig {
    /// Fail fast on an overlap that can never make progress.
    /// Called before any crawl work is started.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.overlap >= self.chunk_size {
            return Err(Error::ChunkConfig {
                chunk_size: self.chunk_size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Number of passages retrieved per question
    #[serde(default = "default_query_top_k")]
    pub top_k: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: default_query_top_k(),
        }
    }
}

/// Settings for the OpenAI-compatible chat and embedding endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Chat model used to compose answers
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Sampling temperature for answers
    #[serde(default = "default_chat_temperature")]
    pub temperature: f32,

    /// Embedding model
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimension (must match the model)
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Passages per embedding request
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,

    /// Cap on concurrent in-flight embedding requests
    #[serde(default = "default_embed_concurrency")]
    pub embed_concurrency: usize,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// API base URL (override for tests and proxies)
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

impl OpenAiConfig {
    /// Resolve the API key from the environment.
    /// Absence is a fatal startup error for any embedding/answering phase.
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .map_err(|_| Error::MissingApiKey(self.api_key_env.clone()))
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            chat_model: default_chat_model(),
            temperature: default_chat_temperature(),
            embedding_model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            batch_size: default_embedding_batch_size(),
            embed_concurrency: default_embed_concurrency(),
            api_key_env: default_api_key_env(),
            base_url: default_openai_base_url(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_values() {
        let config = Config::default();
        assert_eq!(config.extract.char_threshold, 200);
        assert_eq!(config.chunk.chunk_size, 500);
        assert_eq!(config.chunk.overlap, 50);
        assert_eq!(config.query.top_k, 4);
        assert_eq!(config.openai.chat_model, "gpt-4o");
        assert_eq!(config.openai.temperature, 0.0);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [chunk]
            chunk_size = 800

            [crawl]
            max_pages = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.chunk.chunk_size, 800);
        assert_eq!(config.chunk.overlap, 50);
        assert_eq!(config.crawl.max_pages, 10);
        assert_eq!(config.crawl.concurrency, 4);
    }

    #[test]
    fn test_chunk_validate_rejects_bad_overlap() {
        let bad = ChunkConfig {
            chunk_size: 100,
            overlap: 100,
        };
        assert!(matches!(
            bad.validate(),
            Err(crate::error::Error::ChunkConfig { .. })
        ));

        let zero = ChunkConfig {
            chunk_size: 0,
            overlap: 0,
        };
        assert!(zero.validate().is_err());

        let good = ChunkConfig {
            chunk_size: 500,
            overlap: 50,
        };
        assert!(good.validate().is_ok());
    }
}
