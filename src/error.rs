//! Custom error types for docqa

use thiserror::Error;

/// Main error type for docqa operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Extraction below threshold for {url}: {chars} chars < {threshold}")]
    ExtractionFailed {
        url: String,
        chars: usize,
        threshold: usize,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Corpus write error: {0}")]
    SinkWrite(String),

    #[error("Invalid chunk configuration: overlap ({overlap}) must be smaller than chunk size ({chunk_size})")]
    ChunkConfig { chunk_size: usize, overlap: usize },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Missing credential: environment variable {0} is not set")]
    MissingApiKey(String),

    #[error("Empty corpus: no pages were collected from {0}")]
    EmptyCorpus(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias for docqa
pub type Result<T> = std::result::Result<T, Error>;
