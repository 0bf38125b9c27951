//! Default values for configuration

/// Default maximum pages fetched per crawl
pub fn default_crawl_max_pages() -> u32 {
    100
}

/// Default number of concurrent crawl workers
pub fn default_crawl_concurrency() -> usize {
    4
}

/// Default request timeout in seconds
pub fn default_crawl_timeout() -> u64 {
    30
}

/// Default user agent
pub fn default_crawl_user_agent() -> String {
    format!("docqa/{} (Documentation QA)", env!("CARGO_PKG_VERSION"))
}

/// Default minimum extracted characters for a page to count as content
pub fn default_extract_char_threshold() -> usize {
    200
}

/// Default maximum characters per passage
pub fn default_chunk_size() -> usize {
    500
}

/// Default overlap characters between adjacent passages
pub fn default_chunk_overlap() -> usize {
    50
}

/// Default number of passages retrieved per question
pub fn default_query_top_k() -> usize {
    4
}

/// Default chat model
pub fn default_chat_model() -> String {
    "gpt-4o".to_string()
}

/// Default sampling temperature for answers
pub fn default_chat_temperature() -> f32 {
    0.0
}

/// Default embedding model
pub fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

/// Default embedding dimension (must match model)
pub fn default_embedding_dimension() -> usize {
    1536
}

/// Default batch size for embedding requests
pub fn default_embedding_batch_size() -> usize {
    32
}

/// Default cap on in-flight embedding requests
pub fn default_embed_concurrency() -> usize {
    4
}

/// Default environment variable holding the API key
pub fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

/// Default OpenAI-compatible API base URL
pub fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
