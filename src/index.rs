//! Passage embedding and in-memory vector retrieval
//!
//! The [`Embedder`] trait abstracts the external embedding service; the
//! [`VectorIndex`] owns the embedded corpus for one answering session and
//! ranks passages by cosine similarity. No persistence across runs.

use crate::chunk::Passage;
use crate::config::OpenAiConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Trait for embedding providers
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Fixed dimension of the produced vectors
    fn dimension(&self) -> usize;
}

/// Embedding client for OpenAI-compatible `/embeddings` endpoints
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimension: usize,
}

impl OpenAiEmbedder {
    /// Build the client. Fails fast when the API key is absent.
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let api_key = config.api_key()?;
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|e| Error::Embedding(format!("invalid API key: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.embedding_model.clone(),
            dimension: config.dimension,
        })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: &texts,
        };
        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Error::Embedding(format!(
                "embedding endpoint returned {status}: {body}"
            )));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("failed to parse embedding response: {e}")))?;
        parsed.data.sort_by_key(|d| d.index);

        if parsed.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }
        for d in &parsed.data {
            if d.embedding.len() != self.dimension {
                return Err(Error::Embedding(format!(
                    "dimension mismatch for model '{}': expected {}, got {}",
                    self.model,
                    self.dimension,
                    d.embedding.len()
                )));
            }
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// One embedded passage. Immutable once stored.
pub struct IndexedPassage {
    pub passage: Passage,
    pub embedding: Vec<f32>,
}

/// A retrieval hit with its similarity score
#[derive(Debug, Clone, Serialize)]
pub struct ScoredPassage {
    pub passage: Passage,
    pub score: f32,
}

/// Outcome of a bulk index build
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BuildReport {
    pub indexed: usize,
    pub skipped: usize,
}

/// In-memory vector index over passages, cosine-ranked.
pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    entries: Vec<IndexedPassage>,
}

impl VectorIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embed and store a single passage.
    pub async fn add(&mut self, passage: Passage) -> Result<()> {
        let mut vectors = self.embedder.embed(vec![passage.text.clone()]).await?;
        let embedding = vectors
            .pop()
            .ok_or_else(|| Error::Embedding("embedding service returned no vector".to_string()))?;
        self.entries.push(IndexedPassage { passage, embedding });
        Ok(())
    }

    /// Bulk-build the index, used once per crawl.
    ///
    /// Passages are embedded in batches with at most `concurrency` requests
    /// in flight. A failing batch is skipped and counted, not fatal; the
    /// build only fails when every passage failed. Insertion order follows
    /// the input order regardless of request completion order.
    pub async fn build(
        &mut self,
        passages: Vec<Passage>,
        batch_size: usize,
        concurrency: usize,
        progress: Option<ProgressBar>,
    ) -> Result<BuildReport> {
        let total = passages.len();
        let batches: Vec<Vec<Passage>> = passages
            .chunks(batch_size.max(1))
            .map(|c| c.to_vec())
            .collect();

        let embedder = Arc::clone(&self.embedder);
        // `buffered` caps in-flight requests and yields results in input
        // order, which keeps the index insertion-ordered.
        let results: Vec<(Vec<Passage>, Result<Vec<Vec<f32>>>)> =
            stream::iter(batches.into_iter().map(|batch| {
                let embedder = Arc::clone(&embedder);
                let progress = progress.clone();
                async move {
                    let texts: Vec<String> = batch.iter().map(|p| p.text.clone()).collect();
                    let result = embedder.embed(texts).await;
                    if let Some(pb) = &progress {
                        pb.inc(batch.len() as u64);
                    }
                    (batch, result)
                }
            }))
            .buffered(concurrency.max(1))
            .collect()
            .await;

        let mut report = BuildReport::default();
        for (batch, result) in results {
            match result {
                Ok(vectors) if vectors.len() == batch.len() => {
                    for (passage, embedding) in batch.into_iter().zip(vectors) {
                        self.entries.push(IndexedPassage { passage, embedding });
                        report.indexed += 1;
                    }
                }
                Ok(vectors) => {
                    warn!(
                        "Skipping batch: got {} vectors for {} passages",
                        vectors.len(),
                        batch.len()
                    );
                    report.skipped += batch.len();
                }
                Err(e) => {
                    warn!("Skipping batch of {} passages: {}", batch.len(), e);
                    report.skipped += batch.len();
                }
            }
        }

        if report.indexed == 0 && total > 0 {
            return Err(Error::Embedding(format!(
                "all {total} passages failed to embed"
            )));
        }

        debug!(
            "Index built: {} passages indexed, {} skipped",
            report.indexed, report.skipped
        );
        Ok(report)
    }

    /// Return up to `k` passages closest to `text`, by decreasing cosine
    /// similarity. Ties keep insertion order.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredPassage>> {
        let mut vectors = self.embedder.embed(vec![text.to_string()]).await?;
        let query = vectors
            .pop()
            .ok_or_else(|| Error::Embedding("embedding service returned no vector".to_string()))?;

        let mut scored: Vec<ScoredPassage> = self
            .entries
            .iter()
            .map(|entry| ScoredPassage {
                passage: entry.passage.clone(),
                score: cosine_similarity(&query, &entry.embedding),
            })
            .collect();
        // Stable sort: equal scores stay in insertion order.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }
}

/// Cosine similarity; zero vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Wraps the index with a fixed `k` and drops scores.
pub struct Retriever {
    index: VectorIndex,
    k: usize,
}

impl Retriever {
    pub fn new(index: VectorIndex, k: usize) -> Self {
        Self { index, k }
    }

    pub async fn retrieve(&self, question: &str) -> Result<Vec<Passage>> {
        Ok(self
            .index
            .query(question, self.k)
            .await?
            .into_iter()
            .map(|s| s.passage)
            .collect())
    }
}
