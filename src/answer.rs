//! Grounded answer composition
//!
//! Builds a deterministic prompt from the retrieved passages and delegates
//! generation to an external chat model. Faithfulness to the context is the
//! model's job; composition only guarantees the passages appear verbatim,
//! in retrieval order.

use crate::chunk::Passage;
use crate::config::OpenAiConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SYSTEM_PROMPT: &str = "Answer the user's question using only the provided context. \
If the context does not contain the answer, say that you don't know.";

/// Trait for chat completion providers
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

/// Chat client for OpenAI-compatible `/chat/completions` endpoints
pub struct OpenAiChat {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let api_key = config.api_key()?;
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|e| Error::Model(format!("invalid API key: {e}")))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.chat_model.clone(),
            temperature: config.temperature,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Error::Model(format!(
                "chat endpoint returned {status}: {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Model(format!("failed to parse chat response: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::Model("chat response contained no choices".to_string()))
    }
}

/// Build the grounded prompt: context passages in retrieval order, then the
/// question. Deterministic for identical inputs.
pub fn build_prompt(question: &str, passages: &[Passage]) -> (String, String) {
    let mut context = String::new();
    for passage in passages {
        context.push_str("[source: ");
        context.push_str(&passage.source_url);
        context.push_str("]\n");
        context.push_str(&passage.text);
        context.push_str("\n\n---\n\n");
    }

    let user = format!("Context:\n\n{context}Question: {question}");
    (SYSTEM_PROMPT.to_string(), user)
}

/// Combines retrieved passages with the question into a grounded request.
pub struct AnswerComposer {
    model: Box<dyn ChatModel>,
}

impl AnswerComposer {
    pub fn new(model: Box<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Compose the prompt and ask the model. Model errors propagate
    /// unmodified; there is no retry.
    pub async fn answer(&self, question: &str, passages: &[Passage]) -> Result<String> {
        let (system, user) = build_prompt(question, passages);
        self.model.complete(&system, &user).await
    }
}
