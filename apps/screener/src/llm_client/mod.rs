/// LLM Client — the single point of entry for all Ollama calls in the screener.
///
/// ARCHITECTURAL RULE: No other module may call the backend directly.
/// Embedding and generation both go through this module, behind the `Embedder`
/// and `Generator` traits so the pipeline can be exercised without a live backend.
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

pub mod prompts;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Turns texts into vectors. One vector per input, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError>;
}

/// Produces raw model text for a prompt, constrained to the given JSON schema.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, system: &str, schema: &Value)
        -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    format: &'a Value,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub message: ChatResponseMessage,
    #[serde(default)]
    pub prompt_eval_count: Option<u32>,
    #[serde(default)]
    pub eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

/// Client for an Ollama-compatible server. One model embeds, another generates.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    embedding_model: String,
    generation_model: String,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(
        base_url: &str,
        embedding_model: &str,
        generation_model: &str,
        timeout_secs: u64,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            embedding_model: embedding_model.to_string(),
            generation_model: generation_model.to_string(),
            timeout_secs,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(
            &config.ollama_base_url,
            &config.embedding_model,
            &config.generation_model,
            config.request_timeout_secs,
        )
    }

    pub fn generation_model(&self) -> &str {
        &self.generation_model
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// POSTs a JSON body and decodes a JSON response. Fails fast: no retries here.
    async fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, LlmError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OllamaError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await.map_err(|e| self.classify(e))?;
        Ok(serde_json::from_str(&text)?)
    }

    fn classify(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.timeout_secs)
        } else {
            LlmError::Http(e)
        }
    }
}

#[async_trait]
impl Embedder for OllamaClient {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let request = EmbedRequest {
            model: &self.embedding_model,
            input: inputs,
        };
        let response: EmbedResponse = self.post_json("/api/embed", &request).await?;
        debug!(
            "Embedded {} input(s) with {}",
            inputs.len(),
            self.embedding_model
        );
        Ok(response.embeddings)
    }
}

#[async_trait]
impl Generator for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        system: &str,
        schema: &Value,
    ) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.generation_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            stream: false,
            format: schema,
            options: ChatOptions { temperature: 0.0 },
        };

        let response: ChatResponse = self.post_json("/api/chat", &request).await?;

        debug!(
            "LLM call succeeded: prompt_tokens={:?}, output_tokens={:?}",
            response.prompt_eval_count, response.eval_count
        );

        if response.message.content.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(response.message.content)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
