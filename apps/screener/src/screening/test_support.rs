//! Deterministic stand-ins for the Ollama backend, shared by the screening tests.

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::Config;
use crate::llm_client::{Embedder, Generator, LlmError};

const HASH_DIMENSION: usize = 256;

/// Defaults from `Config::from_env` with an in-memory database and a short timeout.
pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        ollama_base_url: "http://localhost:11434".to_string(),
        embedding_model: "nomic-embed-text:latest".to_string(),
        generation_model: "gemma3:4b".to_string(),
        request_timeout_secs: 5,
        schema_retries: 1,
        retrieval_top_k: 1,
        job_description_path: None,
        upload_dir: std::env::temp_dir(),
        max_upload_bytes: crate::config::DEFAULT_MAX_UPLOAD_BYTES,
        cors_allowed_origin: "http://localhost:5173".to_string(),
        port: 8000,
        rust_log: "info".to_string(),
    }
}

/// Bag-of-words hashing embedder. Same text, same vector.
#[derive(Default)]
pub struct HashEmbedder {
    calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(inputs.iter().map(|text| hash_vector(text)).collect())
    }
}

fn hash_vector(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0_f32; HASH_DIMENSION];
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let mut hasher = DefaultHasher::new();
        token.to_lowercase().hash(&mut hasher);
        vector[(hasher.finish() as usize) % HASH_DIMENSION] += 1.0;
    }
    // Keeps whitespace-only input from producing a zero vector.
    vector[0] += 0.01;
    vector
}

/// Returns the same vectors for every call.
pub struct FixedEmbedder {
    vectors: Vec<Vec<f32>>,
}

impl FixedEmbedder {
    pub fn new(vectors: Vec<Vec<f32>>) -> Self {
        Self { vectors }
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        Ok(self.vectors.clone())
    }
}

/// Always fails as an unreachable backend would.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        Err(LlmError::Api {
            status: 503,
            message: "connection refused".to_string(),
        })
    }
}

/// One scripted backend reply.
pub enum Reply {
    Text(String),
    Timeout,
    Unavailable,
}

/// Replays scripted replies in order and records every prompt it receives.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Reply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Reply::Text(t.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _system: &str,
        _schema: &Value,
    ) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Timeout) => Err(LlmError::Timeout(120)),
            Some(Reply::Unavailable) | None => Err(LlmError::Api {
                status: 503,
                message: "backend unavailable".to_string(),
            }),
        }
    }
}
