use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Every value has a default; malformed numbers fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub ollama_base_url: String,
    pub embedding_model: String,
    pub generation_model: String,
    pub request_timeout_secs: u64,
    /// Schema re-prompts after an invalid model response. Clamped to 0..=1.
    pub schema_retries: u8,
    pub retrieval_top_k: usize,
    pub job_description_path: Option<PathBuf>,
    pub upload_dir: PathBuf,
    /// Request body cap for resume uploads.
    pub max_upload_bytes: usize,
    pub cors_allowed_origin: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: env_or("DATABASE_URL", "sqlite://recruitment_results.db"),
            ollama_base_url: env_or("OLLAMA_BASE_URL", "http://localhost:11434"),
            embedding_model: env_or("EMBEDDING_MODEL", "nomic-embed-text:latest"),
            generation_model: env_or("GENERATION_MODEL", "gemma3:4b"),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 120)?,
            schema_retries: parse_env::<u8>("SCHEMA_RETRIES", 1)?.min(1),
            retrieval_top_k: parse_env::<usize>("RETRIEVAL_TOP_K", 1)?.max(1),
            job_description_path: std::env::var("JOB_DESCRIPTION_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            cors_allowed_origin: env_or("CORS_ALLOWED_ORIGIN", "http://localhost:5173"),
            port: parse_env("PORT", 8000)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
