use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::decision::DecisionRecord;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed HTTP request (missing multipart field, unreadable upload).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request body over the configured upload limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Empty job text, empty resume text or an unusable resume file. Caller's fault.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Generation backend error: {0}")]
    Generation(String),

    #[error("Generation timed out: {0}")]
    GenerationTimeout(String),

    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    /// The store could not append the row. `unsaved` carries the decision that was
    /// computed but not recorded, when there was one.
    #[error("Persistence error: {message}")]
    Persistence {
        message: String,
        unsaved: Option<Box<DecisionRecord>>,
    },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Persistence {
            message: e.to_string(),
            unsaved: None,
        }
    }
}

impl AppError {
    /// Attaches a computed-but-unsaved decision to a persistence failure.
    pub fn with_unsaved(self, record: &DecisionRecord) -> Self {
        match self {
            AppError::Persistence { message, .. } => AppError::Persistence {
                message,
                unsaved: Some(Box::new(record.clone())),
            },
            other => other,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                msg.clone(),
            ),
            AppError::InvalidInput(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_INPUT",
                msg.clone(),
            ),
            AppError::EmbeddingService(msg) => {
                tracing::error!("Embedding service error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EMBEDDING_SERVICE_ERROR",
                    "The embedding service is unavailable".to_string(),
                )
            }
            AppError::Generation(msg) => {
                tracing::error!("Generation backend error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GENERATION_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::GenerationTimeout(msg) => {
                tracing::error!("Generation timed out: {msg}");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "GENERATION_TIMEOUT",
                    "The AI backend did not respond in time".to_string(),
                )
            }
            AppError::SchemaValidation(msg) => {
                tracing::error!("Schema validation failed: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SCHEMA_VALIDATION_ERROR",
                    "The AI backend returned an invalid decision".to_string(),
                )
            }
            AppError::Persistence { message, unsaved } => {
                match unsaved {
                    Some(record) => tracing::error!(
                        decision = %record.decision,
                        score = record.compatibility_score,
                        "Persistence error, decision not recorded: {message}"
                    ),
                    None => tracing::error!("Persistence error: {message}"),
                }
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_ERROR",
                    "The result could not be saved".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
