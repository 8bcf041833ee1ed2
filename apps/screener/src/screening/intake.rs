//! Resume intake — keeps uploaded resume files and extracts their plain text.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::errors::AppError;

/// Writes an uploaded resume to a kept `resume-*.pdf` file under `dir` and returns its path.
/// The path is the resume identifier stored with the result. Runs on the blocking pool.
pub async fn store_upload(dir: PathBuf, bytes: Vec<u8>) -> Result<PathBuf, AppError> {
    tokio::task::spawn_blocking(move || write_upload(&dir, &bytes))
        .await
        .context("Resume upload task panicked")?
}

fn write_upload(dir: &Path, bytes: &[u8]) -> Result<PathBuf, AppError> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create upload directory {}", dir.display()))?;

    let mut file = tempfile::Builder::new()
        .prefix("resume-")
        .suffix(".pdf")
        .tempfile_in(dir)
        .context("Failed to create resume file")?;
    file.write_all(bytes).context("Failed to write resume file")?;

    let (_, path) = file.keep().context("Failed to keep resume file")?;
    info!("Stored resume upload at {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

/// Extracts plain text from a PDF. Runs on the blocking pool.
pub async fn extract_resume_text(path: PathBuf) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
        .await
        .context("PDF extraction task panicked")?
        .map_err(|e| AppError::InvalidInput(format!("resume could not be parsed: {e}")))?;

    if text.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "resume contains no extractable text".to_string(),
        ));
    }
    Ok(text)
}
