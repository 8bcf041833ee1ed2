//! Axum route handlers for the Screening API.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::candidate::{RecordId, ResultRow};
use crate::models::decision::Decision;
use crate::models::job::JobDetailsView;
use crate::screening::intake::{extract_resume_text, store_upload};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub record_id: RecordId,
    pub decision: Decision,
    pub compatibility_score: u8,
    pub justification: String,
}

/// Fields collected from the analyze-resume multipart form.
#[derive(Debug, Default)]
struct AnalyzeForm {
    candidate_name: Option<String>,
    candidate_email: Option<String>,
    resume: Option<Vec<u8>>,
}

impl AnalyzeForm {
    async fn read(mut multipart: Multipart, limit: usize) -> Result<Self, AppError> {
        let mut form = AnalyzeForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, limit, "Malformed multipart body"))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "candidate_name" | "candidate_email" => {
                    let value = field.text().await.map_err(|e| {
                        multipart_error(e, limit, &format!("Unreadable field {name}"))
                    })?;
                    if name == "candidate_name" {
                        form.candidate_name = Some(value);
                    } else {
                        form.candidate_email = Some(value);
                    }
                }
                "resume" => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| multipart_error(e, limit, "Unreadable resume upload"))?;
                    form.resume = Some(bytes.to_vec());
                }
                _ => {}
            }
        }
        Ok(form)
    }
}

/// A body cut off by the upload limit is reported as such, not as a malformed form.
fn multipart_error(e: MultipartError, limit: usize, context: &str) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("upload exceeds the {limit} byte limit"))
    } else {
        AppError::Validation(format!("{context}: {e}"))
    }
}

fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/job-details (also GET /get-job-details)
pub async fn handle_job_details(State(state): State<AppState>) -> Json<JobDetailsView> {
    Json(state.job.details_view())
}

/// POST /api/v1/analyze-resume (also POST /analyze-resume/)
///
/// Multipart form: `candidate_name`, `candidate_email`, `resume` (PDF).
/// Stores the upload, extracts its text and runs the screening pipeline.
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let form = AnalyzeForm::read(multipart, state.config.max_upload_bytes).await?;
    let candidate_name = required_text(form.candidate_name, "candidate_name")?;
    let candidate_email = required_text(form.candidate_email, "candidate_email")?;
    let resume = form
        .resume
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| AppError::Validation("resume file is required".to_string()))?;

    info!(
        "Received resume from {candidate_email} ({} bytes)",
        resume.len()
    );

    let path = store_upload(state.config.upload_dir.clone(), resume).await?;
    let resume_text = extract_resume_text(path.clone()).await?;

    let evaluation = state
        .pipeline
        .evaluate_candidate(
            &state.job,
            &resume_text,
            &candidate_name,
            &candidate_email,
            &path.to_string_lossy(),
        )
        .await?;

    Ok(Json(AnalyzeResponse {
        record_id: evaluation.record_id,
        decision: evaluation.decision.decision,
        compatibility_score: evaluation.decision.compatibility_score,
        justification: evaluation.decision.justification,
    }))
}

/// GET /api/v1/results/:id
pub async fn handle_get_result(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<ResultRow>, AppError> {
    state
        .pipeline
        .store()
        .find(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Result {id} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text_trims_and_rejects_blank() {
        assert_eq!(
            required_text(Some("  Jane ".to_string()), "candidate_name").unwrap(),
            "Jane"
        );
        assert!(matches!(
            required_text(Some("   ".to_string()), "candidate_name"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            required_text(None, "candidate_email"),
            Err(AppError::Validation(_))
        ));
    }
}
