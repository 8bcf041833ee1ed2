pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/job-details", get(handlers::handle_job_details))
        .route(
            "/api/v1/analyze-resume",
            post(handlers::handle_analyze_resume),
        )
        .route("/api/v1/results/:id", get(handlers::handle_get_result))
        // Paths used by the existing web frontend
        .route("/get-job-details", get(handlers::handle_job_details))
        .route("/analyze-resume/", post(handlers::handle_analyze_resume))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
