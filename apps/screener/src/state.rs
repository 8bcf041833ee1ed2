use std::sync::Arc;

use crate::config::Config;
use crate::models::job::JobDescription;
use crate::screening::pipeline::ScreeningPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ScreeningPipeline>,
    /// The posting every upload is screened against. Loaded once at startup.
    pub job: Arc<JobDescription>,
    pub config: Config,
}
