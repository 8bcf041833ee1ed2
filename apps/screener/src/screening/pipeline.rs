//! Screening pipeline — one candidate evaluation from job text to a stored decision.
//!
//! Flow: validate inputs → build job index → retrieve context for the resume →
//!       skills coverage → assemble prompt → decision engine → append to result store.
//!
//! Both the HTTP handlers and the `evaluate` subcommand go through `evaluate_candidate`.

use std::sync::Arc;

use tracing::{error, info};

use crate::config::Config;
use crate::errors::AppError;
use crate::llm_client::{Embedder, Generator};
use crate::models::candidate::{CandidateRecord, RecordId};
use crate::models::decision::DecisionRecord;
use crate::models::job::JobDescription;
use crate::screening::assembler::PromptAssembler;
use crate::screening::engine::{schema_hint, DecisionEngine};
use crate::screening::index::{EmbeddingIndex, DEFAULT_CHUNK_CHARS};
use crate::screening::rules::{skill_coverage, EvaluationRules};
use crate::screening::store::ResultStore;

/// Outcome of a stored evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub record_id: RecordId,
    pub decision: DecisionRecord,
}

pub struct ScreeningPipeline {
    embedder: Arc<dyn Embedder>,
    engine: DecisionEngine,
    store: Arc<dyn ResultStore>,
    top_k: usize,
    max_chunk_chars: usize,
}

impl ScreeningPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        store: Arc<dyn ResultStore>,
        rules: EvaluationRules,
        config: &Config,
    ) -> Self {
        Self {
            embedder,
            engine: DecisionEngine::new(generator, rules, config.schema_retries),
            store,
            top_k: config.retrieval_top_k,
            max_chunk_chars: DEFAULT_CHUNK_CHARS,
        }
    }

    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Evaluates one resume against `job` and appends the result.
    ///
    /// Empty job or resume text fails with `InvalidInput` before any backend call.
    /// If the store rejects the row, the returned `Persistence` error carries the
    /// decision that was computed.
    pub async fn evaluate_candidate(
        &self,
        job: &JobDescription,
        resume_text: &str,
        candidate_name: &str,
        candidate_email: &str,
        resume_identifier: &str,
    ) -> Result<Evaluation, AppError> {
        if job.is_blank() {
            return Err(AppError::InvalidInput(
                "job description text cannot be empty".to_string(),
            ));
        }
        if resume_text.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "resume text cannot be empty".to_string(),
            ));
        }

        info!("Evaluating {candidate_email} for '{}'", job.title);

        let job_text = job.to_document_text();
        let index = EmbeddingIndex::build(&job_text, self.embedder.as_ref(), self.max_chunk_chars)
            .await?;
        let context = index
            .query(resume_text, self.embedder.as_ref(), self.top_k)
            .await?;
        info!(
            "Retrieved {} of {} job chunk(s) as context",
            context.chunks.len(),
            index.len()
        );

        let skills = skill_coverage(&job.skills, resume_text);
        info!(
            "Skills coverage: {}/{} ({:.0}%)",
            skills.matched.len(),
            job.skills.len(),
            skills.ratio * 100.0
        );

        let prompt =
            PromptAssembler::build(&context, resume_text, self.engine.rules(), &schema_hint())?;
        let decision = self.engine.evaluate(&prompt, &skills).await?;

        let candidate = CandidateRecord {
            name: candidate_name.to_string(),
            email: candidate_email.to_string(),
            resume_path: resume_identifier.to_string(),
            decision,
        };

        match self.store.save(&candidate).await {
            Ok(record_id) => {
                info!(
                    "Stored result {record_id}: {} ({})",
                    candidate.decision.decision, candidate.decision.compatibility_score
                );
                Ok(Evaluation {
                    record_id,
                    decision: candidate.decision,
                })
            }
            Err(e) => {
                error!(
                    "Decision for {candidate_email} was not stored: {} ({}) {}",
                    candidate.decision.decision,
                    candidate.decision.compatibility_score,
                    candidate.decision.justification
                );
                Err(e.with_unsaved(&candidate.decision))
            }
        }
    }
}
