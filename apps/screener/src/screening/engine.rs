//! Decision Engine — calls the generative backend, validates its output against a strict
//! schema, and re-derives the final decision from the score and the rule checks.
//!
//! Flow per evaluation:
//!   PENDING → MODEL_CALLED → {PARSED | PARSE_FAILED} → {VALIDATED | RETRY → MODEL_CALLED} → FINAL
//! A second PARSE_FAILED ends in FATAL_ERROR, surfaced as `AppError::SchemaValidation`.
//!
//! The model's own `decision` field is advisory. SELECTED requires the score to clear the
//! threshold AND every check in `EvaluationRules` to pass; anything else is REJECTED.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{strip_json_fences, Generator, LlmError};
use crate::models::decision::{Decision, DecisionRecord};
use crate::screening::assembler::{fill_template, Prompt};
use crate::screening::prompts::{DECISION_SYSTEM, SCHEMA_CORRECTION_TEMPLATE};
use crate::screening::rules::{CheckFailure, EvaluationRules, SkillCoverage};

/// Upper bound on schema re-prompts.
pub const MAX_SCHEMA_RETRIES: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationState {
    Pending,
    ModelCalled,
    Parsed,
    ParseFailed,
    Retry,
    Validated,
    Final,
    FatalError,
}

/// Raw model output. Every field is typed; nothing is read before this parses.
/// `requirements_met` and `matching_projects` are requested but optional.
#[derive(Debug, Clone, Deserialize)]
struct ModelDecision {
    decision: Decision,
    compatibility_score: i64,
    justification: String,
    #[serde(default)]
    requirements_met: Option<bool>,
    #[serde(default)]
    matching_projects: Option<u32>,
}

/// A model response that passed schema validation.
#[derive(Debug, Clone)]
struct ValidatedOutput {
    decision: Decision,
    score: u8,
    justification: String,
    requirements_met: Option<bool>,
    matching_projects: Option<u32>,
}

/// JSON schema sent to the backend as the output format constraint.
pub fn decision_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "decision": {"type": "string", "enum": ["SELECTED", "REJECTED"]},
            "compatibility_score": {"type": "integer", "minimum": 0, "maximum": 100},
            "justification": {"type": "string", "minLength": 1},
            "requirements_met": {"type": "boolean"},
            "matching_projects": {"type": "integer", "minimum": 0}
        },
        "required": [
            "decision",
            "compatibility_score",
            "justification",
            "requirements_met",
            "matching_projects"
        ]
    })
}

/// Pretty-printed `decision_schema()`, embedded in the prompt's formatting instructions.
pub fn schema_hint() -> String {
    format!("{:#}", decision_schema())
}

pub struct DecisionEngine {
    generator: Arc<dyn Generator>,
    rules: EvaluationRules,
    schema_retries: u8,
    schema: Value,
    system: String,
}

impl DecisionEngine {
    /// `schema_retries` above `MAX_SCHEMA_RETRIES` is clamped.
    pub fn new(generator: Arc<dyn Generator>, rules: EvaluationRules, schema_retries: u8) -> Self {
        Self {
            generator,
            rules,
            schema_retries: schema_retries.min(MAX_SCHEMA_RETRIES),
            schema: decision_schema(),
            system: format!("{DECISION_SYSTEM} {JSON_ONLY_SYSTEM}"),
        }
    }

    pub fn rules(&self) -> &EvaluationRules {
        &self.rules
    }

    /// Runs one evaluation. `skills` is the deterministic skills-coverage result for the
    /// same resume; it gates SELECTED alongside the model-reported checks.
    pub async fn evaluate(
        &self,
        prompt: &Prompt,
        skills: &SkillCoverage,
    ) -> Result<DecisionRecord, AppError> {
        let mut state = EvaluationState::Pending;
        let mut prompt_text = prompt.text.clone();

        for attempt in 0..=self.schema_retries {
            transition(&mut state, EvaluationState::ModelCalled);
            let outcome = match self
                .generator
                .generate(&prompt_text, &self.system, &self.schema)
                .await
            {
                Ok(raw) => parse_model_output(&raw),
                // An empty reply carries none of the required fields.
                Err(LlmError::EmptyContent) => Err("the response was empty".to_string()),
                Err(e) => return Err(generation_error(e)),
            };

            match outcome {
                Ok(output) => {
                    transition(&mut state, EvaluationState::Parsed);
                    let record = self.finalize(output, skills);
                    transition(&mut state, EvaluationState::Validated);
                    transition(&mut state, EvaluationState::Final);
                    info!(
                        "Decision {} (score {}) after {} model call(s)",
                        record.decision,
                        record.compatibility_score,
                        attempt + 1
                    );
                    return Ok(record);
                }
                Err(violation) => {
                    transition(&mut state, EvaluationState::ParseFailed);
                    if attempt < self.schema_retries {
                        transition(&mut state, EvaluationState::Retry);
                        warn!(
                            "Model output failed schema validation ({violation}); re-prompting once"
                        );
                        prompt_text = format!(
                            "{}{}",
                            prompt.text,
                            fill_template(SCHEMA_CORRECTION_TEMPLATE, &[("violation", &violation)])
                        );
                        continue;
                    }
                    transition(&mut state, EvaluationState::FatalError);
                    return Err(AppError::SchemaValidation(violation));
                }
            }
        }

        // The loop always returns; reaching here means the retry bound was misconfigured.
        Err(AppError::SchemaValidation(
            "no model response was evaluated".to_string(),
        ))
    }

    /// Re-derives the decision in code and annotates the justification when it
    /// differs from what the model returned.
    fn finalize(&self, output: ValidatedOutput, skills: &SkillCoverage) -> DecisionRecord {
        let requirements_met = output
            .requirements_met
            .unwrap_or(output.decision == Decision::Selected);
        let failures = self.rules.assess(
            output.score,
            requirements_met,
            skills,
            output.matching_projects,
        );

        let derived = if failures.is_empty() {
            Decision::Selected
        } else {
            Decision::Rejected
        };

        let justification = if derived == output.decision {
            output.justification
        } else {
            warn!(
                "Overriding model decision {} with {}: {}",
                output.decision,
                derived,
                describe_failures(&failures)
            );
            annotate_override(&output.justification, output.decision, derived, &failures)
        };

        DecisionRecord {
            decision: derived,
            compatibility_score: output.score,
            justification,
        }
    }
}

fn transition(state: &mut EvaluationState, next: EvaluationState) {
    debug!("Evaluation state {:?} -> {:?}", state, next);
    *state = next;
}

fn generation_error(e: LlmError) -> AppError {
    match e {
        LlmError::Timeout(secs) => {
            AppError::GenerationTimeout(format!("no response after {secs}s"))
        }
        other => AppError::Generation(other.to_string()),
    }
}

/// Parses and validates raw model text. Returns a human-readable violation on failure.
fn parse_model_output(raw: &str) -> Result<ValidatedOutput, String> {
    let parsed: ModelDecision =
        serde_json::from_str(strip_json_fences(raw)).map_err(|e| e.to_string())?;

    let score = u8::try_from(parsed.compatibility_score)
        .ok()
        .filter(|s| *s <= 100)
        .ok_or_else(|| {
            format!(
                "compatibility_score {} is outside 0..=100",
                parsed.compatibility_score
            )
        })?;

    if parsed.justification.trim().is_empty() {
        return Err("justification is empty".to_string());
    }

    Ok(ValidatedOutput {
        decision: parsed.decision,
        score,
        justification: parsed.justification,
        requirements_met: parsed.requirements_met,
        matching_projects: parsed.matching_projects,
    })
}

fn describe_failures(failures: &[CheckFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn annotate_override(
    justification: &str,
    model_decision: Decision,
    derived: Decision,
    failures: &[CheckFailure],
) -> String {
    let reason = if failures.is_empty() {
        "the score meets the threshold and every check passed".to_string()
    } else {
        describe_failures(failures)
    };
    format!(
        "{justification} [Decision override: the model returned {model_decision}, but {reason}. \
        Final decision: {derived}.]"
    )
}
