use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::decision::DecisionRecord;

/// Store-assigned row identifier. Monotonically increasing.
pub type RecordId = i64;

/// One candidate evaluation, ready to be appended to the result store.
#[derive(Debug, Clone)]
pub struct CandidateRecord {
    pub name: String,
    pub email: String,
    pub resume_path: String,
    pub decision: DecisionRecord,
}

/// A persisted row of the `results` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResultRow {
    pub id: RecordId,
    pub candidate_name: String,
    pub candidate_email: String,
    pub resume_path: String,
    pub decision: String,
    pub compatibility_score: i64,
    pub justification: String,
    pub created_at: DateTime<Utc>,
}
