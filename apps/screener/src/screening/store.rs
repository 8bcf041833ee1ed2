//! Result Store — append-only audit trail of screening decisions.
//!
//! CRITICAL: rows are only ever INSERTed. There is no update or delete path; a repeat
//! evaluation of the same candidate appends a new row.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::AppError;
use crate::models::candidate::{CandidateRecord, RecordId, ResultRow};

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Appends one row and returns its store-assigned identifier.
    async fn save(&self, candidate: &CandidateRecord) -> Result<RecordId, AppError>;

    async fn find(&self, id: RecordId) -> Result<Option<ResultRow>, AppError>;
}

/// SQLite-backed store. SQLite serialises writers, so concurrent `save` calls each get
/// their own row and a distinct AUTOINCREMENT id.
#[derive(Clone)]
pub struct SqliteResultStore {
    pool: SqlitePool,
}

impl SqliteResultStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultStore for SqliteResultStore {
    async fn save(&self, candidate: &CandidateRecord) -> Result<RecordId, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO results
                (candidate_name, candidate_email, resume_path, decision,
                 compatibility_score, justification, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&candidate.name)
        .bind(&candidate.email)
        .bind(&candidate.resume_path)
        .bind(candidate.decision.decision.as_str())
        .bind(i64::from(candidate.decision.compatibility_score))
        .bind(&candidate.decision.justification)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(
            "Saved result {id} for {} ({})",
            candidate.email, candidate.decision.decision
        );
        Ok(id)
    }

    async fn find(&self, id: RecordId) -> Result<Option<ResultRow>, AppError> {
        Ok(
            sqlx::query_as::<_, ResultRow>("SELECT * FROM results WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use crate::db::create_pool;
    use crate::models::decision::{Decision, DecisionRecord};

    fn candidate(name: &str) -> CandidateRecord {
        CandidateRecord {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            resume_path: format!("/tmp/{name}.pdf"),
            decision: DecisionRecord {
                decision: Decision::Selected,
                compatibility_score: 92,
                justification: "Meets every requirement.".to_string(),
            },
        }
    }

    async fn memory_store() -> SqliteResultStore {
        SqliteResultStore::new(create_pool("sqlite::memory:").await.unwrap())
    }

    #[tokio::test]
    async fn test_save_then_find_round_trips_fields() {
        let store = memory_store().await;
        let id = store.save(&candidate("Ada")).await.unwrap();

        let row = store.find(id).await.unwrap().unwrap();
        assert_eq!(row.id, id);
        assert_eq!(row.candidate_name, "Ada");
        assert_eq!(row.candidate_email, "ada@example.com");
        assert_eq!(row.resume_path, "/tmp/Ada.pdf");
        assert_eq!(row.decision, "SELECTED");
        assert_eq!(row.compatibility_score, 92);
        assert_eq!(row.justification, "Meets every requirement.");
    }

    #[tokio::test]
    async fn test_ids_increase_and_repeat_candidates_append() {
        let store = memory_store().await;
        let first = store.save(&candidate("Ada")).await.unwrap();
        let second = store.save(&candidate("Ada")).await.unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let store = memory_store().await;
        assert!(store.find(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_saves_get_distinct_ids() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("results.db").display());
        let store = Arc::new(SqliteResultStore::new(create_pool(&url).await.unwrap()));

        let mut handles = Vec::new();
        for i in 0..25 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.save(&candidate(&format!("C{i}"))).await.unwrap()
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }
        assert_eq!(ids.len(), 25);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM results")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(count, 25);
    }

    #[tokio::test]
    async fn test_closed_pool_is_persistence_error() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        pool.close().await;
        let err = SqliteResultStore::new(pool)
            .save(&candidate("Ada"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Persistence { .. }));
    }
}
