use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::models::WorkflowState;

use super::{StateStoreError, StateStoreResult, WorkflowStateStore};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS onboarding_workflows (
    ticket_key  TEXT PRIMARY KEY,
    stage       TEXT NOT NULL,
    state       JSONB NOT NULL,
    version     BIGINT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

/// Postgres-backed workflow state store.
///
/// The full record is stored as JSONB; `stage` and `version` are mirrored
/// into columns so operators can query in-flight workflows and the CAS
/// condition stays a plain indexed comparison.
#[derive(Debug, Clone)]
pub struct PgStateStore {
    pool: PgPool,
}

impl PgStateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the backing table when it does not exist yet
    pub async fn ensure_schema(&self) -> StateStoreResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn stored_version(&self, ticket_key: &str) -> StateStoreResult<Option<i64>> {
        let version = sqlx::query_scalar::<_, i64>(
            "SELECT version FROM onboarding_workflows WHERE ticket_key = $1",
        )
        .bind(ticket_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(version)
    }
}

#[async_trait]
impl WorkflowStateStore for PgStateStore {
    async fn load(&self, ticket_key: &str) -> StateStoreResult<Option<WorkflowState>> {
        let row = sqlx::query("SELECT state FROM onboarding_workflows WHERE ticket_key = $1")
            .bind(ticket_key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            None => Ok(None),
            Some(row) => {
                let value: serde_json::Value = row.get("state");
                let state: WorkflowState = serde_json::from_value(value)?;
                Ok(Some(state))
            }
        }
    }

    async fn insert_new(&self, state: &WorkflowState) -> StateStoreResult<()> {
        let body = serde_json::to_value(state)?;
        let result = sqlx::query(
            r#"
            INSERT INTO onboarding_workflows (ticket_key, stage, state, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (ticket_key) DO NOTHING
            "#,
        )
        .bind(&state.ticket_key)
        .bind(state.stage.to_string())
        .bind(&body)
        .bind(state.version)
        .bind(state.created_at)
        .bind(state.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StateStoreError::already_exists(&state.ticket_key));
        }
        Ok(())
    }

    async fn compare_and_update(&self, state: &WorkflowState) -> StateStoreResult<WorkflowState> {
        let mut updated = state.clone();
        updated.version = state.version + 1;
        let body = serde_json::to_value(&updated)?;

        let result = sqlx::query(
            r#"
            UPDATE onboarding_workflows
            SET stage = $2, state = $3, version = $4, updated_at = $5
            WHERE ticket_key = $1 AND version = $6
            "#,
        )
        .bind(&updated.ticket_key)
        .bind(updated.stage.to_string())
        .bind(&body)
        .bind(updated.version)
        .bind(updated.updated_at)
        .bind(state.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish a lost race from a record that never existed
            return match self.stored_version(&state.ticket_key).await? {
                Some(_) => Err(StateStoreError::version_conflict(
                    &state.ticket_key,
                    state.version,
                )),
                None => Err(StateStoreError::not_found(&state.ticket_key)),
            };
        }

        Ok(updated)
    }
}
