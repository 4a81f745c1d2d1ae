/*!
SQLite-backed checkpointer.

Durable `(session_id) -> (state, frontier)` storage behind the same
[`Checkpointer`] trait as the in-memory store, so the two modes swap without
touching runner code. Serialization goes through the persistence models; this
module is database I/O only.

The schema is ensured with idempotent `CREATE TABLE IF NOT EXISTS` on
connect. The store keeps the latest checkpoint per session (`INSERT ... ON
CONFLICT` replace), matching the engine's single-writer-per-session contract.
*/

use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;
use tracing::instrument;

use crate::runtimes::checkpointer::{Checkpoint, Checkpointer, CheckpointerError, Result};
use crate::runtimes::persistence::{
    PersistedCheckpoint, PersistedState, from_json_str, to_json_string,
};
use crate::state::WorkflowState;
use crate::types::NodeKind;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS checkpoints (
    session_id TEXT PRIMARY KEY,
    step INTEGER NOT NULL,
    state_json TEXT NOT NULL,
    frontier_json TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Durable checkpointer over a SQLite connection pool.
pub struct SqliteCheckpointer {
    pool: Arc<SqlitePool>,
}

impl std::fmt::Debug for SqliteCheckpointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCheckpointer").finish()
    }
}

impl SqliteCheckpointer {
    /// Connect to (or create) the database at `database_url`.
    ///
    /// Accepts `sqlite://path.db` URLs or bare file paths. The file and
    /// schema are created if missing.
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> std::result::Result<Self, CheckpointerError> {
        let path = database_url
            .strip_prefix("sqlite://")
            .unwrap_or(database_url);
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| CheckpointerError::Backend {
                message: format!("invalid sqlite path '{path}': {e}"),
            })?
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| CheckpointerError::Backend {
                message: format!("connect error: {e}"),
            })?;

        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| CheckpointerError::Backend {
                message: format!("schema setup: {e}"),
            })?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

fn serde_err(e: crate::runtimes::persistence::PersistenceError) -> CheckpointerError {
    CheckpointerError::Serde {
        message: e.to_string(),
    }
}

#[async_trait::async_trait]
impl Checkpointer for SqliteCheckpointer {
    #[instrument(skip(self, checkpoint), err)]
    async fn save(&self, checkpoint: Checkpoint) -> Result<()> {
        let persisted = PersistedCheckpoint::from(&checkpoint);
        let state_json = to_json_string(&persisted.state).map_err(serde_err)?;
        let frontier_json = to_json_string(&persisted.frontier).map_err(serde_err)?;

        sqlx::query(
            r#"
            INSERT INTO checkpoints (session_id, step, state_json, frontier_json, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, datetime('now'))
            ON CONFLICT(session_id) DO UPDATE SET
                step = excluded.step,
                state_json = excluded.state_json,
                frontier_json = excluded.frontier_json,
                updated_at = datetime('now')
            "#,
        )
        .bind(&persisted.session_id)
        .bind(persisted.step as i64)
        .bind(&state_json)
        .bind(&frontier_json)
        .bind(&persisted.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| CheckpointerError::Backend {
            message: format!("save checkpoint: {e}"),
        })?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn load_latest(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        let row = sqlx::query(
            r#"
            SELECT step, state_json, frontier_json, created_at
            FROM checkpoints
            WHERE session_id = ?1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| CheckpointerError::Backend {
            message: format!("load checkpoint: {e}"),
        })?;

        let Some(row) = row else {
            return Ok(None);
        };

        let state_json: String = row.get("state_json");
        let frontier_json: String = row.get("frontier_json");
        let created_at: String = row.get("created_at");
        let step: i64 = row.get("step");

        let persisted_state: PersistedState = from_json_str(&state_json).map_err(serde_err)?;
        let frontier_enc: Vec<String> = from_json_str(&frontier_json).map_err(serde_err)?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&chrono::Utc))
            .unwrap_or_else(|_| chrono::Utc::now());

        Ok(Some(Checkpoint {
            session_id: session_id.to_string(),
            step: step as u64,
            state: WorkflowState::from(persisted_state),
            frontier: frontier_enc.iter().map(|s| NodeKind::decode(s)).collect(),
            created_at,
        }))
    }

    #[instrument(skip(self), err)]
    async fn clear(&self, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM checkpoints WHERE session_id = ?1")
            .bind(session_id)
            .execute(&*self.pool)
            .await
            .map_err(|e| CheckpointerError::Backend {
                message: format!("clear checkpoint: {e}"),
            })?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_sessions(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT session_id FROM checkpoints ORDER BY session_id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| CheckpointerError::Backend {
                message: format!("list sessions: {e}"),
            })?;
        Ok(rows.iter().map(|row| row.get("session_id")).collect())
    }
}
