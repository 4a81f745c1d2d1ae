//! Checkpoint store: keyed, swappable persistence for suspended sessions.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::runtimes::session::SessionState;
use crate::state::WorkflowState;
use crate::types::NodeKind;

/// One persisted checkpoint: the full session keyed by its opaque id.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub session_id: String,
    pub step: u64,
    pub state: WorkflowState,
    pub frontier: Vec<NodeKind>,
    pub created_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Snapshot a session into a checkpoint record.
    #[must_use]
    pub fn from_session(session_id: &str, session: &SessionState) -> Self {
        Self {
            session_id: session_id.to_string(),
            step: session.step,
            state: session.state.clone(),
            frontier: session.frontier.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Rebuild in-memory session state from a checkpoint.
#[must_use]
pub fn restore_session_state(checkpoint: &Checkpoint) -> SessionState {
    SessionState {
        state: checkpoint.state.clone(),
        step: checkpoint.step,
        frontier: checkpoint.frontier.clone(),
    }
}

/// Errors from checkpoint persistence backends.
#[derive(Debug, Error, Diagnostic)]
pub enum CheckpointerError {
    #[error("checkpoint backend error: {message}")]
    #[diagnostic(code(vetflow::checkpointer::backend))]
    Backend { message: String },

    #[error("checkpoint serialization error: {message}")]
    #[diagnostic(
        code(vetflow::checkpointer::serde),
        help("Check that persisted shapes match the current schema.")
    )]
    Serde { message: String },
}

pub type Result<T> = std::result::Result<T, CheckpointerError>;

/// Which persistence backend a runner should use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointerType {
    /// Volatile store; sessions die with the process.
    InMemory,
    /// Durable SQLite-backed store.
    #[cfg(feature = "sqlite")]
    Sqlite,
}

/// Durable (or in-memory) keyed storage of suspended sessions.
///
/// Contract: one logical writer per session: the engine never interleaves
/// `load`-modify-`save` cycles for the same id. Stores keep the latest
/// checkpoint per session; terminal sessions keep theirs until
/// [`clear`](Self::clear).
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Persist (replace) the session's checkpoint.
    async fn save(&self, checkpoint: Checkpoint) -> Result<()>;

    /// Load the latest checkpoint for a session, if any.
    async fn load_latest(&self, session_id: &str) -> Result<Option<Checkpoint>>;

    /// Remove a session's checkpoint (explicit cleanup/abandonment).
    async fn clear(&self, session_id: &str) -> Result<()>;

    /// All session ids with a stored checkpoint.
    async fn list_sessions(&self) -> Result<Vec<String>>;
}

/// Volatile checkpointer for tests and single-process runs.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointer {
    store: Mutex<FxHashMap<String, Checkpoint>>,
}

impl InMemoryCheckpointer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    async fn save(&self, checkpoint: Checkpoint) -> Result<()> {
        self.store
            .lock()
            .expect("checkpoint store poisoned")
            .insert(checkpoint.session_id.clone(), checkpoint);
        Ok(())
    }

    async fn load_latest(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        Ok(self
            .store
            .lock()
            .expect("checkpoint store poisoned")
            .get(session_id)
            .cloned())
    }

    async fn clear(&self, session_id: &str) -> Result<()> {
        self.store
            .lock()
            .expect("checkpoint store poisoned")
            .remove(session_id);
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .lock()
            .expect("checkpoint store poisoned")
            .keys()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_session() -> SessionState {
        SessionState {
            state: WorkflowState::for_phase("needs", 3),
            step: 2,
            frontier: vec![NodeKind::stage("review_needs")],
        }
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let store = InMemoryCheckpointer::new();
        let session = sample_session();
        store
            .save(Checkpoint::from_session("sess-1", &session))
            .await
            .unwrap();

        let loaded = store.load_latest("sess-1").await.unwrap().unwrap();
        assert_eq!(loaded.step, 2);
        assert_eq!(loaded.frontier, vec![NodeKind::stage("review_needs")]);

        let restored = restore_session_state(&loaded);
        assert_eq!(restored.state.review.get().phase, "needs");
    }

    #[tokio::test]
    async fn test_clear_removes_checkpoint() {
        let store = InMemoryCheckpointer::new();
        store
            .save(Checkpoint::from_session("sess-1", &sample_session()))
            .await
            .unwrap();
        store.clear("sess-1").await.unwrap();
        assert!(store.load_latest("sess-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_sessions() {
        let store = InMemoryCheckpointer::new();
        let session = sample_session();
        store
            .save(Checkpoint::from_session("alpha", &session))
            .await
            .unwrap();
        store
            .save(Checkpoint::from_session("beta", &session))
            .await
            .unwrap();
        let mut ids = store.list_sessions().await.unwrap();
        ids.sort();
        assert_eq!(ids, vec!["alpha", "beta"]);
    }
}
