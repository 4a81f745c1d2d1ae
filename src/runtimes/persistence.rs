/*!
Serde persistence models for checkpoints.

Explicit serde-friendly shapes decoupled from the in-memory types, so the
SQLite checkpointer (and any future durable backend) stays lean and the
on-disk format evolves independently. This module performs no I/O; it is
pure conversion glue.
*/

use chrono::Utc;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    channels::{
        Channel, ErrorsChannel, InputsChannel, LogChannel, OutputsChannel, ReviewChannel,
        ReviewCycle,
    },
    channels::errors::ErrorEvent,
    message::Message,
    runtimes::checkpointer::Checkpoint,
    state::WorkflowState,
    types::NodeKind,
};

/// Vector-shaped channel with version metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedVecChannel<T> {
    pub version: u32,
    #[serde(default)]
    pub items: Vec<T>,
}

impl<T> Default for PersistedVecChannel<T> {
    fn default() -> Self {
        Self {
            version: 1,
            items: Vec::new(),
        }
    }
}

/// Map-shaped channel with version metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedMapChannel<V> {
    pub version: u32,
    #[serde(default)]
    pub map: FxHashMap<String, V>,
}

impl<V> Default for PersistedMapChannel<V> {
    fn default() -> Self {
        Self {
            version: 1,
            map: FxHashMap::default(),
        }
    }
}

/// Review channel with version metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PersistedReviewChannel {
    pub version: u32,
    #[serde(default)]
    pub cycle: ReviewCycle,
}

/// Complete persisted shape of the in-memory [`WorkflowState`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PersistedState {
    pub log: PersistedVecChannel<Message>,
    pub inputs: PersistedMapChannel<Value>,
    pub review: PersistedReviewChannel,
    pub outputs: PersistedMapChannel<Value>,
    #[serde(default)]
    pub errors: PersistedVecChannel<ErrorEvent>,
}

/// Full persisted checkpoint record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedCheckpoint {
    pub session_id: String,
    pub step: u64,
    pub state: PersistedState,
    /// Frontier encoded via `NodeKind::encode()`.
    pub frontier: Vec<String>,
    /// RFC 3339 creation time (keeps chrono out of the serialized shape).
    pub created_at: String,
}

/// Conversion and serialization failures for persistence models.
#[derive(Debug, Error, Diagnostic)]
pub enum PersistenceError {
    #[error("JSON serialization/deserialization failed: {source}")]
    #[diagnostic(
        code(vetflow::persistence::serde),
        help("Ensure the JSON structure matches the Persisted* types.")
    )]
    Serde {
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Serialize any persistence model to a JSON string.
pub fn to_json_string<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|source| PersistenceError::Serde { source })
}

/// Parse any persistence model from a JSON string.
pub fn from_json_str<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T> {
    serde_json::from_str(s).map_err(|source| PersistenceError::Serde { source })
}

/* ---------- WorkflowState <-> PersistedState ---------- */

impl From<&WorkflowState> for PersistedState {
    fn from(state: &WorkflowState) -> Self {
        PersistedState {
            log: PersistedVecChannel {
                version: state.log.version(),
                items: state.log.snapshot(),
            },
            inputs: PersistedMapChannel {
                version: state.inputs.version(),
                map: state.inputs.snapshot(),
            },
            review: PersistedReviewChannel {
                version: state.review.version(),
                cycle: state.review.snapshot(),
            },
            outputs: PersistedMapChannel {
                version: state.outputs.version(),
                map: state.outputs.snapshot(),
            },
            errors: PersistedVecChannel {
                version: state.errors.version(),
                items: state.errors.snapshot(),
            },
        }
    }
}

impl From<PersistedState> for WorkflowState {
    fn from(p: PersistedState) -> Self {
        WorkflowState {
            log: LogChannel::new(p.log.items, p.log.version),
            inputs: InputsChannel::new(p.inputs.map, p.inputs.version),
            review: ReviewChannel::new(p.review.cycle, p.review.version),
            outputs: OutputsChannel::new(p.outputs.map, p.outputs.version),
            errors: ErrorsChannel::new(p.errors.items, p.errors.version),
        }
    }
}

/* ---------- Checkpoint <-> PersistedCheckpoint ---------- */

impl From<&Checkpoint> for PersistedCheckpoint {
    fn from(cp: &Checkpoint) -> Self {
        PersistedCheckpoint {
            session_id: cp.session_id.clone(),
            step: cp.step,
            state: PersistedState::from(&cp.state),
            frontier: cp.frontier.iter().map(NodeKind::encode).collect(),
            created_at: cp.created_at.to_rfc3339(),
        }
    }
}

impl From<PersistedCheckpoint> for Checkpoint {
    fn from(p: PersistedCheckpoint) -> Self {
        let created_at = chrono::DateTime::parse_from_rfc3339(&p.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        Checkpoint {
            session_id: p.session_id,
            step: p.step,
            state: WorkflowState::from(p.state),
            frontier: p.frontier.iter().map(|s| NodeKind::decode(s)).collect(),
            created_at,
        }
    }
}
