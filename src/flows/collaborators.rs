//! Opaque collaborator contracts consumed by the pipeline stages.
//!
//! Document parsing, prompt construction, and model calls live behind these
//! traits; the engine only sees their typed results.

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::item::Item;

/// Failure reported by a collaborator. The owning stage degrades gracefully:
/// the error is recorded and the run continues with unchanged state.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct CollaboratorError {
    pub message: String,
}

impl CollaboratorError {
    pub fn msg<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One of the independent upstream collectors (interviews, workshops,
/// artifacts). Each returns a single named fragment of raw material.
#[async_trait]
pub trait SourceProducer: Send + Sync {
    async fn collect(&self) -> Result<Value, CollaboratorError>;
}

/// Everything a propose collaborator may look at when generating candidates.
#[derive(Clone, Debug)]
pub struct ProposeContext {
    /// Phase this propose cycle belongs to.
    pub phase: String,
    /// Completed review cycles so far in this phase.
    pub iteration: u32,
    /// Collected source fragments, keyed by producer name.
    pub inputs: FxHashMap<String, Value>,
    /// Reviewer guidance from the previous cycle, if any.
    pub feedback: Option<String>,
    /// Items already accepted in this phase (avoid re-proposing them).
    pub accepted: Vec<Item>,
    /// Finalized output of the previous phase, when one exists.
    pub carried: Option<Value>,
}

/// Generates candidate items for one propose cycle.
#[async_trait]
pub trait Proposer: Send + Sync {
    async fn propose(&self, ctx: ProposeContext) -> Result<Vec<Item>, CollaboratorError>;
}
