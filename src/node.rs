//! Node execution primitives: the [`Node`] trait, execution context, and
//! partial-state patches.
//!
//! A node is a pure unit of work: it reads an immutable [`StateSnapshot`],
//! does its job, and returns a [`NodePatch`] describing only the channels it
//! wants to change. The barrier merges patches through the reducer registry;
//! nodes never mutate shared state.

use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

use crate::channels::errors::ErrorEvent;
use crate::channels::{PhaseStart, ReviewSubmission};
use crate::event_bus::Event;
use crate::item::Item;
use crate::message::Message;
use crate::state::StateSnapshot;

/// A named unit of work in the workflow graph.
///
/// Implementations should be stateless and deterministic given the snapshot.
/// Failures come in two flavors:
///
/// 1. returning `Err(NodeError)`: the scheduler records the error on the
///    log/errors channels and advances with an empty patch; the run is never
///    aborted by a single failing stage;
/// 2. recoverable warnings: append to `NodePatch::errors` and return `Ok`.
#[async_trait]
pub trait Node: Send + Sync {
    async fn run(&self, snapshot: StateSnapshot, ctx: NodeContext)
    -> Result<NodePatch, NodeError>;
}

/// Execution context passed to a node for one superstep.
#[derive(Clone, Debug)]
pub struct NodeContext {
    /// Identifier of the stage being executed.
    pub node_id: String,
    /// Superstep number within the session.
    pub step: u64,
    /// Sender into the run's event bus.
    pub event_sender: flume::Sender<Event>,
}

impl NodeContext {
    /// Emit a node-scoped observability event tagged with this context's
    /// stage id and step.
    pub fn emit(
        &self,
        scope: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<(), NodeContextError> {
        self.event_sender
            .send(Event::node_with_meta(
                self.node_id.clone(),
                self.step,
                scope,
                message,
            ))
            .map_err(|_| NodeContextError::EventBusUnavailable)
    }
}

/// Partial-state update returned by a node.
///
/// Every field is optional; a node touches only the channels it cares about.
#[derive(Clone, Debug, Default)]
pub struct NodePatch {
    /// Log entries to append.
    pub log: Option<Vec<Message>>,
    /// Input fragments to merge (per-key insert).
    pub inputs: Option<FxHashMap<String, Value>>,
    /// Review-cycle field updates.
    pub review: Option<ReviewPatch>,
    /// Phase results to record (write-once per key).
    pub outputs: Option<FxHashMap<String, Value>>,
    /// Error events to append.
    pub errors: Option<Vec<ErrorEvent>>,
}

impl NodePatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_log(mut self, log: Vec<Message>) -> Self {
        self.log = Some(log);
        self
    }

    #[must_use]
    pub fn with_inputs(mut self, inputs: FxHashMap<String, Value>) -> Self {
        self.inputs = Some(inputs);
        self
    }

    #[must_use]
    pub fn with_review(mut self, review: ReviewPatch) -> Self {
        self.review = Some(review);
        self
    }

    #[must_use]
    pub fn with_outputs(mut self, outputs: FxHashMap<String, Value>) -> Self {
        self.outputs = Some(outputs);
        self
    }

    #[must_use]
    pub fn with_errors(mut self, errors: Vec<ErrorEvent>) -> Self {
        self.errors = Some(errors);
        self
    }

    /// True when the patch carries no updates at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.is_none()
            && self.inputs.is_none()
            && self.review.is_none()
            && self.outputs.is_none()
            && self.errors.is_none()
    }
}

/// Field-level updates to the review cycle.
///
/// Each populated field carries its own merge discipline, applied by the
/// review reducer in declaration order: phase reset first, then proposal
/// replacement, accumulator unions, feedback replacement, iteration advance,
/// inbox update, exhaustion flag.
#[derive(Clone, Debug, Default)]
pub struct ReviewPatch {
    /// Reset the cycle for a new phase.
    pub begin_phase: Option<PhaseStart>,
    /// Replace the proposed set wholesale.
    pub proposed: Option<Vec<Item>>,
    /// Union these into the accepted accumulator (by identity key).
    pub accepted: Option<Vec<Item>>,
    /// Union these into the rejected accumulator (by identity key).
    pub rejected: Option<Vec<Item>>,
    /// Replace the reviewer feedback (outer `Some` = replace, inner value
    /// may clear it).
    pub feedback: Option<Option<String>>,
    /// Advance the iteration counter (merged with `max`).
    pub iteration: Option<u32>,
    /// Fill or clear the pending-submission inbox.
    pub pending: Option<PendingUpdate>,
    /// Mark the loop as exhausted.
    pub exhausted: Option<bool>,
}

impl ReviewPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn begin_phase(mut self, phase: &str, max_iterations: u32) -> Self {
        self.begin_phase = Some(PhaseStart {
            phase: phase.to_string(),
            max_iterations,
        });
        self
    }

    #[must_use]
    pub fn propose(mut self, items: Vec<Item>) -> Self {
        self.proposed = Some(items);
        self
    }

    #[must_use]
    pub fn accept(mut self, items: Vec<Item>) -> Self {
        self.accepted = Some(items);
        self
    }

    #[must_use]
    pub fn reject(mut self, items: Vec<Item>) -> Self {
        self.rejected = Some(items);
        self
    }

    #[must_use]
    pub fn feedback(mut self, feedback: Option<String>) -> Self {
        self.feedback = Some(feedback);
        self
    }

    #[must_use]
    pub fn iteration(mut self, iteration: u32) -> Self {
        self.iteration = Some(iteration);
        self
    }

    #[must_use]
    pub fn set_pending(mut self, submission: ReviewSubmission) -> Self {
        self.pending = Some(PendingUpdate::Set(submission));
        self
    }

    #[must_use]
    pub fn clear_pending(mut self) -> Self {
        self.pending = Some(PendingUpdate::Clear);
        self
    }

    #[must_use]
    pub fn exhausted(mut self) -> Self {
        self.exhausted = Some(true);
        self
    }
}

/// Update to the pending-submission inbox.
///
/// Distinct from `Option<ReviewSubmission>` so "leave untouched" (patch field
/// `None`) and "clear the inbox" are different operations.
#[derive(Clone, Debug)]
pub enum PendingUpdate {
    Set(ReviewSubmission),
    Clear,
}

/// Errors that can occur when using [`NodeContext`] methods.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeContextError {
    #[error("failed to emit event: event bus unavailable")]
    #[diagnostic(
        code(vetflow::node::event_bus_unavailable),
        help("The event bus may be shut down. Check runner lifecycle.")
    )]
    EventBusUnavailable,
}

/// Errors returned by node execution.
///
/// These never abort the run: the scheduler converts them into error events
/// plus an empty patch for the failing stage.
#[derive(Debug, Error, Diagnostic)]
pub enum NodeError {
    /// Expected data is missing from the snapshot.
    #[error("missing expected input: {what}")]
    #[diagnostic(
        code(vetflow::node::missing_input),
        help("Check that the upstream stage produced the required data.")
    )]
    MissingInput { what: &'static str },

    /// An opaque collaborator (producer, proposer) failed.
    #[error("collaborator error ({who}): {message}")]
    #[diagnostic(code(vetflow::node::collaborator))]
    Collaborator { who: String, message: String },

    /// JSON (de)serialization failed inside the node.
    #[error(transparent)]
    #[diagnostic(code(vetflow::node::serde_json))]
    Serde(#[from] serde_json::Error),

    /// Input validation failed.
    #[error("validation failed: {0}")]
    #[diagnostic(code(vetflow::node::validation))]
    ValidationFailed(String),

    /// Event bus communication failed.
    #[error("event bus error: {0}")]
    #[diagnostic(code(vetflow::node::event_bus))]
    EventBus(#[from] NodeContextError),
}
