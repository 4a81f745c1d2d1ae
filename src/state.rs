//! Workflow state: the typed record threaded through every stage.
//!
//! [`WorkflowState`] owns five versioned channels; nodes never touch it
//! directly. Each superstep hands every scheduled node an immutable
//! [`StateSnapshot`], collects their [`NodePatch`](crate::node::NodePatch)
//! outputs, and merges them at the barrier through the reducer registry.
//!
//! # Examples
//!
//! ```
//! use vetflow::state::WorkflowState;
//! use serde_json::json;
//!
//! let mut state = WorkflowState::for_phase("needs", 3);
//! state.add_input("interviews", json!({"quotes": 12}));
//! state.add_log_entry("engine", "collected interview fragment");
//!
//! let snapshot = state.snapshot();
//! assert_eq!(snapshot.review.phase, "needs");
//! assert_eq!(snapshot.inputs.len(), 1);
//! ```

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::{
    channels::{
        Channel, ErrorsChannel, InputsChannel, LogChannel, OutputsChannel, ReviewChannel,
        ReviewCycle,
    },
    channels::errors::ErrorEvent,
    message::Message,
};

/// The complete mutable state of one workflow run.
///
/// Created once per `Start`, checkpointed at every suspend point, restored on
/// `Resume`, and retained (read-only) once the run reaches a terminal node.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct WorkflowState {
    /// Append-only run narration.
    pub log: LogChannel,
    /// Named fragments from the parallel source producers.
    pub inputs: InputsChannel,
    /// The active propose/review cycle.
    pub review: ReviewChannel,
    /// Finalized per-phase results, write-once per phase.
    pub outputs: OutputsChannel,
    /// Diagnostic error events.
    pub errors: ErrorsChannel,
}

/// Immutable view of state handed to nodes during a superstep.
///
/// Snapshots are independent clones: mutations applied at the barrier do not
/// bleed into nodes that are still running.
#[derive(Clone, Debug)]
pub struct StateSnapshot {
    pub log: Vec<Message>,
    pub log_version: u32,
    pub inputs: FxHashMap<String, Value>,
    pub inputs_version: u32,
    pub review: ReviewCycle,
    pub review_version: u32,
    pub outputs: FxHashMap<String, Value>,
    pub outputs_version: u32,
    pub errors: Vec<ErrorEvent>,
    pub errors_version: u32,
}

impl WorkflowState {
    /// State seeded for the first phase of a run.
    #[must_use]
    pub fn for_phase(phase: &str, max_iterations: u32) -> Self {
        Self {
            review: ReviewChannel::new(ReviewCycle::for_phase(phase, max_iterations), 1),
            ..Default::default()
        }
    }

    /// Fluent builder for richer initial states (tests, restored fixtures).
    #[must_use]
    pub fn builder() -> WorkflowStateBuilder {
        WorkflowStateBuilder::default()
    }

    /// Appends a log entry. Versioning stays with the barrier.
    pub fn add_log_entry(&mut self, actor: &str, content: &str) -> &mut Self {
        self.log.get_mut().push(Message::new(actor, content));
        self
    }

    /// Inserts a named input fragment. Versioning stays with the barrier.
    pub fn add_input(&mut self, name: &str, value: Value) -> &mut Self {
        self.inputs.get_mut().insert(name.to_string(), value);
        self
    }

    /// Clones the current channel payloads and versions into a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            log: self.log.snapshot(),
            log_version: self.log.version(),
            inputs: self.inputs.snapshot(),
            inputs_version: self.inputs.version(),
            review: self.review.snapshot(),
            review_version: self.review.version(),
            outputs: self.outputs.snapshot(),
            outputs_version: self.outputs.version(),
            errors: self.errors.snapshot(),
            errors_version: self.errors.version(),
        }
    }
}

/// Builder for [`WorkflowState`].
#[derive(Debug, Default)]
pub struct WorkflowStateBuilder {
    log: Vec<Message>,
    inputs: FxHashMap<String, Value>,
    review: ReviewCycle,
    outputs: FxHashMap<String, Value>,
}

impl WorkflowStateBuilder {
    #[must_use]
    pub fn with_phase(mut self, phase: &str, max_iterations: u32) -> Self {
        self.review = ReviewCycle::for_phase(phase, max_iterations);
        self
    }

    #[must_use]
    pub fn with_log_entry(mut self, actor: &str, content: &str) -> Self {
        self.log.push(Message::new(actor, content));
        self
    }

    #[must_use]
    pub fn with_input(mut self, name: &str, value: Value) -> Self {
        self.inputs.insert(name.to_string(), value);
        self
    }

    #[must_use]
    pub fn with_output(mut self, phase: &str, value: Value) -> Self {
        self.outputs.insert(phase.to_string(), value);
        self
    }

    #[must_use]
    pub fn build(self) -> WorkflowState {
        WorkflowState {
            log: LogChannel::new(self.log, 1),
            inputs: InputsChannel::new(self.inputs, 1),
            review: ReviewChannel::new(self.review, 1),
            outputs: OutputsChannel::new(self.outputs, 1),
            errors: ErrorsChannel::default(),
        }
    }
}
