//! The compiled application: graph topology plus barrier mechanics.
//!
//! `App` is produced by [`GraphBuilder::compile`](crate::graphs::GraphBuilder::compile)
//! and holds the validated topology, the reducer registry, the suspend-before
//! flags, and the runtime configuration. Execution itself lives in
//! [`WorkflowRunner`](crate::runtimes::WorkflowRunner); the one piece of
//! runtime behavior owned here is [`apply_barrier`](App::apply_barrier), the
//! deterministic merge of a superstep's patches.

use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

use crate::channels::Channel;
use crate::channels::errors::ErrorEvent;
use crate::graphs::Router;
use crate::node::{Node, NodePatch};
use crate::reducers::{ReducerError, ReducerRegistry};
use crate::runtimes::RuntimeConfig;
use crate::state::WorkflowState;
use crate::types::NodeKind;

/// A compiled, validated workflow graph.
#[derive(Clone)]
pub struct App {
    nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
    edges: FxHashMap<NodeKind, Vec<NodeKind>>,
    routers: Vec<Router>,
    suspend_before: FxHashSet<NodeKind>,
    reducers: ReducerRegistry,
    runtime_config: RuntimeConfig,
}

/// Result of applying one superstep's patches at the barrier.
///
/// Updates and errors are aggregated in a stable order so the runner,
/// checkpointers, and tests observe identical behavior across executions.
#[derive(Debug, Clone, Default)]
pub struct BarrierOutcome {
    /// Channels whose content changed during the barrier.
    pub updated_channels: Vec<&'static str>,
    /// Error events recorded by this superstep's patches.
    pub errors: Vec<ErrorEvent>,
}

impl App {
    /// Internal (crate) factory; graphs are built through the builder.
    pub(crate) fn from_parts(
        nodes: FxHashMap<NodeKind, Arc<dyn Node>>,
        edges: FxHashMap<NodeKind, Vec<NodeKind>>,
        routers: Vec<Router>,
        suspend_before: FxHashSet<NodeKind>,
        reducers: ReducerRegistry,
        runtime_config: RuntimeConfig,
    ) -> Self {
        App {
            nodes,
            edges,
            routers,
            suspend_before,
            reducers,
            runtime_config,
        }
    }

    /// Registered executable stages.
    #[must_use]
    pub fn nodes(&self) -> &FxHashMap<NodeKind, Arc<dyn Node>> {
        &self.nodes
    }

    /// Unconditional edges (static topology).
    #[must_use]
    pub fn edges(&self) -> &FxHashMap<NodeKind, Vec<NodeKind>> {
        &self.edges
    }

    /// Conditional label-routed edges.
    #[must_use]
    pub fn routers(&self) -> &[Router] {
        &self.routers
    }

    /// Stages flagged to suspend execution before running.
    #[must_use]
    pub fn suspend_before(&self) -> &FxHashSet<NodeKind> {
        &self.suspend_before
    }

    /// Runtime configuration carried from the builder.
    #[must_use]
    pub fn runtime_config(&self) -> &RuntimeConfig {
        &self.runtime_config
    }

    /// Merges one superstep's patches into the state.
    ///
    /// Patches are folded in `ran` order (scheduling order, not completion
    /// order), each through the reducer registry, so merges are deterministic
    /// regardless of how the concurrent branches interleaved. Channel
    /// versions bump exactly once per superstep, and only for channels whose
    /// content actually changed.
    #[tracing::instrument(skip(self, state, patches), err)]
    pub fn apply_barrier(
        &self,
        state: &mut WorkflowState,
        ran: &[NodeKind],
        patches: Vec<NodePatch>,
    ) -> Result<BarrierOutcome, ReducerError> {
        let log_before_len = state.log.len();
        let log_before_ver = state.log.version();
        let inputs_before = state.inputs.snapshot();
        let inputs_before_ver = state.inputs.version();
        let review_before = state.review.snapshot();
        let review_before_ver = state.review.version();
        let outputs_before = state.outputs.snapshot();
        let outputs_before_ver = state.outputs.version();
        let errors_before_len = state.errors.len();
        let errors_before_ver = state.errors.version();

        let mut errors_all: Vec<ErrorEvent> = Vec::new();
        for (i, patch) in patches.iter().enumerate() {
            if let Some(events) = &patch.errors {
                errors_all.extend(events.iter().cloned());
            }
            if let Some(kind) = ran.get(i) {
                tracing::debug!(stage = %kind, empty = patch.is_empty(), "folding patch");
            }
            self.reducers.apply_patch(state, patch)?;
        }

        let mut updated: Vec<&'static str> = Vec::new();

        if state.log.len() != log_before_len {
            state.log.set_version(log_before_ver.saturating_add(1));
            updated.push("log");
        }
        if state.inputs.snapshot() != inputs_before {
            state
                .inputs
                .set_version(inputs_before_ver.saturating_add(1));
            updated.push("inputs");
        }
        if state.review.snapshot() != review_before {
            state
                .review
                .set_version(review_before_ver.saturating_add(1));
            updated.push("review");
        }
        if state.outputs.snapshot() != outputs_before {
            state
                .outputs
                .set_version(outputs_before_ver.saturating_add(1));
            updated.push("outputs");
        }
        if state.errors.len() != errors_before_len {
            state
                .errors
                .set_version(errors_before_ver.saturating_add(1));
            updated.push("errors");
        }

        if !updated.is_empty() {
            tracing::info!(
                target: "vetflow::app",
                channels = ?updated,
                "barrier applied"
            );
        }

        Ok(BarrierOutcome {
            updated_channels: updated,
            errors: errors_all,
        })
    }
}
