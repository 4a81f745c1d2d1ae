//! Superstep scheduling: bounded concurrency with a hard join barrier.
//!
//! All stages in the current frontier run concurrently (bounded by the
//! configured limit). The superstep returns only when **every** scheduled
//! stage has finished; completion order within the group is unconstrained,
//! but nothing downstream observes a partial group. Virtual `Start`/`End`
//! entries are skipped.
//!
//! Failure semantics: a stage that returns an error (or panics) does not
//! abort the superstep. Its failure is converted into a log entry plus an
//! error event, and its patch is treated as empty, so the frontier still
//! advances and sibling branches keep their outputs.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::sync::Semaphore;

use crate::channels::errors::{ErrorEvent, FaultDetail};
use crate::event_bus::Event;
use crate::message::Message;
use crate::node::{Node, NodeContext, NodePatch};
use crate::state::StateSnapshot;
use crate::types::NodeKind;

/// Outcome of one superstep.
#[derive(Debug, Default)]
pub struct StepRunResult {
    /// Stages that executed, in scheduling order.
    pub ran_nodes: Vec<NodeKind>,
    /// Frontier entries that were skipped (virtual endpoints, unknown stages).
    pub skipped_nodes: Vec<NodeKind>,
    /// One patch per ran stage, in scheduling order. Failed stages yield
    /// their degraded error patch here.
    pub outputs: Vec<(NodeKind, NodePatch)>,
}

/// Concurrent superstep executor.
#[derive(Debug, Clone)]
pub struct Scheduler {
    concurrency_limit: usize,
}

impl Scheduler {
    /// Creates a scheduler with the given concurrency bound (minimum 1).
    #[must_use]
    pub fn new(concurrency_limit: usize) -> Self {
        Self {
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    #[must_use]
    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Runs every frontier stage concurrently and joins them all.
    ///
    /// Patches come back in scheduling order regardless of completion order,
    /// keeping downstream barrier merges deterministic.
    #[tracing::instrument(skip(self, nodes, snapshot, event_sender), fields(frontier_len = frontier.len()))]
    pub async fn superstep(
        &self,
        nodes: &FxHashMap<NodeKind, Arc<dyn Node>>,
        frontier: Vec<NodeKind>,
        snapshot: StateSnapshot,
        step: u64,
        event_sender: flume::Sender<Event>,
    ) -> StepRunResult {
        let mut ran_nodes: Vec<NodeKind> = Vec::new();
        let mut skipped_nodes: Vec<NodeKind> = Vec::new();
        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));

        let mut handles = Vec::new();
        for kind in frontier {
            if !kind.is_stage() {
                skipped_nodes.push(kind);
                continue;
            }
            let Some(node) = nodes.get(&kind).cloned() else {
                tracing::warn!(stage = %kind, "frontier references unknown stage; skipping");
                skipped_nodes.push(kind);
                continue;
            };

            ran_nodes.push(kind.clone());
            let ctx = NodeContext {
                node_id: kind.to_string(),
                step,
                event_sender: event_sender.clone(),
            };
            let task_snapshot = snapshot.clone();
            let permit_source = Arc::clone(&semaphore);
            handles.push((
                kind,
                tokio::spawn(async move {
                    let _permit = permit_source
                        .acquire_owned()
                        .await
                        .expect("scheduler semaphore closed");
                    node.run(task_snapshot, ctx).await
                }),
            ));
        }

        let mut outputs: Vec<(NodeKind, NodePatch)> = Vec::with_capacity(handles.len());
        for (kind, handle) in handles {
            let patch = match handle.await {
                Ok(Ok(patch)) => patch,
                Ok(Err(node_err)) => {
                    tracing::warn!(stage = %kind, error = %node_err, "stage failed; degrading to empty patch");
                    degraded_patch(&kind, step, FaultDetail::msg(node_err.to_string()))
                }
                Err(join_err) => {
                    tracing::error!(stage = %kind, error = %join_err, "stage task aborted; degrading to empty patch");
                    degraded_patch(
                        &kind,
                        step,
                        FaultDetail::msg("stage task aborted")
                            .with_cause(FaultDetail::msg(join_err.to_string())),
                    )
                }
            };
            outputs.push((kind, patch));
        }

        StepRunResult {
            ran_nodes,
            skipped_nodes,
            outputs,
        }
    }
}

/// The patch recorded for a failed stage: narration plus an error event,
/// nothing else, so the stage's target fields keep their prior values.
fn degraded_patch(kind: &NodeKind, step: u64, detail: FaultDetail) -> NodePatch {
    NodePatch::new()
        .with_log(vec![Message::engine(&format!(
            "stage '{kind}' failed at step {step}: {detail}; continuing with unchanged state"
        ))])
        .with_errors(vec![
            ErrorEvent::node(kind.encode(), step, detail).with_tag("degraded"),
        ])
}
