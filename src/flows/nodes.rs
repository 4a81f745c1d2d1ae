//! Stage implementations for the discovery pipeline.

use std::sync::Arc;

use async_trait::async_trait;

use super::collaborators::{ProposeContext, Proposer, SourceProducer};
use super::phase::PhaseSpec;
use crate::channels::PhaseStart;
use crate::channels::errors::{ErrorEvent, FaultDetail};
use crate::item::Item;
use crate::message::Message;
use crate::node::{Node, NodeContext, NodeError, NodePatch, ReviewPatch};
use crate::state::StateSnapshot;
use crate::utils::collections::new_input_map;

/// Runs one source producer and stores its fragment under the producer's
/// name. The three producer stages fan out from Start and join at the
/// aggregate barrier.
pub struct ProducerNode {
    name: String,
    producer: Arc<dyn SourceProducer>,
}

impl ProducerNode {
    pub fn new(name: &str, producer: Arc<dyn SourceProducer>) -> Self {
        Self {
            name: name.to_string(),
            producer,
        }
    }
}

#[async_trait]
impl Node for ProducerNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePatch, NodeError> {
        let fragment = self
            .producer
            .collect()
            .await
            .map_err(|e| NodeError::Collaborator {
                who: self.name.clone(),
                message: e.message,
            })?;
        ctx.emit("collect", format!("fragment '{}' collected", self.name))?;

        let mut fragments = new_input_map();
        fragments.insert(self.name.clone(), fragment);
        Ok(NodePatch::new()
            .with_inputs(fragments)
            .with_log(vec![Message::engine(&format!(
                "source fragment '{}' collected",
                self.name
            ))]))
    }
}

/// Join stage after the producer fan-out. By the time this runs, the barrier
/// guarantees every producer branch has completed; missing fragments mean a
/// producer degraded, which is recorded but not fatal.
pub struct AggregateNode {
    expected: Vec<String>,
}

impl AggregateNode {
    pub fn new(expected: Vec<String>) -> Self {
        Self { expected }
    }
}

#[async_trait]
impl Node for AggregateNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePatch, NodeError> {
        let missing: Vec<&String> = self
            .expected
            .iter()
            .filter(|name| !snapshot.inputs.contains_key(*name))
            .collect();
        let present = self.expected.len() - missing.len();

        ctx.emit(
            "aggregate",
            format!("joined {present} of {} source fragments", self.expected.len()),
        )?;

        let mut patch = NodePatch::new().with_log(vec![Message::engine(&format!(
            "aggregated {present} of {} source fragments",
            self.expected.len()
        ))]);
        if !missing.is_empty() {
            patch = patch.with_errors(vec![
                ErrorEvent::node(
                    ctx.node_id.clone(),
                    ctx.step,
                    FaultDetail::msg(format!(
                        "fragments missing after producer fan-out: {}",
                        missing
                            .iter()
                            .map(|s| s.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )),
                )
                .with_tag("aggregate"),
            ]);
        }
        Ok(patch)
    }
}

/// Generates the cycle's candidate items via the phase's propose
/// collaborator. Proposed items replace the previous set wholesale; identity
/// keys are assigned here so downstream unions are well-defined.
pub struct ProposeNode {
    phase: PhaseSpec,
    proposer: Arc<dyn Proposer>,
    carry_from: Option<String>,
}

impl ProposeNode {
    pub fn new(phase: PhaseSpec, proposer: Arc<dyn Proposer>, carry_from: Option<String>) -> Self {
        Self {
            phase,
            proposer,
            carry_from,
        }
    }
}

#[async_trait]
impl Node for ProposeNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePatch, NodeError> {
        let cycle = &snapshot.review;
        let propose_ctx = ProposeContext {
            phase: self.phase.name.clone(),
            iteration: cycle.iteration,
            inputs: snapshot.inputs.clone(),
            feedback: cycle.feedback.clone(),
            accepted: cycle.accepted.clone(),
            carried: self
                .carry_from
                .as_ref()
                .and_then(|phase| snapshot.outputs.get(phase).cloned()),
        };

        let mut items = self
            .proposer
            .propose(propose_ctx)
            .await
            .map_err(|e| NodeError::Collaborator {
                who: format!("proposer:{}", self.phase.name),
                message: e.message,
            })?;
        for item in &mut items {
            item.key = (self.phase.identity)(item);
        }

        ctx.emit(
            "propose",
            format!("{} candidates for phase '{}'", items.len(), self.phase.name),
        )?;

        Ok(NodePatch::new()
            .with_log(vec![Message::proposer(&format!(
                "proposed {} candidates for phase '{}' (cycle {})",
                items.len(),
                self.phase.name,
                cycle.iteration + 1
            ))])
            .with_review(ReviewPatch::new().propose(items)))
    }
}

/// Consumes the reviewer's submission from the inbox.
///
/// Execution always suspends before this stage; a resume call fills the
/// inbox and runs it. Accepted/rejected batches are keyed through the
/// phase's identity extractor and unioned into the accumulators, feedback is
/// replaced, the iteration counter advances, and the inbox is cleared.
pub struct ReviewGateNode {
    phase: PhaseSpec,
}

impl ReviewGateNode {
    pub fn new(phase: PhaseSpec) -> Self {
        Self { phase }
    }
}

#[async_trait]
impl Node for ReviewGateNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePatch, NodeError> {
        let cycle = &snapshot.review;
        let Some(submission) = cycle.pending.clone() else {
            return Err(NodeError::MissingInput {
                what: "review submission",
            });
        };

        let mut accepted = submission.accepted;
        for item in &mut accepted {
            item.key = (self.phase.identity)(item);
        }
        let mut rejected = submission.rejected;
        for item in &mut rejected {
            item.key = (self.phase.identity)(item);
        }

        let iteration = cycle.iteration + 1;
        ctx.emit(
            "review",
            format!(
                "cycle {iteration}: {} accepted, {} rejected",
                accepted.len(),
                rejected.len()
            ),
        )?;

        Ok(NodePatch::new()
            .with_log(vec![Message::reviewer(&format!(
                "cycle {iteration} of phase '{}': accepted {}, rejected {}",
                self.phase.name,
                accepted.len(),
                rejected.len()
            ))])
            .with_review(
                ReviewPatch::new()
                    .accept(accepted)
                    .reject(rejected)
                    .feedback(submission.feedback)
                    .iteration(iteration)
                    .clear_pending(),
            ))
    }
}

/// Records the phase's finalized output (write-once) and, when another phase
/// follows, resets the review cycle for it.
pub struct FinalizeNode {
    phase: PhaseSpec,
    next: Option<PhaseStart>,
}

impl FinalizeNode {
    pub fn new(phase: PhaseSpec, next: Option<PhaseStart>) -> Self {
        Self { phase, next }
    }
}

#[async_trait]
impl Node for FinalizeNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePatch, NodeError> {
        let cycle = &snapshot.review;
        let record = serde_json::json!({
            "phase": cycle.phase,
            "items": serde_json::to_value(&cycle.accepted)?,
            "iterations": cycle.iteration,
        });
        let mut outputs = new_input_map();
        outputs.insert(self.phase.name.clone(), record);

        let mut narration = format!(
            "phase '{}' finalized with {} accepted items",
            self.phase.name,
            cycle.accepted.len()
        );
        let mut review = ReviewPatch::new();
        if let Some(next) = &self.next {
            review = review.begin_phase(&next.phase, next.max_iterations);
            narration.push_str(&format!("; entering phase '{}'", next.phase));
        }
        ctx.emit("finalize", narration.clone())?;

        Ok(NodePatch::new()
            .with_log(vec![Message::engine(&narration)])
            .with_outputs(outputs)
            .with_review(review))
    }
}

/// Terminal stage for a loop that ran out of iterations below its accept
/// threshold. Marks the run exhausted; the runner surfaces that as a
/// non-success terminal status, not an error.
pub struct ExhaustedNode {
    phase: PhaseSpec,
}

impl ExhaustedNode {
    pub fn new(phase: PhaseSpec) -> Self {
        Self { phase }
    }
}

#[async_trait]
impl Node for ExhaustedNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<NodePatch, NodeError> {
        let cycle = &snapshot.review;
        let narration = format!(
            "phase '{}' exhausted after {} cycles with {} of {} required items accepted",
            self.phase.name,
            cycle.iteration,
            cycle.accepted.len(),
            self.phase.accept_threshold
        );
        ctx.emit("exhausted", narration.clone())?;

        Ok(NodePatch::new()
            .with_log(vec![Message::engine(&narration)])
            .with_review(ReviewPatch::new().exhausted()))
    }
}
