//! Assembly of the two-phase discovery graph.

use std::sync::Arc;

use super::collaborators::{Proposer, SourceProducer};
use super::nodes::{
    AggregateNode, ExhaustedNode, FinalizeNode, ProducerNode, ProposeNode, ReviewGateNode,
};
use super::phase::PhaseSpec;
use crate::app::App;
use crate::channels::PhaseStart;
use crate::graphs::{GraphBuilder, GraphCompileError, Router};
use crate::runtimes::RuntimeConfig;
use crate::state::StateSnapshot;
use crate::types::NodeKind;

/// Full configuration of a discovery pipeline instance.
pub struct DiscoverySpec {
    /// Named source producers; all of them fan out from Start and join
    /// before the first propose.
    pub producers: Vec<(String, Arc<dyn SourceProducer>)>,
    /// Phase 1 loop parameters.
    pub needs: PhaseSpec,
    /// Phase 2 loop parameters.
    pub opportunities: PhaseSpec,
    /// Phase 1 propose collaborator.
    pub needs_proposer: Arc<dyn Proposer>,
    /// Phase 2 propose collaborator; sees phase 1's finalized output.
    pub opportunities_proposer: Arc<dyn Proposer>,
    /// Runtime settings for the compiled app.
    pub runtime: RuntimeConfig,
}

/// One propose → review → accept-or-retry loop, wired from a shared
/// template. Adds the loop's four stages, its suspend flag, and the decision
/// router; the caller provides the edge leading into `propose` and (via
/// `next`) where `finalize` goes.
fn add_review_loop(
    mut builder: GraphBuilder,
    phase: &PhaseSpec,
    proposer: Arc<dyn Proposer>,
    carry_from: Option<&PhaseSpec>,
    next: Option<&PhaseSpec>,
) -> GraphBuilder {
    let propose = phase.propose_node();
    let review = phase.review_node();
    let finalize = phase.finalize_node();
    let exhausted = phase.exhausted_node();

    let next_start = next.map(|n| PhaseStart {
        phase: n.name.clone(),
        max_iterations: n.max_iterations,
    });
    let finalize_target = next.map_or(NodeKind::End, PhaseSpec::propose_node);

    // Decision predicate, in policy order: success, then budget, then retry.
    let threshold = phase.accept_threshold;
    let max_iterations = phase.max_iterations;
    let decide = Arc::new(move |snapshot: &StateSnapshot| {
        let cycle = &snapshot.review;
        if cycle.accepted.len() >= threshold {
            "advance".to_string()
        } else if cycle.iteration >= max_iterations {
            "exhausted".to_string()
        } else {
            "retry".to_string()
        }
    });

    builder = builder
        .add_node(
            propose.clone(),
            ProposeNode::new(
                phase.clone(),
                proposer,
                carry_from.map(|p| p.name.clone()),
            ),
        )
        .add_node(review.clone(), ReviewGateNode::new(phase.clone()))
        .add_node(
            finalize.clone(),
            FinalizeNode::new(phase.clone(), next_start),
        )
        .add_node(exhausted.clone(), ExhaustedNode::new(phase.clone()))
        .add_edge(propose.clone(), review.clone())
        .add_edge(finalize.clone(), finalize_target)
        .add_edge(exhausted, NodeKind::End)
        .suspend_before(review.clone())
        .add_router(Router::new(
            review,
            decide,
            [
                ("advance", finalize),
                ("retry", propose),
                ("exhausted", phase.exhausted_node()),
            ],
        ));

    builder
}

/// Builds and validates the full two-phase discovery graph.
pub fn discovery_graph(spec: &DiscoverySpec) -> Result<App, GraphCompileError> {
    let aggregate = NodeKind::stage("aggregate");
    let mut builder = GraphBuilder::new().with_runtime_config(spec.runtime.clone());

    let mut fragment_names = Vec::with_capacity(spec.producers.len());
    for (name, producer) in &spec.producers {
        let collect = NodeKind::stage(format!("collect_{name}"));
        builder = builder
            .add_node(collect.clone(), ProducerNode::new(name, producer.clone()))
            .add_edge(NodeKind::Start, collect.clone())
            .add_edge(collect, aggregate.clone());
        fragment_names.push(name.clone());
    }
    builder = builder
        .add_node(aggregate.clone(), AggregateNode::new(fragment_names))
        .add_edge(aggregate, spec.needs.propose_node());

    builder = add_review_loop(
        builder,
        &spec.needs,
        spec.needs_proposer.clone(),
        None,
        Some(&spec.opportunities),
    );
    builder = add_review_loop(
        builder,
        &spec.opportunities,
        spec.opportunities_proposer.clone(),
        Some(&spec.needs),
        None,
    );

    builder.compile()
}
