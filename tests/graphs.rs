use std::sync::Arc;

use async_trait::async_trait;
use vetflow::graphs::{GraphBuilder, GraphCompileError, Router};
use vetflow::node::{Node, NodeContext, NodeError, NodePatch};
use vetflow::reducers::ReducerRegistry;
use vetflow::state::StateSnapshot;
use vetflow::types::NodeKind;

struct Noop;

#[async_trait]
impl Node for Noop {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePatch, NodeError> {
        Ok(NodePatch::default())
    }
}

fn linear() -> GraphBuilder {
    GraphBuilder::new()
        .add_node(NodeKind::stage("work"), Noop)
        .add_edge(NodeKind::Start, NodeKind::stage("work"))
        .add_edge(NodeKind::stage("work"), NodeKind::End)
}

#[test]
fn test_valid_graph_compiles() {
    let app = linear().compile().expect("valid graph");
    assert_eq!(app.nodes().len(), 1);
    assert!(app.edges().contains_key(&NodeKind::Start));
}

#[test]
fn test_missing_entry_edges_rejected() {
    let result = GraphBuilder::new()
        .add_node(NodeKind::stage("orphan"), Noop)
        .add_edge(NodeKind::stage("orphan"), NodeKind::End)
        .compile();
    assert!(matches!(result, Err(GraphCompileError::NoEntryEdges)));
}

#[test]
fn test_edge_to_unknown_stage_rejected() {
    let result = linear()
        .add_edge(NodeKind::stage("work"), NodeKind::stage("ghost"))
        .compile();
    assert!(matches!(
        result,
        Err(GraphCompileError::UnknownEdgeTarget { to, .. }) if to == NodeKind::stage("ghost")
    ));
}

#[test]
fn test_edge_from_unknown_stage_rejected() {
    let result = linear()
        .add_edge(NodeKind::stage("ghost"), NodeKind::End)
        .compile();
    assert!(matches!(
        result,
        Err(GraphCompileError::UnknownEdgeSource { from }) if from == NodeKind::stage("ghost")
    ));
}

#[test]
fn test_router_label_with_unknown_target_rejected() {
    let result = linear()
        .add_router(Router::new(
            NodeKind::stage("work"),
            Arc::new(|_| "onward".to_string()),
            [("onward", NodeKind::stage("nowhere"))],
        ))
        .compile();
    assert!(matches!(
        result,
        Err(GraphCompileError::UnknownRouteTarget { label, .. }) if label == "onward"
    ));
}

#[test]
fn test_router_on_unknown_stage_rejected() {
    let result = linear()
        .add_router(Router::new(
            NodeKind::stage("ghost"),
            Arc::new(|_| "onward".to_string()),
            [("onward", NodeKind::End)],
        ))
        .compile();
    assert!(matches!(
        result,
        Err(GraphCompileError::UnknownRouteSource { from }) if from == NodeKind::stage("ghost")
    ));
}

#[test]
fn test_suspend_flag_on_unknown_stage_rejected() {
    let result = linear()
        .suspend_before(NodeKind::stage("ghost"))
        .compile();
    assert!(matches!(
        result,
        Err(GraphCompileError::UnknownSuspendNode { node }) if node == NodeKind::stage("ghost")
    ));
}

#[test]
fn test_missing_reducer_rejected() {
    let result = linear()
        .with_reducers(ReducerRegistry::new())
        .compile();
    assert!(matches!(
        result,
        Err(GraphCompileError::MissingReducer { .. })
    ));
}

#[test]
fn test_router_to_end_is_valid() {
    let app = linear()
        .add_router(Router::new(
            NodeKind::stage("work"),
            Arc::new(|_| "stop".to_string()),
            [("stop", NodeKind::End)],
        ))
        .compile();
    assert!(app.is_ok());
}
