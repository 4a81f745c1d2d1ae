mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::fixtures::{FailingProducer, items, scripted_spec_with_producers, standard_producers};
use vetflow::channels::{Channel, ReviewSubmission};
use vetflow::flows::{ReviewPipeline, SourceProducer, discovery_graph};
use vetflow::graphs::GraphBuilder;
use vetflow::message::Message;
use vetflow::node::{Node, NodeContext, NodeError, NodePatch};
use vetflow::runtimes::{CheckpointerType, RunStatus, SessionInit, WorkflowRunner};
use vetflow::state::{StateSnapshot, WorkflowState};
use vetflow::types::NodeKind;

struct Announce(&'static str);

#[async_trait]
impl Node for Announce {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePatch, NodeError> {
        Ok(NodePatch::new().with_log(vec![Message::engine(self.0)]))
    }
}

struct Failing;

#[async_trait]
impl Node for Failing {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<NodePatch, NodeError> {
        Err(NodeError::ValidationFailed("bad input".into()))
    }
}

#[tokio::test]
async fn test_linear_run_reaches_done() {
    let app = GraphBuilder::new()
        .add_node(NodeKind::stage("first"), Announce("first ran"))
        .add_node(NodeKind::stage("second"), Announce("second ran"))
        .add_edge(NodeKind::Start, NodeKind::stage("first"))
        .add_edge(NodeKind::stage("first"), NodeKind::stage("second"))
        .add_edge(NodeKind::stage("second"), NodeKind::End)
        .compile()
        .unwrap();

    let mut runner = WorkflowRunner::new(app, CheckpointerType::InMemory).await;
    let init = runner
        .create_session("lin-1".to_string(), WorkflowState::default())
        .await
        .unwrap();
    assert_eq!(init, SessionInit::Fresh);

    let outcome = runner.run_until_settled("lin-1").await.unwrap();
    assert_eq!(outcome.status, RunStatus::Done);
    let log = outcome.state.log.snapshot();
    let texts: Vec<_> = log.iter().map(|m| m.content.as_str()).collect();
    assert!(texts.contains(&"first ran"));
    assert!(texts.contains(&"second ran"));
}

#[tokio::test]
async fn test_failing_stage_degrades_and_run_still_completes() {
    let app = GraphBuilder::new()
        .add_node(NodeKind::stage("broken"), Failing)
        .add_node(NodeKind::stage("after"), Announce("after ran"))
        .add_edge(NodeKind::Start, NodeKind::stage("broken"))
        .add_edge(NodeKind::stage("broken"), NodeKind::stage("after"))
        .add_edge(NodeKind::stage("after"), NodeKind::End)
        .compile()
        .unwrap();

    let mut runner = WorkflowRunner::new(app, CheckpointerType::InMemory).await;
    runner
        .create_session("deg-1".to_string(), WorkflowState::default())
        .await
        .unwrap();

    let outcome = runner.run_until_settled("deg-1").await.unwrap();
    // The failure never aborted the session; downstream ran.
    assert_eq!(outcome.status, RunStatus::Done);
    assert!(!outcome.state.errors.snapshot().is_empty());
    assert!(
        outcome
            .state
            .log
            .snapshot()
            .iter()
            .any(|m| m.content == "after ran")
    );
}

#[tokio::test]
async fn test_degraded_producer_leaves_other_fragments_intact() {
    let mut producers = standard_producers([0, 0, 0]);
    producers[1] = (
        "workshops".to_string(),
        Arc::new(FailingProducer) as Arc<dyn SourceProducer>,
    );
    let (spec, _) = scripted_spec_with_producers(5, 3, producers);
    let mut pipeline = ReviewPipeline::new(spec).await.unwrap();

    let run = pipeline.start().await.unwrap();

    // The run still reached the review gate; the two healthy fragments are
    // present and the failure is on record.
    assert!(matches!(run.status, RunStatus::Suspended { .. }));
    let inputs = run.state.inputs.get();
    assert!(inputs.contains_key("interviews"));
    assert!(inputs.contains_key("artifacts"));
    assert!(!inputs.contains_key("workshops"));
    assert!(!run.state.errors.snapshot().is_empty());
}

#[tokio::test]
async fn test_join_waits_for_every_producer_branch() {
    // Scramble completion order across runs; the aggregate barrier must see
    // all three fragments every time.
    for delays in [[40, 0, 20], [0, 40, 20], [20, 40, 0], [0, 0, 40]] {
        let (spec, _) = scripted_spec_with_producers(5, 3, standard_producers(delays));
        let mut pipeline = ReviewPipeline::new(spec).await.unwrap();
        let run = pipeline.start().await.unwrap();

        assert_eq!(run.state.inputs.get().len(), 3, "delays: {delays:?}");
        assert!(
            run.state
                .log
                .snapshot()
                .iter()
                .any(|m| m.content == "aggregated 3 of 3 source fragments"),
            "delays: {delays:?}"
        );
    }
}

#[cfg(feature = "sqlite")]
mod durable {
    use super::*;
    use vetflow::runtimes::RuntimeConfig;

    /// Suspend with one runner, resume with a fresh one sharing only the
    /// SQLite file: everything needed must live in the checkpoint store.
    #[tokio::test]
    async fn test_resume_across_runner_restart() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("checkpoints.db");
        let runtime = RuntimeConfig::new(
            Some("restart-1".to_string()),
            Some(CheckpointerType::Sqlite),
            Some(db_path.to_string_lossy().into_owned()),
        );

        let (mut spec, _) = scripted_spec_with_producers(5, 3, standard_producers([0, 0, 0]));
        spec.runtime = runtime;
        let app = discovery_graph(&spec).unwrap();

        let suspended_state = {
            let mut runner = WorkflowRunner::new(app.clone(), CheckpointerType::Sqlite).await;
            runner
                .create_session(
                    "restart-1".to_string(),
                    WorkflowState::for_phase("needs", 3),
                )
                .await
                .unwrap();
            let outcome = runner.run_until_settled("restart-1").await.unwrap();
            assert!(matches!(outcome.status, RunStatus::Suspended { .. }));
            outcome.state
        };

        // New runner, no in-memory sessions: must restore from SQLite.
        let mut runner = WorkflowRunner::new(app, CheckpointerType::Sqlite).await;
        let outcome = runner
            .resume_session(
                "restart-1",
                ReviewSubmission::new(items(&["Need 1"]), vec![], None),
            )
            .await
            .unwrap();

        let cycle = outcome.state.review.get();
        assert_eq!(cycle.iteration, 1);
        assert_eq!(cycle.accepted.len(), 1);
        assert_eq!(
            suspended_state.review.get().proposed.len(),
            6,
            "suspended checkpoint carried the proposals"
        );
    }
}
