mod common;

use std::sync::atomic::Ordering;

use common::fixtures::{items, scripted_spec};
use vetflow::channels::ReviewSubmission;
use vetflow::flows::{PipelineError, ReviewPipeline};
use vetflow::runtimes::{RunStatus, RunnerError};

#[tokio::test]
async fn test_start_suspends_before_needs_review_with_proposals() {
    let (spec, handles) = scripted_spec(5, 3);
    let mut pipeline = ReviewPipeline::new(spec).await.unwrap();

    let run = pipeline.start().await.unwrap();

    assert!(matches!(run.status, RunStatus::Suspended { .. }));
    assert_eq!(run.frontier.as_deref(), Some("review_needs"));

    let cycle = run.state.review.get();
    assert_eq!(cycle.phase, "needs");
    assert_eq!(cycle.proposed.len(), 6);
    assert_eq!(cycle.iteration, 0);
    assert!(cycle.accepted.is_empty());
    // All three producer fragments were joined before propose ran.
    assert_eq!(run.state.inputs.get().len(), 3);
    assert_eq!(handles.needs_calls.load(Ordering::SeqCst), 1);
    assert_eq!(handles.opportunities_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_partial_accept_suspends_again_with_incremented_iteration() {
    let (spec, handles) = scripted_spec(5, 3);
    let mut pipeline = ReviewPipeline::new(spec).await.unwrap();
    let run = pipeline.start().await.unwrap();
    let session_id = run.session_id.clone();

    let run = pipeline
        .resume(
            &session_id,
            ReviewSubmission::new(
                items(&["Need 1"]),
                items(&["Need 2", "Need 3"]),
                Some("sharpen the scope".into()),
            ),
        )
        .await
        .unwrap();

    // Below threshold: the loop retried propose and parked at review again.
    assert!(matches!(run.status, RunStatus::Suspended { .. }));
    assert_eq!(run.frontier.as_deref(), Some("review_needs"));

    let cycle = run.state.review.get();
    assert_eq!(cycle.accepted.len(), 1);
    assert_eq!(cycle.rejected.len(), 2);
    assert_eq!(cycle.iteration, 1);
    assert_eq!(cycle.feedback.as_deref(), Some("sharpen the scope"));
    assert!(cycle.pending.is_none());
    // Propose ran once at start and once for the retry.
    assert_eq!(handles.needs_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_duplicate_identity_keys_are_idempotent_across_resumes() {
    let (spec, _) = scripted_spec(5, 3);
    let mut pipeline = ReviewPipeline::new(spec).await.unwrap();
    let session_id = pipeline.start().await.unwrap().session_id;

    pipeline
        .resume(
            &session_id,
            ReviewSubmission::new(items(&["Need 1"]), vec![], None),
        )
        .await
        .unwrap();
    let run = pipeline
        .resume(
            &session_id,
            // Same identity under different casing and whitespace.
            ReviewSubmission::new(items(&["NEED  1", "need 1"]), vec![], None),
        )
        .await
        .unwrap();

    let cycle = run.state.review.get();
    assert_eq!(cycle.accepted.len(), 1);
    assert_eq!(cycle.iteration, 2);
}

#[tokio::test]
async fn test_threshold_advances_into_opportunities_phase() {
    let (spec, handles) = scripted_spec(5, 3);
    let mut pipeline = ReviewPipeline::new(spec).await.unwrap();
    let session_id = pipeline.start().await.unwrap().session_id;

    let run = pipeline
        .resume(
            &session_id,
            ReviewSubmission::new(
                items(&["Need 1", "Need 2", "Need 3", "Need 4", "Need 5"]),
                items(&["Need 6"]),
                None,
            ),
        )
        .await
        .unwrap();

    // Needs finalized; now parked at the opportunities review gate.
    assert_eq!(run.frontier.as_deref(), Some("review_opportunities"));
    let cycle = run.state.review.get();
    assert_eq!(cycle.phase, "opportunities");
    assert_eq!(cycle.iteration, 0);
    assert!(cycle.accepted.is_empty());
    assert_eq!(cycle.proposed.len(), 6);

    let outputs = run.state.outputs.get();
    let needs_record = outputs.get("needs").expect("needs output recorded");
    assert_eq!(needs_record["items"].as_array().unwrap().len(), 5);
    assert_eq!(handles.opportunities_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_full_run_to_done_finalizes_both_phases() {
    let (spec, _) = scripted_spec(5, 3);
    let mut pipeline = ReviewPipeline::new(spec).await.unwrap();
    let session_id = pipeline.start().await.unwrap().session_id;

    pipeline
        .resume(
            &session_id,
            ReviewSubmission::new(
                items(&["Need 1", "Need 2", "Need 3", "Need 4", "Need 5"]),
                vec![],
                None,
            ),
        )
        .await
        .unwrap();
    let run = pipeline
        .resume(
            &session_id,
            ReviewSubmission::new(
                items(&[
                    "Opportunity 1",
                    "Opportunity 2",
                    "Opportunity 3",
                    "Opportunity 4",
                    "Opportunity 5",
                ]),
                vec![],
                None,
            ),
        )
        .await
        .unwrap();

    assert_eq!(run.status, RunStatus::Done);
    assert!(run.frontier.is_none());
    let outputs = run.state.outputs.get();
    assert!(outputs.contains_key("needs"));
    assert!(outputs.contains_key("opportunities"));
}

#[tokio::test]
async fn test_exhaustion_below_threshold_never_loops_forever() {
    let (spec, handles) = scripted_spec(5, 3);
    let mut pipeline = ReviewPipeline::new(spec).await.unwrap();
    let session_id = pipeline.start().await.unwrap().session_id;

    // Three cycles, each accepting the same single item: never reaches 5.
    let mut last = None;
    for _ in 0..3 {
        last = Some(
            pipeline
                .resume(
                    &session_id,
                    ReviewSubmission::new(items(&["Need 1"]), vec![], None),
                )
                .await
                .unwrap(),
        );
    }
    let run = last.unwrap();

    assert_eq!(run.status, RunStatus::Exhausted);
    let cycle = run.state.review.get();
    assert!(cycle.exhausted);
    assert_eq!(cycle.iteration, 3);
    assert_eq!(cycle.accepted.len(), 1);
    // Propose ran at start plus two retries; the third review exhausted.
    assert_eq!(handles.needs_calls.load(Ordering::SeqCst), 3);
    assert_eq!(handles.opportunities_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_resume_unknown_session_is_session_not_found() {
    let (spec, _) = scripted_spec(5, 3);
    let mut pipeline = ReviewPipeline::new(spec).await.unwrap();

    let result = pipeline
        .resume("run-never-started", ReviewSubmission::default())
        .await;

    match result {
        Err(PipelineError::Runner(RunnerError::SessionNotFound { session_id })) => {
            assert_eq!(session_id, "run-never-started");
        }
        other => panic!("expected SessionNotFound, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_resume_on_terminal_session_is_idempotent() {
    let (spec, handles) = scripted_spec(5, 3);
    let mut pipeline = ReviewPipeline::new(spec).await.unwrap();
    let session_id = pipeline.start().await.unwrap().session_id;

    pipeline
        .resume(
            &session_id,
            ReviewSubmission::new(
                items(&["Need 1", "Need 2", "Need 3", "Need 4", "Need 5"]),
                vec![],
                None,
            ),
        )
        .await
        .unwrap();
    let done = pipeline
        .resume(
            &session_id,
            ReviewSubmission::new(
                items(&[
                    "Opportunity 1",
                    "Opportunity 2",
                    "Opportunity 3",
                    "Opportunity 4",
                    "Opportunity 5",
                ]),
                vec![],
                None,
            ),
        )
        .await
        .unwrap();
    assert_eq!(done.status, RunStatus::Done);

    let needs_calls = handles.needs_calls.load(Ordering::SeqCst);
    let opportunities_calls = handles.opportunities_calls.load(Ordering::SeqCst);

    // Repeated resumes after the terminal return the same result and run
    // nothing.
    for _ in 0..2 {
        let again = pipeline
            .resume(
                &session_id,
                ReviewSubmission::new(items(&["late extra"]), vec![], None),
            )
            .await
            .unwrap();
        assert_eq!(again.status, RunStatus::Done);
        assert_eq!(
            again.state.outputs.get().len(),
            done.state.outputs.get().len()
        );
    }
    assert_eq!(handles.needs_calls.load(Ordering::SeqCst), needs_calls);
    assert_eq!(
        handles.opportunities_calls.load(Ordering::SeqCst),
        opportunities_calls
    );
}

#[tokio::test]
async fn test_state_introspection_matches_last_result() {
    let (spec, _) = scripted_spec(5, 3);
    let mut pipeline = ReviewPipeline::new(spec).await.unwrap();
    let run = pipeline.start().await.unwrap();

    let state = pipeline.state(&run.session_id).await.unwrap();
    assert_eq!(
        state.review.get().proposed.len(),
        run.state.review.get().proposed.len()
    );
}
