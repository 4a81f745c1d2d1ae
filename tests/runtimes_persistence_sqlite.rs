#![cfg(feature = "sqlite")]

use serde_json::json;
use vetflow::item::Item;
use vetflow::runtimes::{Checkpoint, Checkpointer, SessionState, SqliteCheckpointer};
use vetflow::state::WorkflowState;
use vetflow::types::NodeKind;

fn sample_session() -> SessionState {
    let mut state = WorkflowState::for_phase("needs", 3);
    state.add_input("interviews", json!("transcript"));
    state.add_log_entry("engine", "collected interview fragment");
    state.review.get_mut().accepted.push(Item::new("Theme A"));
    SessionState {
        state,
        step: 4,
        frontier: vec![NodeKind::stage("review_needs")],
    }
}

async fn temp_store(dir: &tempfile::TempDir) -> SqliteCheckpointer {
    let db = dir.path().join("checkpoints.db");
    SqliteCheckpointer::connect(&db.to_string_lossy())
        .await
        .expect("sqlite connect")
}

#[tokio::test]
async fn test_save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir).await;
    let session = sample_session();

    store
        .save(Checkpoint::from_session("sess-1", &session))
        .await
        .unwrap();

    let loaded = store.load_latest("sess-1").await.unwrap().unwrap();
    assert_eq!(loaded.step, 4);
    assert_eq!(loaded.frontier, vec![NodeKind::stage("review_needs")]);
    assert_eq!(loaded.state, session.state);
}

#[tokio::test]
async fn test_save_replaces_previous_checkpoint() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir).await;
    let mut session = sample_session();

    store
        .save(Checkpoint::from_session("sess-1", &session))
        .await
        .unwrap();
    session.step = 9;
    session.frontier = vec![NodeKind::End];
    store
        .save(Checkpoint::from_session("sess-1", &session))
        .await
        .unwrap();

    let loaded = store.load_latest("sess-1").await.unwrap().unwrap();
    assert_eq!(loaded.step, 9);
    assert_eq!(loaded.frontier, vec![NodeKind::End]);
}

#[tokio::test]
async fn test_clear_and_list() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir).await;
    let session = sample_session();

    store
        .save(Checkpoint::from_session("alpha", &session))
        .await
        .unwrap();
    store
        .save(Checkpoint::from_session("beta", &session))
        .await
        .unwrap();
    assert_eq!(store.list_sessions().await.unwrap(), vec!["alpha", "beta"]);

    store.clear("alpha").await.unwrap();
    assert!(store.load_latest("alpha").await.unwrap().is_none());
    assert_eq!(store.list_sessions().await.unwrap(), vec!["beta"]);
}

#[tokio::test]
async fn test_missing_session_loads_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir).await;
    assert!(store.load_latest("ghost").await.unwrap().is_none());
}
