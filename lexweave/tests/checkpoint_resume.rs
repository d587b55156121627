//! Integration tests: checkpoint durability and resumption.

mod common;

use std::sync::Arc;

use lexweave::memory::{MemoryStore, SqliteStore, StateStore};
use lexweave::verdict::{CONSISTENCY_AUDITOR, PRECEDENT_MATCHER, RETRIEVE_PASSAGES};
use lexweave::{PipelineConfig, RunRequest, VerdictService, VerdictState};

use common::mock_caps;

/// State as it stands right after the retrieval stage checkpointed.
fn mid_run_state() -> VerdictState {
    VerdictState {
        input_query: "Is this clause enforceable?".to_string(),
        user_query: "optimised query".to_string(),
        actions_needed: vec![
            "compliance_validator".to_string(),
            PRECEDENT_MATCHER.to_string(),
            "risk_assessor".to_string(),
            CONSISTENCY_AUDITOR.to_string(),
        ],
        analysis_units: vec!["optimised query".to_string()],
        retrieved_passages: Vec::new(),
        max_review_count: 2,
        current_step: Some(RETRIEVE_PASSAGES.to_string()),
        ..Default::default()
    }
}

/// **Scenario**: resuming a thread that died after retrieval continues from
/// the recorded step: classification never re-runs, the analysis region and
/// everything downstream does, and the run finalizes.
#[tokio::test]
async fn resume_continues_after_crash_point() {
    let (caps, mocks) = mock_caps();
    let store = Arc::new(MemoryStore::<VerdictState>::new());
    store
        .append("t-crash", RETRIEVE_PASSAGES, &mid_run_state())
        .await
        .unwrap();

    let service =
        VerdictService::new(caps, store.clone(), PipelineConfig::default()).expect("validates");
    let response = service.resume("t-crash").await.unwrap();

    assert_eq!(response.thread_id, "t-crash");
    assert!(!response.verdict.final_response.is_empty());
    assert_eq!(
        mocks
            .reasoner
            .call_count(lexweave::collab::ReasoningTask::DecomposeQuery),
        0,
        "resume must not replay the entry stages"
    );
    assert_eq!(
        mocks
            .reasoner
            .call_count(lexweave::collab::ReasoningTask::SynthesizeVerdict),
        1
    );

    let last = store.load("t-crash").await.unwrap().unwrap();
    assert_eq!(last.step_name, "finalize_response");
    assert!(last.state.parallel_join_complete);
}

/// **Scenario**: resuming a thread whose run already finished returns the
/// recorded state without executing anything.
#[tokio::test]
async fn resume_of_finished_run_is_a_noop() {
    let (caps, mocks) = mock_caps();
    let store = Arc::new(MemoryStore::<VerdictState>::new());
    let service =
        VerdictService::new(caps, store.clone(), PipelineConfig::default()).expect("validates");

    let first = service
        .run(RunRequest::new("Is this clause enforceable?").on_thread("t-done"))
        .await
        .unwrap();
    let calls_after_run = mocks.reasoner.calls().len();

    let resumed = service.resume("t-done").await.unwrap();
    assert_eq!(
        resumed.verdict.final_response,
        first.verdict.final_response
    );
    assert_eq!(
        mocks.reasoner.calls().len(),
        calls_after_run,
        "no step executed on resume of a finished run"
    );
}

/// **Scenario**: checkpoints written through the SQLite store survive a
/// simulated process restart: a new store instance over the same file sees
/// an equivalent snapshot, and a second turn carries the conversation.
#[tokio::test]
async fn sqlite_store_survives_restart_and_carries_history() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("checkpoints.sqlite");
    let thread_id;
    let first_response;

    {
        let (caps, _mocks) = mock_caps();
        let store = Arc::new(SqliteStore::new(&db_path).expect("store opens"));
        let service =
            VerdictService::new(caps, store, PipelineConfig::default()).expect("validates");
        let response = service
            .run(RunRequest::new("Is this clause enforceable?"))
            .await
            .unwrap();
        thread_id = response.thread_id.clone();
        first_response = response.verdict.final_response.clone();
    }

    // "Restart": fresh store and service over the same database file.
    let (caps, _mocks) = mock_caps();
    let store = Arc::new(SqliteStore::new(&db_path).expect("store reopens"));

    let recovered: Option<lexweave::Checkpoint<VerdictState>> =
        store.load(&thread_id).await.unwrap();
    let recovered = recovered.expect("snapshot survived the restart");
    assert_eq!(recovered.step_name, "finalize_response");
    assert_eq!(
        recovered.state.final_response.as_deref(),
        Some(first_response.as_str())
    );
    assert_eq!(recovered.state.messages.len(), 2);

    let service = VerdictService::new(caps, store.clone(), PipelineConfig::default())
        .expect("validates");
    let second = service
        .run(RunRequest::new("And what about verbal agreements?").on_thread(thread_id.clone()))
        .await
        .unwrap();
    assert_eq!(second.thread_id, thread_id);

    let last: lexweave::Checkpoint<VerdictState> =
        store.load(&thread_id).await.unwrap().unwrap();
    assert_eq!(
        last.state.messages.len(),
        4,
        "history carried across the restart and grown by one turn"
    );
}
