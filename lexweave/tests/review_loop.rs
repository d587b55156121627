//! Integration tests: the bounded review loop.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use lexweave::collab::{
    CollaboratorError, Completion, CompletionRequest, MockReasoner, Reasoner, ReasoningTask,
};
use lexweave::memory::{MemoryStore, StateStore};
use lexweave::{PipelineConfig, RunRequest, VerdictService, VerdictState};

use common::mock_caps_with_reasoner;

/// Reasoner whose audit confidence is scripted per call; everything else
/// delegates to the in-domain defaults.
struct ScriptedAuditReasoner {
    inner: MockReasoner,
    confidences: Vec<u64>,
    audit_calls: AtomicUsize,
}

impl ScriptedAuditReasoner {
    fn new(confidences: Vec<u64>) -> Self {
        Self {
            inner: MockReasoner::in_domain_defaults(),
            confidences,
            audit_calls: AtomicUsize::new(0),
        }
    }

    fn audit_calls(&self) -> usize {
        self.audit_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Reasoner for ScriptedAuditReasoner {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CollaboratorError> {
        if request.task == ReasoningTask::AuditConsistency {
            let call = self.audit_calls.fetch_add(1, Ordering::SeqCst);
            let confidence = self
                .confidences
                .get(call)
                .or(self.confidences.last())
                .copied()
                .unwrap_or(90);
            return Ok(Completion::Structured(json!({
                "contradiction_score": 0,
                "confidence": confidence,
            })));
        }
        self.inner.complete(request).await
    }
}

/// **Scenario C**: the first audit comes back at confidence 40 (< 50):
/// needs_review is set, review_count increments by one, and control returns
/// to the retrieval stage before the run eventually finalizes.
#[tokio::test]
async fn low_confidence_replays_retrieval_once() {
    let reasoner = Arc::new(ScriptedAuditReasoner::new(vec![40, 90]));
    let (caps, mocks) = mock_caps_with_reasoner(reasoner.clone());
    let store = Arc::new(MemoryStore::<VerdictState>::new());
    let service =
        VerdictService::new(caps, store.clone(), PipelineConfig::default()).expect("validates");

    let response = service
        .run(RunRequest::new("Is this clause enforceable?"))
        .await
        .unwrap();

    assert_eq!(reasoner.audit_calls(), 2, "initial pass plus one retry");
    // Two retrieval passes, each issuing query + one analysis unit.
    assert_eq!(mocks.retriever.queries().len(), 4);

    let last = store.load(&response.thread_id).await.unwrap().unwrap();
    assert_eq!(last.state.review_count, 1);
    assert_eq!(last.state.consistency_score, Some(90.0));
    assert!(last.state.final_response.is_some());

    // The log shows the loop re-entering retrieval after the first audit.
    let names: Vec<String> = store
        .list(&response.thread_id)
        .await
        .unwrap()
        .into_iter()
        .map(|cp| cp.step_name)
        .collect();
    let retrievals = names.iter().filter(|n| *n == "retrieve_passages").count();
    assert_eq!(retrievals, 2);
}

/// **Scenario**: an audit that always demands review terminates at the
/// bound: with max_review_count = 2 the retry region runs exactly three
/// times (initial + 2 retries), review_count ends at 2, and the run
/// force-proceeds to a final response.
#[tokio::test]
async fn always_flagging_audit_force_proceeds_at_bound() {
    let reasoner = Arc::new(ScriptedAuditReasoner::new(vec![40]));
    let (caps, mocks) = mock_caps_with_reasoner(reasoner.clone());
    let store = Arc::new(MemoryStore::<VerdictState>::new());
    let service =
        VerdictService::new(caps, store.clone(), PipelineConfig::default()).expect("validates");

    let response = service
        .run(RunRequest::new("Is this clause enforceable?"))
        .await
        .unwrap();

    assert_eq!(reasoner.audit_calls(), 3, "initial + 2 retries, then forced");
    assert_eq!(mocks.retriever.queries().len(), 6, "three retrieval passes");

    let last = store.load(&response.thread_id).await.unwrap().unwrap();
    assert_eq!(last.state.review_count, 2, "bounded by max_review_count");
    assert!(last.state.needs_review, "still flagged, proceeded anyway");
    assert!(last.state.final_response.is_some());
    assert_eq!(last.step_name, "finalize_response");
}
