//! Mock collaborators for tests and examples.
//!
//! Each mock returns canned responses, can be told to fail, and records the
//! calls it received so tests can assert which stages actually ran.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{
    CollaboratorError, Completion, CompletionRequest, DocumentRef, Indexer, Passage, PassageMeta,
    Reasoner, ReasoningTask, Retriever, SearchHit, WebSearch,
};

/// Mock reasoner: per-task canned completions plus per-task failure injection.
///
/// Tasks with no canned response fall back to an empty structured object, so
/// a partially configured mock still drives the whole pipeline.
pub struct MockReasoner {
    responses: Mutex<HashMap<ReasoningTask, Completion>>,
    failing: Mutex<Vec<ReasoningTask>>,
    calls: Mutex<Vec<ReasoningTask>>,
}

impl MockReasoner {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            failing: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Canned in-domain classification: everything needed, query passed
    /// through, plus text responses for the synthesis/summary tasks.
    pub fn in_domain_defaults() -> Self {
        let mock = Self::new();
        mock.set(
            ReasoningTask::DecomposeQuery,
            Completion::Structured(json!({
                "in_domain": true,
                "intent": "general",
                "optimised_query": "optimised query",
                "actions_needed": [
                    "compliance_validator",
                    "precedent_matcher",
                    "risk_assessor",
                    "consistency_auditor"
                ],
                "analysis_units": ["optimised query"]
            })),
        );
        mock.set(
            ReasoningTask::ValidateCompliance,
            Completion::Structured(json!({
                "doctrinal_summary": "One non-compliant clause.",
                "loophole_summary": "One termination loophole.",
                "findings": [{
                    "clause": "Clause 4",
                    "status": "non_compliant",
                    "loophole": {"kind": "termination", "description": "unbounded notice"}
                }]
            })),
        );
        mock.set(
            ReasoningTask::MatchPrecedents,
            Completion::Structured(json!({
                "matches": [
                    {"case_name": "A v B", "relevance": "high", "summary": "on point"},
                    {"case_name": "C v D", "relevance": "medium", "summary": "related"}
                ]
            })),
        );
        mock.set(
            ReasoningTask::AssessRisk,
            Completion::Structured(json!({
                "risk_assessment": {"overall_risk": "medium", "score": 5, "rationale": "issues found"},
                "remediation_suggestions": ["tighten the notice period"]
            })),
        );
        mock.set(
            ReasoningTask::SynthesizeVerdict,
            Completion::Text("Draft verdict grounded in retrieved provisions.".to_string()),
        );
        mock.set(
            ReasoningTask::AuditConsistency,
            Completion::Structured(json!({"contradiction_score": 10, "confidence": 90})),
        );
        mock.set(
            ReasoningTask::SummariseVerdict,
            Completion::Text("Verdict summary.".to_string()),
        );
        mock.set(
            ReasoningTask::SummariseHistory,
            Completion::Text("History summary.".to_string()),
        );
        mock.set(
            ReasoningTask::SummariseAnalysis,
            Completion::Text("Analysis summary.".to_string()),
        );
        mock
    }

    /// Sets or replaces the canned completion for one task.
    pub fn set(&self, task: ReasoningTask, completion: Completion) {
        self.responses.lock().unwrap().insert(task, completion);
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(self, task: ReasoningTask, completion: Completion) -> Self {
        self.set(task, completion);
        self
    }

    /// Makes the given task fail with a Reasoning error.
    pub fn with_failure(self, task: ReasoningTask) -> Self {
        self.failing.lock().unwrap().push(task);
        self
    }

    /// Tasks invoked so far, in call order.
    pub fn calls(&self) -> Vec<ReasoningTask> {
        self.calls.lock().unwrap().clone()
    }

    /// How many times the given task was invoked.
    pub fn call_count(&self, task: ReasoningTask) -> usize {
        self.calls.lock().unwrap().iter().filter(|t| **t == task).count()
    }
}

impl Default for MockReasoner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Reasoner for MockReasoner {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CollaboratorError> {
        self.calls.lock().unwrap().push(request.task);
        if self.failing.lock().unwrap().contains(&request.task) {
            return Err(CollaboratorError::Reasoning(format!(
                "mock failure for {:?}",
                request.task
            )));
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&request.task)
            .cloned()
            .unwrap_or(Completion::Structured(Value::Object(Default::default()))))
    }
}

/// Mock retriever: fixed passage list, returned for every query; records
/// queries so tests can assert the retrieval stage ran (or did not).
pub struct MockRetriever {
    passages: Vec<Passage>,
    fail: bool,
    queries: Mutex<Vec<String>>,
}

impl MockRetriever {
    pub fn with_passages(passages: Vec<Passage>) -> Self {
        Self {
            passages,
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// One statute passage and one case passage, enough for the full pipeline.
    pub fn statute_and_case() -> Self {
        Self::with_passages(vec![
            Passage {
                content: "A party may terminate with reasonable notice.".to_string(),
                metadata: PassageMeta {
                    source: "contracts-act".to_string(),
                    section: Some("s. 12".to_string()),
                    case_name: None,
                },
                score: 0.92,
            },
            Passage {
                content: "Notice of two weeks was held unreasonable.".to_string(),
                metadata: PassageMeta {
                    source: "case-reports".to_string(),
                    section: None,
                    case_name: Some("A v B".to_string()),
                },
                score: 0.85,
            },
        ])
    }

    /// Makes every retrieve call fail with a Retrieval error.
    pub fn failing() -> Self {
        Self {
            passages: Vec::new(),
            fail: true,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Queries received so far, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn retrieve(
        &self,
        query: &str,
        k: usize,
        _relevance_threshold: f32,
    ) -> Result<Vec<Passage>, CollaboratorError> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            return Err(CollaboratorError::Retrieval("mock retrieval down".to_string()));
        }
        Ok(self.passages.iter().take(k).cloned().collect())
    }
}

/// Mock indexer: fixed collection handle, counts invocations.
pub struct MockIndexer {
    collection: String,
    calls: Mutex<usize>,
}

impl MockIndexer {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Indexer for MockIndexer {
    async fn index(&self, _document: &DocumentRef) -> Result<String, CollaboratorError> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.collection.clone())
    }
}

/// Mock web search: fixed hits, records queries.
pub struct MockSearch {
    hits: Vec<SearchHit>,
    queries: Mutex<Vec<String>>,
}

impl MockSearch {
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::with_hits(Vec::new())
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearch for MockSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, CollaboratorError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.hits.clone())
    }
}
