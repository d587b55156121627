//! Thin run-request layer over the compiled pipeline.
//!
//! Owns the compiled graph, the store, and the capability bundle; front ends
//! (HTTP, CLI) live elsewhere and only see these request/response types.

use std::sync::Arc;

use serde_json::json;

use crate::collab::{Capabilities, CollaboratorError, CompletionRequest, DocumentRef, ReasoningTask};
use crate::config::PipelineConfig;
use crate::error::RunError;
use crate::graph::{CompiledGraph, GraphValidationError};
use crate::memory::{RunConfig, StateStore};
use crate::state::{Citation, VerdictState};
use crate::verdict::build_verdict_graph;

/// One pipeline run request.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub query: String,
    /// Continue an existing conversation; a fresh thread id is generated
    /// when absent.
    pub thread_id: Option<String>,
    pub document_reference: Option<DocumentRef>,
}

impl RunRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            thread_id: None,
            document_reference: None,
        }
    }

    pub fn on_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn with_document(mut self, document: DocumentRef) -> Self {
        self.document_reference = Some(document);
        self
    }
}

/// Outcome of a run.
#[derive(Debug, Clone)]
pub struct RunResponse {
    pub status: String,
    pub thread_id: String,
    pub verdict: VerdictReport,
}

/// The user-facing slice of the final state.
#[derive(Debug, Clone)]
pub struct VerdictReport {
    pub final_response: String,
    pub citations: Vec<Citation>,
    pub consistency_score: Option<f64>,
    /// True when classification ruled the query out of domain: a designated
    /// advisory outcome, not a failure.
    pub out_of_domain: bool,
}

impl VerdictReport {
    fn from_state(state: &VerdictState) -> Self {
        Self {
            final_response: state.final_response.clone().unwrap_or_default(),
            citations: state.citations.clone(),
            consistency_score: state.consistency_score,
            out_of_domain: state.intent.as_ref().map_or(false, |i| !i.in_domain),
        }
    }
}

/// Standalone summarisation request, answered outside the graph.
#[derive(Debug, Clone)]
pub struct SummariseRequest {
    pub query: String,
    pub prior_result: String,
}

#[derive(Debug, Clone)]
pub struct SummariseResponse {
    pub status: String,
    pub summary: String,
}

/// Pipeline service: compiles the graph once at startup, runs any number of
/// threads concurrently over it.
pub struct VerdictService {
    graph: CompiledGraph<VerdictState>,
    store: Arc<dyn StateStore<VerdictState>>,
    caps: Capabilities,
    config: PipelineConfig,
}

impl VerdictService {
    /// Builds and validates the pipeline. A malformed graph fails here,
    /// before any request is accepted.
    pub fn new(
        caps: Capabilities,
        store: Arc<dyn StateStore<VerdictState>>,
        config: PipelineConfig,
    ) -> Result<Self, GraphValidationError> {
        let graph =
            build_verdict_graph(caps.clone(), &config).compile_with_store(store.clone())?;
        Ok(Self {
            graph,
            store,
            caps,
            config,
        })
    }

    /// Runs the pipeline for one query, carrying conversation history and
    /// ingested-document state across turns on the same thread.
    pub async fn run(&self, request: RunRequest) -> Result<RunResponse, RunError> {
        let thread_id = request
            .thread_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let mut state = VerdictState::new(
            request.query,
            request.document_reference,
            self.config.max_review_count,
        );
        if let Some(prior) = self.store.load(&thread_id).await? {
            state.messages = prior.state.messages;
            state.document_text = prior.state.document_text;
            state.document_collection = prior.state.document_collection;
            if state.document_reference.is_none() {
                state.document_reference = prior.state.document_reference;
            }
        }

        tracing::info!(thread_id = %thread_id, "running verdict pipeline");
        let final_state = self
            .graph
            .invoke(state, Some(RunConfig::for_thread(thread_id.clone())))
            .await?;

        Ok(RunResponse {
            status: "success".to_string(),
            thread_id,
            verdict: VerdictReport::from_state(&final_state),
        })
    }

    /// Continues a thread whose previous run was interrupted mid-pipeline.
    pub async fn resume(&self, thread_id: impl Into<String>) -> Result<RunResponse, RunError> {
        let thread_id = thread_id.into();
        let final_state = self
            .graph
            .resume(RunConfig::for_thread(thread_id.clone()))
            .await?;
        Ok(RunResponse {
            status: "success".to_string(),
            thread_id,
            verdict: VerdictReport::from_state(&final_state),
        })
    }

    /// Single reasoning call outside the graph: summarise a prior result.
    pub async fn summarise(
        &self,
        request: SummariseRequest,
    ) -> Result<SummariseResponse, CollaboratorError> {
        let completion = self
            .caps
            .reasoner
            .complete(CompletionRequest::new(
                ReasoningTask::SummariseAnalysis,
                json!({
                    "user_query": request.query,
                    "legal_analysis": request.prior_result,
                }),
            ))
            .await?;
        Ok(SummariseResponse {
            status: "success".to_string(),
            summary: completion.into_text(),
        })
    }
}
