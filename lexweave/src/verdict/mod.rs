//! The verdict pipeline: ten steps wired into a reviewed, parallel graph.
//!
//! Shape: ingest → decompose → (early exit | retrieve) → fan-out
//! {compliance → risk, precedent} → join gate (self-loop barrier) →
//! synthesize → audit → (proceed | retry → retrieve | force_proceed) →
//! finalize → END.

mod audit;
mod compliance;
mod decompose;
mod finalize;
mod ingest;
mod join_gate;
mod precedent;
mod retrieve;
mod risk;
mod synthesize;

pub use audit::{route_after_audit, AuditStep};
pub use compliance::ComplianceStep;
pub use decompose::{route_after_decompose, DecomposeStep};
pub use finalize::FinalizeStep;
pub use ingest::IngestStep;
pub use join_gate::{route_after_join, JoinGateStep};
pub use precedent::PrecedentStep;
pub use retrieve::RetrieveStep;
pub use risk::RiskStep;
pub use synthesize::SynthesizeStep;

use std::collections::HashMap;
use std::sync::Arc;

use crate::collab::Capabilities;
use crate::config::PipelineConfig;
use crate::graph::{GraphDefinition, END, START};
use crate::state::VerdictState;

pub const INGEST_DOCUMENT: &str = "ingest_document";
pub const DECOMPOSE_QUERY: &str = "decompose_query";
pub const RETRIEVE_PASSAGES: &str = "retrieve_passages";
pub const COMPLIANCE_VALIDATOR: &str = "compliance_validator";
pub const PRECEDENT_MATCHER: &str = "precedent_matcher";
pub const RISK_ASSESSOR: &str = "risk_assessor";
pub const PARALLEL_JOIN_GATE: &str = "parallel_join_gate";
pub const SYNTHESIZE_VERDICT: &str = "synthesize_verdict";
pub const CONSISTENCY_AUDITOR: &str = "consistency_auditor";
pub const FINALIZE_RESPONSE: &str = "finalize_response";

/// Steps gated by the needed-actions plan; the decompose fallback enables all
/// of them.
pub const ALL_ANALYSIS_STEPS: [&str; 4] = [
    COMPLIANCE_VALIDATOR,
    PRECEDENT_MATCHER,
    RISK_ASSESSOR,
    CONSISTENCY_AUDITOR,
];

/// Wires the verdict pipeline. Compile the result (usually with a store) to
/// get the executor.
pub fn build_verdict_graph(
    caps: Capabilities,
    config: &PipelineConfig,
) -> GraphDefinition<VerdictState> {
    let mut graph = GraphDefinition::new();

    graph
        .add_step(Arc::new(IngestStep::new(caps.clone())))
        .add_step(Arc::new(DecomposeStep::new(caps.clone())))
        .add_step(Arc::new(RetrieveStep::new(
            caps.clone(),
            config.retrieval_k,
            config.relevance_threshold,
        )))
        .add_step(Arc::new(ComplianceStep::new(caps.clone())))
        .add_step(Arc::new(PrecedentStep::new(caps.clone())))
        .add_step(Arc::new(RiskStep::new(caps.clone())))
        .add_step(Arc::new(JoinGateStep::new()))
        .add_step(Arc::new(SynthesizeStep::new(caps.clone())))
        .add_step(Arc::new(AuditStep::new(caps.clone())))
        .add_step(Arc::new(FinalizeStep::new(caps, config.history_limit)));

    graph
        .add_edge(START, INGEST_DOCUMENT)
        .add_edge(INGEST_DOCUMENT, DECOMPOSE_QUERY);

    // Early exit for out-of-domain queries.
    graph.add_conditional_edges(
        DECOMPOSE_QUERY,
        Arc::new(route_after_decompose),
        path_map([("continue", RETRIEVE_PASSAGES), ("end", END)]),
    );

    // Parallel fan-out over the analysis branches.
    graph
        .add_edge(RETRIEVE_PASSAGES, COMPLIANCE_VALIDATOR)
        .add_edge(RETRIEVE_PASSAGES, PRECEDENT_MATCHER)
        .add_edge(COMPLIANCE_VALIDATOR, RISK_ASSESSOR)
        .add_edge(RISK_ASSESSOR, PARALLEL_JOIN_GATE)
        .add_edge(PRECEDENT_MATCHER, PARALLEL_JOIN_GATE);

    // Flag-based barrier: the gate re-queues itself until all branches land.
    graph.add_conditional_edges(
        PARALLEL_JOIN_GATE,
        Arc::new(route_after_join),
        path_map([
            ("continue", SYNTHESIZE_VERDICT),
            ("wait", PARALLEL_JOIN_GATE),
        ]),
    );

    graph.add_edge(SYNTHESIZE_VERDICT, CONSISTENCY_AUDITOR);

    // Bounded review loop back into the retrieval stage.
    graph.add_conditional_edges(
        CONSISTENCY_AUDITOR,
        Arc::new(route_after_audit),
        path_map([
            ("retry", RETRIEVE_PASSAGES),
            ("proceed", FINALIZE_RESPONSE),
            ("force_proceed", FINALIZE_RESPONSE),
        ]),
    );

    graph.add_edge(FINALIZE_RESPONSE, END);

    graph
}

fn path_map<const N: usize>(entries: [(&str, &str); N]) -> HashMap<String, String> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::collab::{MockIndexer, MockReasoner, MockRetriever, MockSearch, SearchHit};
    use crate::memory::MemoryStore;

    /// Handles onto the mocks behind a `Capabilities` bundle, kept for
    /// assertions after the run.
    pub(crate) struct MockHandles {
        pub reasoner: Arc<MockReasoner>,
        pub retriever: Arc<MockRetriever>,
        pub indexer: Arc<MockIndexer>,
        pub search: Arc<MockSearch>,
    }

    /// Default happy-path bundle: in-domain classification, two passages,
    /// one web hit, collection-1.
    pub(crate) fn mock_caps() -> (Capabilities, MockHandles) {
        mock_caps_with(MockReasoner::in_domain_defaults())
    }

    /// Bundle with a custom reasoner (failure injection, custom responses).
    pub(crate) fn mock_caps_with(reasoner: MockReasoner) -> (Capabilities, MockHandles) {
        build_bundle(reasoner, MockRetriever::statute_and_case())
    }

    /// Bundle with a custom retriever and default reasoner.
    pub(crate) fn mock_caps_with_retriever(
        retriever: MockRetriever,
    ) -> (Capabilities, MockHandles) {
        build_bundle(MockReasoner::in_domain_defaults(), retriever)
    }

    fn build_bundle(
        reasoner: MockReasoner,
        retriever: MockRetriever,
    ) -> (Capabilities, MockHandles) {
        let reasoner = Arc::new(reasoner);
        let retriever = Arc::new(retriever);
        let indexer = Arc::new(MockIndexer::new("collection-1"));
        let search = Arc::new(MockSearch::with_hits(vec![SearchHit {
            title: "E v F".to_string(),
            url: "https://example.test/e-v-f".to_string(),
            excerpt: "notice held unreasonable".to_string(),
        }]));
        let caps = Capabilities::new(
            reasoner.clone(),
            retriever.clone(),
            indexer.clone(),
            search.clone(),
        );
        (
            caps,
            MockHandles {
                reasoner,
                retriever,
                indexer,
                search,
            },
        )
    }

    /// **Scenario**: the wired pipeline passes graph validation, with and
    /// without a store.
    #[test]
    fn pipeline_graph_validates() {
        let (caps, _mocks) = mock_caps();
        let config = PipelineConfig::default();
        assert!(build_verdict_graph(caps.clone(), &config).compile().is_ok());
        let store = Arc::new(MemoryStore::<VerdictState>::new());
        assert!(build_verdict_graph(caps, &config)
            .compile_with_store(store)
            .is_ok());
    }
}
