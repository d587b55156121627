//! Retrieval step: gather and de-duplicate relevant passages.
//!
//! Also the re-entry point of the review loop: when the auditor has flagged
//! the draft, re-entering here counts one more review pass and resets the
//! parallel-branch flags so the analysis region replays on refreshed state.

use async_trait::async_trait;

use std::collections::HashSet;

use crate::collab::{Capabilities, Passage, PassageMeta};
use crate::graph::Step;
use crate::state::{channels, VerdictState, VerdictUpdate};

use super::RETRIEVE_PASSAGES;

/// Retrieves passages for the optimised query and every analysis unit,
/// de-duplicated by (content, source).
pub struct RetrieveStep {
    caps: Capabilities,
    k: usize,
    relevance_threshold: f32,
}

impl RetrieveStep {
    pub fn new(caps: Capabilities, k: usize, relevance_threshold: f32) -> Self {
        Self {
            caps,
            k,
            relevance_threshold,
        }
    }
}

/// Placeholder passage when retrieval comes back empty or fails.
fn no_provisions_placeholder() -> Passage {
    Passage {
        content: "No relevant provisions found.".to_string(),
        metadata: PassageMeta {
            source: "system".to_string(),
            ..Default::default()
        },
        score: 0.0,
    }
}

#[async_trait]
impl Step<VerdictState> for RetrieveStep {
    fn name(&self) -> &str {
        RETRIEVE_PASSAGES
    }

    fn output_channels(&self) -> &'static [&'static str] {
        &[
            channels::RETRIEVED_PASSAGES,
            channels::DOCTRINAL_DONE,
            channels::PRECEDENT_DONE,
            channels::REMEDIATION_DONE,
            channels::PARALLEL_JOIN_COMPLETE,
            channels::REVIEW_COUNT,
            channels::CURRENT_STEP,
        ]
    }

    async fn execute(&self, state: &VerdictState) -> VerdictUpdate {
        let mut queries: Vec<&str> = vec![state.user_query.as_str()];
        queries.extend(state.analysis_units.iter().map(String::as_str));

        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut unique: Vec<Passage> = Vec::new();
        for query in queries {
            let passages = match self
                .caps
                .retriever
                .retrieve(query, self.k, self.relevance_threshold)
                .await
            {
                Ok(passages) => passages,
                Err(e) => {
                    tracing::warn!(error = %e, query = query, "retrieval failed for query");
                    continue;
                }
            };
            for passage in passages {
                if seen.insert(passage.dedup_key()) {
                    unique.push(passage);
                }
            }
        }
        if unique.is_empty() {
            unique.push(no_provisions_placeholder());
        }

        // One more review pass is being counted iff the auditor sent us back.
        let review_count = state
            .needs_review
            .then(|| state.review_count + 1);

        VerdictUpdate {
            retrieved_passages: Some(unique),
            doctrinal_done: Some(false),
            precedent_done: Some(false),
            remediation_done: Some(false),
            parallel_join_complete: Some(false),
            review_count,
            current_step: Some(RETRIEVE_PASSAGES.to_string()),
            ..Default::default()
        }
    }
}
