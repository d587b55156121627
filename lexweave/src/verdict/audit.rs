//! Consistency audit: cite the draft and decide whether it needs review.

use async_trait::async_trait;
use serde_json::json;

use std::collections::HashSet;

use crate::collab::{Capabilities, CollaboratorError, CompletionRequest, ReasoningTask};
use crate::graph::Step;
use crate::state::{channels, Citation, VerdictState, VerdictUpdate};

use super::CONSISTENCY_AUDITOR;

/// Passages considered for citations.
const MAX_CITED_PASSAGES: usize = 5;
/// Citation excerpt length.
const EXCERPT_CHARS: usize = 200;
/// Contradiction above this flags the draft for review.
const CONTRADICTION_LIMIT: f64 = 50.0;
/// Confidence below this flags the draft for review.
const CONFIDENCE_FLOOR: f64 = 50.0;

/// Audits the draft verdict for contradictions and attaches citations from
/// the retrieved passages. Sets `needs_review` for the review-loop router.
pub struct AuditStep {
    caps: Capabilities,
}

impl AuditStep {
    pub fn new(caps: Capabilities) -> Self {
        Self { caps }
    }

    /// Citations from the top passages, de-duplicated by label.
    fn citations(state: &VerdictState) -> Vec<Citation> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut citations = Vec::new();
        for passage in state.retrieved_passages.iter().take(MAX_CITED_PASSAGES) {
            let meta = &passage.metadata;
            let label = meta
                .case_name
                .clone()
                .or_else(|| meta.section.clone())
                .unwrap_or_else(|| meta.source.clone());
            if label.is_empty() || !seen.insert(label.clone()) {
                continue;
            }
            let excerpt: String = passage.content.chars().take(EXCERPT_CHARS).collect();
            citations.push(Citation {
                source: meta.source.clone(),
                label,
                excerpt,
            });
        }
        citations
    }

    async fn audit(
        &self,
        state: &VerdictState,
        citation_count: usize,
    ) -> Result<(f64, f64), CollaboratorError> {
        let value = self
            .caps
            .reasoner
            .complete(CompletionRequest::new(
                ReasoningTask::AuditConsistency,
                json!({
                    "draft": state.draft_verdict,
                    "citation_count": citation_count,
                    "risk_assessment": state.risk_assessment,
                }),
            ))
            .await?
            .into_structured()?;
        let contradiction = value
            .get("contradiction_score")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        let confidence = value
            .get("confidence")
            .and_then(|v| v.as_f64())
            .unwrap_or(100.0);
        Ok((contradiction, confidence))
    }
}

#[async_trait]
impl Step<VerdictState> for AuditStep {
    fn name(&self) -> &str {
        CONSISTENCY_AUDITOR
    }

    fn is_applicable(&self, state: &VerdictState) -> bool {
        state.actions_needed.iter().any(|a| a == CONSISTENCY_AUDITOR)
    }

    fn output_channels(&self) -> &'static [&'static str] {
        &[
            channels::CITATIONS,
            channels::CONSISTENCY_SCORE,
            channels::NEEDS_REVIEW,
            channels::CURRENT_STEP,
        ]
    }

    async fn execute(&self, state: &VerdictState) -> VerdictUpdate {
        let citations = Self::citations(state);
        match self.audit(state, citations.len()).await {
            Ok((contradiction, confidence)) => {
                let needs_review =
                    contradiction > CONTRADICTION_LIMIT || confidence < CONFIDENCE_FLOOR;
                VerdictUpdate {
                    citations: Some(citations),
                    consistency_score: Some(confidence),
                    needs_review: Some(needs_review),
                    current_step: Some(CONSISTENCY_AUDITOR.to_string()),
                    ..Default::default()
                }
            }
            Err(e) => {
                // A broken auditor must not spin the review loop.
                tracing::warn!(error = %e, "consistency audit failed, proceeding unreviewed");
                VerdictUpdate {
                    citations: Some(citations),
                    needs_review: Some(false),
                    current_step: Some(CONSISTENCY_AUDITOR.to_string()),
                    ..Default::default()
                }
            }
        }
    }

    fn skip(&self, _state: &VerdictState) -> VerdictUpdate {
        VerdictUpdate {
            citations: Some(Vec::new()),
            needs_review: Some(false),
            current_step: Some(CONSISTENCY_AUDITOR.to_string()),
            ..Default::default()
        }
    }
}

/// Review-loop routing after the audit. Forward when the draft is clean;
/// back to retrieval while review passes remain; force forward once the
/// bound is reached so the run always terminates.
pub fn route_after_audit(state: &VerdictState) -> String {
    if !state.needs_review {
        "proceed".to_string()
    } else if state.review_count >= state.max_review_count {
        "force_proceed".to_string()
    } else {
        "retry".to_string()
    }
}
