//! Verdict synthesis: draft a grounded answer from every branch output.

use async_trait::async_trait;
use serde_json::json;

use crate::collab::{Capabilities, CompletionRequest, ReasoningTask};
use crate::graph::Step;
use crate::state::{channels, VerdictState, VerdictUpdate};

use super::SYNTHESIZE_VERDICT;

const DEGRADED_VERDICT: &str =
    "Insufficient data: the verdict could not be synthesized from the available analysis.";

/// Synthesizes the draft verdict from doctrinal analysis, risk, precedents,
/// remediation, and the conversation so far.
pub struct SynthesizeStep {
    caps: Capabilities,
}

impl SynthesizeStep {
    pub fn new(caps: Capabilities) -> Self {
        Self { caps }
    }
}

#[async_trait]
impl Step<VerdictState> for SynthesizeStep {
    fn name(&self) -> &str {
        SYNTHESIZE_VERDICT
    }

    fn output_channels(&self) -> &'static [&'static str] {
        &[channels::DRAFT_VERDICT, channels::CURRENT_STEP]
    }

    async fn execute(&self, state: &VerdictState) -> VerdictUpdate {
        let history: Vec<&str> = state.messages.iter().map(|m| m.content.as_str()).collect();
        let request = CompletionRequest::new(
            ReasoningTask::SynthesizeVerdict,
            json!({
                "user_query": state.user_query,
                "analysis_units": state.analysis_units,
                "doctrinal_analysis": state.doctrinal_analysis,
                "risk_assessment": state.risk_assessment,
                "precedents": state.precedent_matches,
                "remediations": state.remediation_suggestions,
                "history": history,
            }),
        );

        let draft = match self.caps.reasoner.complete(request).await {
            Ok(completion) => completion.into_text(),
            Err(e) => {
                tracing::warn!(error = %e, "verdict synthesis failed, degrading");
                DEGRADED_VERDICT.to_string()
            }
        };

        VerdictUpdate {
            draft_verdict: Some(draft),
            current_step: Some(SYNTHESIZE_VERDICT.to_string()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::MockReasoner;
    use crate::verdict::tests::{mock_caps, mock_caps_with};

    /// **Scenario**: synthesis writes the reasoner's text as the draft.
    #[tokio::test]
    async fn writes_draft_from_reasoner() {
        let (caps, _mocks) = mock_caps();
        let step = SynthesizeStep::new(caps);
        let state = VerdictState {
            user_query: "q".to_string(),
            ..Default::default()
        };
        let update = step.execute(&state).await;
        assert_eq!(
            update.draft_verdict.as_deref(),
            Some("Draft verdict grounded in retrieved provisions.")
        );
    }

    /// **Scenario**: reasoning failure degrades to the explicit
    /// insufficient-data marker instead of erroring.
    #[tokio::test]
    async fn failure_degrades_to_marker() {
        let (caps, _mocks) =
            mock_caps_with(MockReasoner::new().with_failure(ReasoningTask::SynthesizeVerdict));
        let step = SynthesizeStep::new(caps);
        let update = step.execute(&VerdictState::default()).await;
        assert_eq!(update.draft_verdict.as_deref(), Some(DEGRADED_VERDICT));
    }
}
