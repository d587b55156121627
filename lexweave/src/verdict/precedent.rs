//! Precedent matching branch: local cases first, web search as fallback.

use async_trait::async_trait;
use serde_json::json;

use crate::collab::{Capabilities, CollaboratorError, CompletionRequest, ReasoningTask};
use crate::graph::Step;
use crate::state::{channels, PrecedentMatch, VerdictState, VerdictUpdate};

use super::PRECEDENT_MATCHER;

/// Cap on matches carried into synthesis.
const MAX_MATCHES: usize = 3;

/// Matches the query against known cases. Web search runs only when the
/// retrieved passages contain no case material at all.
pub struct PrecedentStep {
    caps: Capabilities,
}

impl PrecedentStep {
    pub fn new(caps: Capabilities) -> Self {
        Self { caps }
    }

    async fn match_precedents(
        &self,
        state: &VerdictState,
    ) -> Result<Vec<PrecedentMatch>, CollaboratorError> {
        let local_cases: Vec<String> = state
            .retrieved_passages
            .iter()
            .filter_map(|p| {
                p.metadata
                    .case_name
                    .as_ref()
                    .map(|name| format!("Case: {}\n{}", name, p.content.trim()))
            })
            .collect();

        let web_context = if local_cases.is_empty() {
            tracing::debug!("no local cases retrieved, consulting web search");
            match self.caps.search.search(&state.user_query).await {
                Ok(hits) => hits
                    .iter()
                    .map(|h| format!("Web source: {}\nURL: {}\n{}", h.title, h.url, h.excerpt))
                    .collect::<Vec<_>>()
                    .join("\n\n"),
                Err(e) => {
                    tracing::warn!(error = %e, "web search failed, matching on local knowledge");
                    String::new()
                }
            }
        } else {
            String::new()
        };

        let local_case_context = if local_cases.is_empty() {
            "No local cases found.".to_string()
        } else {
            local_cases.join("\n\n")
        };

        let value = self
            .caps
            .reasoner
            .complete(CompletionRequest::new(
                ReasoningTask::MatchPrecedents,
                json!({
                    "user_query": state.user_query,
                    "history_len": state.messages.len(),
                    "local_case_context": local_case_context,
                    "web_context": web_context,
                }),
            ))
            .await?
            .into_structured()?;

        let mut matches: Vec<PrecedentMatch> =
            serde_json::from_value(value.get("matches").cloned().unwrap_or(json!([])))
                .map_err(|e| CollaboratorError::Malformed(e.to_string()))?;
        matches.truncate(MAX_MATCHES);
        Ok(matches)
    }
}

#[async_trait]
impl Step<VerdictState> for PrecedentStep {
    fn name(&self) -> &str {
        PRECEDENT_MATCHER
    }

    fn is_applicable(&self, state: &VerdictState) -> bool {
        state.actions_needed.iter().any(|a| a == PRECEDENT_MATCHER)
    }

    fn output_channels(&self) -> &'static [&'static str] {
        &[channels::PRECEDENT_MATCHES, channels::PRECEDENT_DONE]
    }

    async fn execute(&self, state: &VerdictState) -> VerdictUpdate {
        let matches = match self.match_precedents(state).await {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "precedent matching failed, degrading to none");
                Vec::new()
            }
        };
        VerdictUpdate {
            precedent_matches: Some(matches),
            precedent_done: Some(true),
            ..Default::default()
        }
    }

    fn skip(&self, _state: &VerdictState) -> VerdictUpdate {
        VerdictUpdate {
            precedent_matches: Some(Vec::new()),
            precedent_done: Some(true),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{MockReasoner, Passage, PassageMeta};
    use crate::verdict::tests::{mock_caps, mock_caps_with};

    fn state_with_case_passage() -> VerdictState {
        VerdictState {
            user_query: "notice period".to_string(),
            actions_needed: vec![PRECEDENT_MATCHER.to_string()],
            retrieved_passages: vec![Passage {
                content: "Notice of two weeks was held unreasonable.".to_string(),
                metadata: PassageMeta {
                    source: "case-reports".to_string(),
                    section: None,
                    case_name: Some("A v B".to_string()),
                },
                score: 0.85,
            }],
            ..Default::default()
        }
    }

    /// **Scenario**: with local case passages, web search is never consulted.
    #[tokio::test]
    async fn local_cases_suppress_web_search() {
        let (caps, mocks) = mock_caps();
        let step = PrecedentStep::new(caps);

        let update = step.execute(&state_with_case_passage()).await;
        assert_eq!(update.precedent_matches.unwrap().len(), 2);
        assert_eq!(update.precedent_done, Some(true));
        assert!(mocks.search.queries().is_empty(), "local cases were enough");
    }

    /// **Scenario**: no local case material → web search is consulted once.
    #[tokio::test]
    async fn missing_local_cases_trigger_web_search() {
        let (caps, mocks) = mock_caps();
        let step = PrecedentStep::new(caps);
        let state = VerdictState {
            user_query: "notice period".to_string(),
            actions_needed: vec![PRECEDENT_MATCHER.to_string()],
            ..Default::default()
        };

        let update = step.execute(&state).await;
        assert_eq!(update.precedent_done, Some(true));
        assert_eq!(mocks.search.queries(), vec!["notice period".to_string()]);
    }

    /// **Scenario**: matches are capped at three.
    #[tokio::test]
    async fn matches_capped_at_three() {
        let (caps, _mocks) = mock_caps_with(MockReasoner::new().with(
            ReasoningTask::MatchPrecedents,
            crate::collab::Completion::Structured(json!({
                "matches": [
                    {"case_name": "A"}, {"case_name": "B"},
                    {"case_name": "C"}, {"case_name": "D"}
                ]
            })),
        ));
        let step = PrecedentStep::new(caps);

        let update = step.execute(&state_with_case_passage()).await;
        assert_eq!(update.precedent_matches.unwrap().len(), 3);
    }

    /// **Scenario**: reasoning failure degrades to no matches, done stays set.
    #[tokio::test]
    async fn failure_degrades_with_done_set() {
        let (caps, _mocks) =
            mock_caps_with(MockReasoner::new().with_failure(ReasoningTask::MatchPrecedents));
        let step = PrecedentStep::new(caps);

        let update = step.execute(&state_with_case_passage()).await;
        assert_eq!(update.precedent_matches.unwrap().len(), 0);
        assert_eq!(update.precedent_done, Some(true));
    }
}
