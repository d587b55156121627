//! Query decomposition step: classify intent, plan needed actions.

use async_trait::async_trait;
use serde_json::json;

use crate::collab::{Capabilities, CollaboratorError, CompletionRequest, ReasoningTask};
use crate::graph::Step;
use crate::state::{
    channels, IntentClassification, VerdictState, VerdictUpdate, OUT_OF_DOMAIN_ADVISORY,
};

use super::DECOMPOSE_QUERY;

/// How much of the document the classifier sees.
const DOCUMENT_PREVIEW_CHARS: usize = 500;

/// Classifies the query, optimises it, and plans which analysis steps the
/// run actually needs. An out-of-domain classification short-circuits the
/// run with a fixed advisory; the routing after this step sends it to the
/// terminal marker.
pub struct DecomposeStep {
    caps: Capabilities,
}

impl DecomposeStep {
    pub fn new(caps: Capabilities) -> Self {
        Self { caps }
    }

    async fn classify(
        &self,
        state: &VerdictState,
    ) -> Result<IntentClassification, CollaboratorError> {
        let document_preview: String = state
            .document_text
            .as_deref()
            .unwrap_or("")
            .chars()
            .take(DOCUMENT_PREVIEW_CHARS)
            .collect();
        let completion = self
            .caps
            .reasoner
            .complete(CompletionRequest::new(
                ReasoningTask::DecomposeQuery,
                json!({
                    "input_query": state.input_query,
                    "history_len": state.messages.len(),
                    "has_document": state.document_text.is_some(),
                    "document_preview": document_preview,
                }),
            ))
            .await?;
        let value = completion.into_structured()?;
        serde_json::from_value(value).map_err(|e| CollaboratorError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl Step<VerdictState> for DecomposeStep {
    fn name(&self) -> &str {
        DECOMPOSE_QUERY
    }

    fn output_channels(&self) -> &'static [&'static str] {
        &[
            channels::USER_QUERY,
            channels::INTENT,
            channels::ACTIONS_NEEDED,
            channels::ANALYSIS_UNITS,
            channels::FINAL_RESPONSE,
            channels::CURRENT_STEP,
        ]
    }

    async fn execute(&self, state: &VerdictState) -> VerdictUpdate {
        let base = VerdictUpdate {
            current_step: Some(DECOMPOSE_QUERY.to_string()),
            ..Default::default()
        };

        match self.classify(state).await {
            Ok(intent) if !intent.in_domain => VerdictUpdate {
                user_query: Some(state.input_query.clone()),
                intent: Some(intent),
                final_response: Some(OUT_OF_DOMAIN_ADVISORY.to_string()),
                ..base
            },
            Ok(intent) => {
                let user_query = intent
                    .optimised_query
                    .clone()
                    .filter(|q| !q.trim().is_empty())
                    .unwrap_or_else(|| state.input_query.clone());
                let analysis_units = if intent.analysis_units.is_empty() {
                    vec![user_query.clone()]
                } else {
                    intent.analysis_units.clone()
                };
                VerdictUpdate {
                    user_query: Some(user_query),
                    actions_needed: Some(intent.actions_needed.clone()),
                    analysis_units: Some(analysis_units),
                    intent: Some(intent),
                    ..base
                }
            }
            Err(e) => {
                // Degrade to a permissive default: treat the query as
                // in-domain and run every analysis step.
                tracing::warn!(error = %e, "intent classification failed, using defaults");
                let intent = IntentClassification {
                    in_domain: true,
                    intent: if state.document_text.is_some() {
                        "document_general".to_string()
                    } else {
                        "general".to_string()
                    },
                    optimised_query: None,
                    actions_needed: super::ALL_ANALYSIS_STEPS
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                    analysis_units: Vec::new(),
                };
                VerdictUpdate {
                    user_query: Some(state.input_query.clone()),
                    actions_needed: Some(intent.actions_needed.clone()),
                    analysis_units: Some(vec![state.input_query.clone()]),
                    intent: Some(intent),
                    ..base
                }
            }
        }
    }
}

/// Routing after decomposition: out-of-domain queries exit immediately.
pub fn route_after_decompose(state: &VerdictState) -> String {
    let in_domain = state.intent.as_ref().map_or(true, |i| i.in_domain);
    if in_domain {
        "continue".to_string()
    } else {
        "end".to_string()
    }
}
