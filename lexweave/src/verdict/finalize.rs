//! Finalize step: attach references, summarise, and maintain the history.

use async_trait::async_trait;
use serde_json::json;

use crate::collab::{Capabilities, CompletionRequest, ReasoningTask};
use crate::graph::Step;
use crate::message::{ChatMessage, MessageOp};
use crate::state::{channels, VerdictState, VerdictUpdate};

use super::FINALIZE_RESPONSE;

const DISCLAIMER: &str = "*AI-generated legal analysis.*";

/// Builds the final response (verdict + references + disclaimer), summarises
/// the verdict into the history, and prunes the history when the thread
/// grows past the configured limit.
pub struct FinalizeStep {
    caps: Capabilities,
    history_limit: usize,
}

impl FinalizeStep {
    pub fn new(caps: Capabilities, history_limit: usize) -> Self {
        Self {
            caps,
            history_limit,
        }
    }

    async fn verdict_summary(&self, verdict: &str) -> String {
        let request = CompletionRequest::new(
            ReasoningTask::SummariseVerdict,
            json!({ "verdict": verdict }),
        );
        match self.caps.reasoner.complete(request).await {
            Ok(completion) => completion.into_text().trim().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "verdict summary failed, storing the draft instead");
                verdict.to_string()
            }
        }
    }

    /// Prune ops for an over-long history: drop everything, push one summary.
    async fn prune_history(&self, state: &VerdictState) -> Vec<MessageOp> {
        if state.messages.len() <= self.history_limit {
            return Vec::new();
        }
        let history: Vec<&str> = state.messages.iter().map(|m| m.content.as_str()).collect();
        let request = CompletionRequest::new(
            ReasoningTask::SummariseHistory,
            json!({ "history": history }),
        );
        let summary = match self.caps.reasoner.complete(request).await {
            Ok(completion) => completion.into_text(),
            Err(e) => {
                // Without a summary, keep the history as is.
                tracing::warn!(error = %e, "history summary failed, keeping full history");
                return Vec::new();
            }
        };
        let mut ops: Vec<MessageOp> = state
            .messages
            .iter()
            .map(|m| MessageOp::Remove(m.id.clone()))
            .collect();
        ops.push(MessageOp::Push(ChatMessage::assistant(summary)));
        ops
    }
}

#[async_trait]
impl Step<VerdictState> for FinalizeStep {
    fn name(&self) -> &str {
        FINALIZE_RESPONSE
    }

    fn output_channels(&self) -> &'static [&'static str] {
        &[
            channels::FINAL_RESPONSE,
            channels::MESSAGES,
            channels::CURRENT_STEP,
        ]
    }

    async fn execute(&self, state: &VerdictState) -> VerdictUpdate {
        let verdict = state.draft_verdict.as_deref().unwrap_or_default();

        let references = if state.citations.is_empty() {
            String::new()
        } else {
            let lines: Vec<String> = state
                .citations
                .iter()
                .map(|c| format!("- {}: {}", c.label, c.source))
                .collect();
            format!("\n\n## References\n{}", lines.join("\n"))
        };
        let final_response = format!("{verdict}{references}\n\n{DISCLAIMER}");

        let summary = self.verdict_summary(verdict).await;
        let mut messages = self.prune_history(state).await;
        messages.push(MessageOp::Push(ChatMessage::user(state.user_query.clone())));
        messages.push(MessageOp::Push(ChatMessage::assistant(summary)));

        VerdictUpdate {
            final_response: Some(final_response),
            messages,
            current_step: Some(FINALIZE_RESPONSE.to_string()),
            ..Default::default()
        }
    }
}
