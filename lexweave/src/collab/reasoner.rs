//! Reasoning collaborator: structured or text completions.
//!
//! Prompt content is owned by the implementation; steps identify what they
//! need through `ReasoningTask` and pass their inputs as JSON.

use async_trait::async_trait;
use serde_json::Value;

use super::CollaboratorError;

/// Which pipeline prompt a completion request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReasoningTask {
    /// Intent classification, query optimisation, needed-actions planning.
    DecomposeQuery,
    /// Doctrinal findings and loophole detection over retrieved passages.
    ValidateCompliance,
    /// Precedent matching over local cases plus optional web context.
    MatchPrecedents,
    /// Risk scoring and remediation suggestions from detected issues.
    AssessRisk,
    /// Draft verdict synthesis from all branch outputs.
    SynthesizeVerdict,
    /// Contradiction/confidence audit of the draft verdict.
    AuditConsistency,
    /// Short verdict summary appended to the conversation history.
    SummariseVerdict,
    /// Whole-history summary used when pruning long threads.
    SummariseHistory,
    /// Standalone summary of a prior result (service call, outside the graph).
    SummariseAnalysis,
}

/// One completion request: the task plus its structured inputs.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub task: ReasoningTask,
    pub inputs: Value,
}

impl CompletionRequest {
    pub fn new(task: ReasoningTask, inputs: Value) -> Self {
        Self { task, inputs }
    }
}

/// Completion output: structured JSON for parsing steps, plain text for
/// synthesis/summary steps.
#[derive(Debug, Clone)]
pub enum Completion {
    Structured(Value),
    Text(String),
}

impl Completion {
    /// Structured payload, or Malformed when the implementation returned text
    /// where the step expected JSON.
    pub fn into_structured(self) -> Result<Value, CollaboratorError> {
        match self {
            Completion::Structured(v) => Ok(v),
            Completion::Text(t) => Err(CollaboratorError::Malformed(format!(
                "expected structured output, got text: {:.60}",
                t
            ))),
        }
    }

    /// Text payload; structured values are rendered as JSON text.
    pub fn into_text(self) -> String {
        match self {
            Completion::Text(t) => t,
            Completion::Structured(v) => v.to_string(),
        }
    }
}

/// Reasoning collaborator.
///
/// Steps treat failures as recoverable: every caller catches the error and
/// degrades to a neutral update with its own done flag set.
#[async_trait]
pub trait Reasoner: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, CollaboratorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: into_structured on text output reports Malformed.
    #[test]
    fn completion_into_structured_rejects_text() {
        let c = Completion::Text("plain".to_string());
        let err = c.into_structured().unwrap_err();
        assert!(matches!(err, CollaboratorError::Malformed(_)));
    }

    /// **Scenario**: into_text renders structured output as JSON text.
    #[test]
    fn completion_into_text_renders_structured() {
        let c = Completion::Structured(serde_json::json!({"k": 1}));
        assert_eq!(c.into_text(), "{\"k\":1}");
    }
}
