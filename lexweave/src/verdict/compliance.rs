//! Compliance validation branch: doctrinal findings and loophole extraction.

use async_trait::async_trait;
use serde_json::json;

use crate::collab::{Capabilities, CollaboratorError, CompletionRequest, ReasoningTask};
use crate::graph::Step;
use crate::state::{
    channels, DoctrinalAnalysis, Finding, Loophole, LoopholeAnalysis, VerdictState, VerdictUpdate,
};

use super::COMPLIANCE_VALIDATOR;

const AVOIDED_SUMMARY: &str = "Avoided as it is not needed for this query.";

/// Validates the query against the retrieved provisions and extracts
/// loopholes from the findings. Runs in the parallel analysis region.
pub struct ComplianceStep {
    caps: Capabilities,
}

impl ComplianceStep {
    pub fn new(caps: Capabilities) -> Self {
        Self { caps }
    }

    async fn validate(
        &self,
        state: &VerdictState,
    ) -> Result<(DoctrinalAnalysis, LoopholeAnalysis), CollaboratorError> {
        let legal_context: String = state
            .retrieved_passages
            .iter()
            .map(|p| {
                format!(
                    "[{}] {}",
                    p.metadata.section.as_deref().unwrap_or("N/A"),
                    p.content.trim()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        let units_text: String = state
            .analysis_units
            .iter()
            .enumerate()
            .map(|(i, u)| format!("{}. {}", i + 1, u))
            .collect::<Vec<_>>()
            .join("\n");

        let value = self
            .caps
            .reasoner
            .complete(CompletionRequest::new(
                ReasoningTask::ValidateCompliance,
                json!({
                    "user_query": state.user_query,
                    "legal_context": legal_context,
                    "analysis_units": units_text,
                }),
            ))
            .await?
            .into_structured()?;

        let findings: Vec<Finding> =
            serde_json::from_value(value.get("findings").cloned().unwrap_or(json!([])))
                .map_err(|e| CollaboratorError::Malformed(e.to_string()))?;
        let loopholes: Vec<Loophole> = findings
            .iter()
            .filter_map(|f| f.loophole.clone())
            .filter(|l| l.kind != "none")
            .collect();
        let overall_status = if findings.iter().any(|f| f.status != "compliant") {
            "non_compliant"
        } else {
            "compliant"
        };

        let doctrinal = DoctrinalAnalysis {
            summary: value
                .get("doctrinal_summary")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            findings,
            overall_status: overall_status.to_string(),
        };
        let loophole_analysis = LoopholeAnalysis {
            summary: value
                .get("loophole_summary")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            loopholes,
        };
        Ok((doctrinal, loophole_analysis))
    }
}

#[async_trait]
impl Step<VerdictState> for ComplianceStep {
    fn name(&self) -> &str {
        COMPLIANCE_VALIDATOR
    }

    fn is_applicable(&self, state: &VerdictState) -> bool {
        state.actions_needed.iter().any(|a| a == COMPLIANCE_VALIDATOR)
    }

    fn output_channels(&self) -> &'static [&'static str] {
        &[
            channels::DOCTRINAL_ANALYSIS,
            channels::LOOPHOLE_ANALYSIS,
            channels::DOCTRINAL_DONE,
        ]
    }

    async fn execute(&self, state: &VerdictState) -> VerdictUpdate {
        if state.analysis_units.is_empty() || state.retrieved_passages.is_empty() {
            return VerdictUpdate {
                doctrinal_analysis: Some(DoctrinalAnalysis {
                    summary: "Insufficient data.".to_string(),
                    findings: Vec::new(),
                    overall_status: "incomplete".to_string(),
                }),
                loophole_analysis: Some(LoopholeAnalysis {
                    summary: "No data.".to_string(),
                    loopholes: Vec::new(),
                }),
                doctrinal_done: Some(true),
                ..Default::default()
            };
        }

        match self.validate(state).await {
            Ok((doctrinal, loopholes)) => VerdictUpdate {
                doctrinal_analysis: Some(doctrinal),
                loophole_analysis: Some(loopholes),
                doctrinal_done: Some(true),
                ..Default::default()
            },
            Err(e) => {
                tracing::warn!(error = %e, "compliance validation failed, degrading");
                VerdictUpdate {
                    doctrinal_analysis: Some(DoctrinalAnalysis {
                        summary: "Analysis unavailable.".to_string(),
                        findings: Vec::new(),
                        overall_status: "degraded".to_string(),
                    }),
                    doctrinal_done: Some(true),
                    ..Default::default()
                }
            }
        }
    }

    fn skip(&self, _state: &VerdictState) -> VerdictUpdate {
        VerdictUpdate {
            doctrinal_analysis: Some(DoctrinalAnalysis {
                summary: AVOIDED_SUMMARY.to_string(),
                findings: Vec::new(),
                overall_status: "Avoided".to_string(),
            }),
            loophole_analysis: Some(LoopholeAnalysis {
                summary: AVOIDED_SUMMARY.to_string(),
                loopholes: Vec::new(),
            }),
            doctrinal_done: Some(true),
            ..Default::default()
        }
    }
}
