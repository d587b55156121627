//! Risk and remediation branch: scores issues found by compliance.

use async_trait::async_trait;
use serde_json::json;

use crate::collab::{Capabilities, CollaboratorError, CompletionRequest, ReasoningTask};
use crate::graph::Step;
use crate::state::{channels, RiskAssessment, VerdictState, VerdictUpdate};

use super::RISK_ASSESSOR;

/// Assesses risk from the doctrinal findings and loopholes and proposes
/// remediation. Runs downstream of compliance inside the parallel region.
pub struct RiskStep {
    caps: Capabilities,
}

impl RiskStep {
    pub fn new(caps: Capabilities) -> Self {
        Self { caps }
    }

    /// Issue lines fed to the assessor; empty means nothing to assess.
    fn collect_issues(state: &VerdictState) -> Vec<String> {
        let mut issues = Vec::new();
        if let Some(doctrinal) = &state.doctrinal_analysis {
            let non_compliant = doctrinal
                .findings
                .iter()
                .filter(|f| f.status != "compliant")
                .count();
            if non_compliant > 0 {
                issues.push(format!("Doctrinal issues found: {}", non_compliant));
            }
        }
        if let Some(loopholes) = &state.loophole_analysis {
            if !loopholes.loopholes.is_empty() {
                issues.push(format!("Loopholes detected: {}", loopholes.loopholes.len()));
            }
        }
        issues
    }

    async fn assess(
        &self,
        issues: &[String],
    ) -> Result<(RiskAssessment, Vec<String>), CollaboratorError> {
        let value = self
            .caps
            .reasoner
            .complete(CompletionRequest::new(
                ReasoningTask::AssessRisk,
                json!({ "issues": issues.join("\n") }),
            ))
            .await?
            .into_structured()?;

        let assessment: RiskAssessment = serde_json::from_value(
            value
                .get("risk_assessment")
                .cloned()
                .unwrap_or(serde_json::Value::Null),
        )
        .map_err(|e| CollaboratorError::Malformed(e.to_string()))?;
        let remediation: Vec<String> = serde_json::from_value(
            value
                .get("remediation_suggestions")
                .cloned()
                .unwrap_or(json!([])),
        )
        .map_err(|e| CollaboratorError::Malformed(e.to_string()))?;
        Ok((assessment, remediation))
    }
}

#[async_trait]
impl Step<VerdictState> for RiskStep {
    fn name(&self) -> &str {
        RISK_ASSESSOR
    }

    fn is_applicable(&self, state: &VerdictState) -> bool {
        state.actions_needed.iter().any(|a| a == RISK_ASSESSOR)
    }

    fn output_channels(&self) -> &'static [&'static str] {
        &[
            channels::RISK_ASSESSMENT,
            channels::REMEDIATION_SUGGESTIONS,
            channels::REMEDIATION_DONE,
        ]
    }

    async fn execute(&self, state: &VerdictState) -> VerdictUpdate {
        let issues = Self::collect_issues(state);
        if issues.is_empty() {
            // Nothing to score; skip the reasoning call entirely.
            return VerdictUpdate {
                risk_assessment: Some(RiskAssessment {
                    overall_risk: "low".to_string(),
                    score: 1,
                    rationale: "No issues identified.".to_string(),
                }),
                remediation_suggestions: Some(Vec::new()),
                remediation_done: Some(true),
                ..Default::default()
            };
        }

        match self.assess(&issues).await {
            Ok((assessment, remediation)) => VerdictUpdate {
                risk_assessment: Some(assessment),
                remediation_suggestions: Some(remediation),
                remediation_done: Some(true),
                ..Default::default()
            },
            Err(e) => {
                tracing::warn!(error = %e, "risk assessment failed, degrading");
                VerdictUpdate {
                    remediation_done: Some(true),
                    ..Default::default()
                }
            }
        }
    }

    fn skip(&self, _state: &VerdictState) -> VerdictUpdate {
        VerdictUpdate {
            remediation_suggestions: Some(Vec::new()),
            remediation_done: Some(true),
            ..Default::default()
        }
    }
}
