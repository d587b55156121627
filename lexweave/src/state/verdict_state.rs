//! Verdict pipeline state: channels, payload types, and merge policy.
//!
//! Merge policy per channel:
//! - most channels overwrite on write (a step returns `Some`, the old value
//!   is replaced; `None` leaves the channel untouched),
//! - `messages` applies `MessageOp`s in order (prune-then-append),
//! - boolean flags and counters overwrite only.

use crate::collab::{DocumentRef, Passage};
use crate::message::{ChatMessage, MessageOp};
use crate::state::GraphState;

/// Fixed advisory returned when classification rules the query out of domain.
pub const OUT_OF_DOMAIN_ADVISORY: &str =
    "This query is outside the legal domain this service covers. \
     Please ask a question about legal provisions, contracts, or cases.";

/// Channel names, as declared by steps for fan-out disjointness checks.
pub mod channels {
    pub const DOCUMENT_TEXT: &str = "document_text";
    pub const DOCUMENT_COLLECTION: &str = "document_collection";
    pub const USER_QUERY: &str = "user_query";
    pub const ACTIONS_NEEDED: &str = "actions_needed";
    pub const ANALYSIS_UNITS: &str = "analysis_units";
    pub const RETRIEVED_PASSAGES: &str = "retrieved_passages";
    pub const INTENT: &str = "intent";
    pub const DOCTRINAL_ANALYSIS: &str = "doctrinal_analysis";
    pub const LOOPHOLE_ANALYSIS: &str = "loophole_analysis";
    pub const PRECEDENT_MATCHES: &str = "precedent_matches";
    pub const RISK_ASSESSMENT: &str = "risk_assessment";
    pub const REMEDIATION_SUGGESTIONS: &str = "remediation_suggestions";
    pub const MESSAGES: &str = "messages";
    pub const DRAFT_VERDICT: &str = "draft_verdict";
    pub const CITATIONS: &str = "citations";
    pub const CONSISTENCY_SCORE: &str = "consistency_score";
    pub const FINAL_RESPONSE: &str = "final_response";
    pub const NEEDS_REVIEW: &str = "needs_review";
    pub const DOCTRINAL_DONE: &str = "doctrinal_done";
    pub const PRECEDENT_DONE: &str = "precedent_done";
    pub const REMEDIATION_DONE: &str = "remediation_done";
    pub const PARALLEL_JOIN_COMPLETE: &str = "parallel_join_complete";
    pub const REVIEW_COUNT: &str = "review_count";
    pub const CURRENT_STEP: &str = "current_step";
    pub const ERROR: &str = "error";
}

/// Output of intent classification.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IntentClassification {
    /// False sends the run straight to the terminal marker with the advisory.
    #[serde(default = "default_true")]
    pub in_domain: bool,
    /// general / document_general / document_specific.
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub optimised_query: Option<String>,
    /// Step names the query actually needs; others take their skip path.
    #[serde(default)]
    pub actions_needed: Vec<String>,
    #[serde(default)]
    pub analysis_units: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// One doctrinal finding against a clause or analysis unit.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Finding {
    pub clause: String,
    /// compliant / non_compliant / unclear.
    pub status: String,
    #[serde(default)]
    pub loophole: Option<Loophole>,
}

/// A loophole attached to a finding.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Loophole {
    pub kind: String,
    pub description: String,
}

/// Doctrinal compliance analysis over the retrieved provisions.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DoctrinalAnalysis {
    pub summary: String,
    #[serde(default)]
    pub findings: Vec<Finding>,
    /// compliant / non_compliant / Avoided / incomplete / degraded.
    pub overall_status: String,
}

/// Loophole report extracted from the doctrinal findings.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoopholeAnalysis {
    pub summary: String,
    #[serde(default)]
    pub loopholes: Vec<Loophole>,
}

/// One matched precedent.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PrecedentMatch {
    pub case_name: String,
    #[serde(default)]
    pub relevance: String,
    #[serde(default)]
    pub summary: String,
}

/// Risk scoring over detected issues.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RiskAssessment {
    /// low / medium / high.
    pub overall_risk: String,
    pub score: u32,
    #[serde(default)]
    pub rationale: String,
}

/// One citation in the final response.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Citation {
    pub source: String,
    /// Case name, section, or source: whichever identifies the passage best.
    pub label: String,
    /// Leading excerpt of the cited passage.
    pub excerpt: String,
}

/// Full pipeline state for one run.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct VerdictState {
    // Inputs
    pub input_query: String,
    pub document_reference: Option<DocumentRef>,
    pub document_text: Option<String>,

    // Processing
    pub user_query: String,
    pub actions_needed: Vec<String>,
    pub analysis_units: Vec<String>,
    pub retrieved_passages: Vec<Passage>,
    pub document_collection: Option<String>,
    pub intent: Option<IntentClassification>,

    // Branch outputs
    pub doctrinal_analysis: Option<DoctrinalAnalysis>,
    pub loophole_analysis: Option<LoopholeAnalysis>,
    pub precedent_matches: Vec<PrecedentMatch>,
    pub risk_assessment: Option<RiskAssessment>,
    pub remediation_suggestions: Vec<String>,
    pub messages: Vec<ChatMessage>,

    // Synthesis & output
    pub draft_verdict: Option<String>,
    pub citations: Vec<Citation>,
    pub consistency_score: Option<f64>,
    pub final_response: Option<String>,

    // Control flow
    pub needs_review: bool,
    pub doctrinal_done: bool,
    pub precedent_done: bool,
    pub remediation_done: bool,
    pub parallel_join_complete: bool,
    pub review_count: u32,
    pub max_review_count: u32,
    pub current_step: Option<String>,
    pub error: Option<String>,
}

impl VerdictState {
    /// Fresh state for a new run.
    pub fn new(
        input_query: impl Into<String>,
        document_reference: Option<DocumentRef>,
        max_review_count: u32,
    ) -> Self {
        Self {
            input_query: input_query.into(),
            document_reference,
            max_review_count,
            ..Default::default()
        }
    }
}

/// Partial update returned by a step. `None` / empty leaves the channel
/// untouched; `Default::default()` is the identity update.
#[derive(Debug, Clone, Default)]
pub struct VerdictUpdate {
    pub document_text: Option<String>,
    pub document_collection: Option<String>,
    pub user_query: Option<String>,
    pub actions_needed: Option<Vec<String>>,
    pub analysis_units: Option<Vec<String>>,
    pub retrieved_passages: Option<Vec<Passage>>,
    pub intent: Option<IntentClassification>,
    pub doctrinal_analysis: Option<DoctrinalAnalysis>,
    pub loophole_analysis: Option<LoopholeAnalysis>,
    pub precedent_matches: Option<Vec<PrecedentMatch>>,
    pub risk_assessment: Option<RiskAssessment>,
    pub remediation_suggestions: Option<Vec<String>>,
    /// Applied in order: prune-then-append.
    pub messages: Vec<MessageOp>,
    pub draft_verdict: Option<String>,
    pub citations: Option<Vec<Citation>>,
    pub consistency_score: Option<f64>,
    pub final_response: Option<String>,
    pub needs_review: Option<bool>,
    pub doctrinal_done: Option<bool>,
    pub precedent_done: Option<bool>,
    pub remediation_done: Option<bool>,
    pub parallel_join_complete: Option<bool>,
    pub review_count: Option<u32>,
    pub current_step: Option<String>,
    pub error: Option<String>,
}

impl GraphState for VerdictState {
    type Update = VerdictUpdate;

    fn apply(&mut self, update: VerdictUpdate) {
        if let Some(v) = update.document_text {
            self.document_text = Some(v);
        }
        if let Some(v) = update.document_collection {
            self.document_collection = Some(v);
        }
        if let Some(v) = update.user_query {
            self.user_query = v;
        }
        if let Some(v) = update.actions_needed {
            self.actions_needed = v;
        }
        if let Some(v) = update.analysis_units {
            self.analysis_units = v;
        }
        if let Some(v) = update.retrieved_passages {
            self.retrieved_passages = v;
        }
        if let Some(v) = update.intent {
            self.intent = Some(v);
        }
        if let Some(v) = update.doctrinal_analysis {
            self.doctrinal_analysis = Some(v);
        }
        if let Some(v) = update.loophole_analysis {
            self.loophole_analysis = Some(v);
        }
        if let Some(v) = update.precedent_matches {
            self.precedent_matches = v;
        }
        if let Some(v) = update.risk_assessment {
            self.risk_assessment = Some(v);
        }
        if let Some(v) = update.remediation_suggestions {
            self.remediation_suggestions = v;
        }
        for op in update.messages {
            match op {
                MessageOp::Push(msg) => self.messages.push(msg),
                MessageOp::Remove(id) => self.messages.retain(|m| m.id != id),
            }
        }
        if let Some(v) = update.draft_verdict {
            self.draft_verdict = Some(v);
        }
        if let Some(v) = update.citations {
            self.citations = v;
        }
        if let Some(v) = update.consistency_score {
            self.consistency_score = Some(v);
        }
        if let Some(v) = update.final_response {
            self.final_response = Some(v);
        }
        if let Some(v) = update.needs_review {
            self.needs_review = v;
        }
        if let Some(v) = update.doctrinal_done {
            self.doctrinal_done = v;
        }
        if let Some(v) = update.precedent_done {
            self.precedent_done = v;
        }
        if let Some(v) = update.remediation_done {
            self.remediation_done = v;
        }
        if let Some(v) = update.parallel_join_complete {
            self.parallel_join_complete = v;
        }
        if let Some(v) = update.review_count {
            self.review_count = v;
        }
        if let Some(v) = update.current_step {
            self.current_step = Some(v);
        }
        if let Some(v) = update.error {
            self.error = Some(v);
        }
    }

    fn current_step(&self) -> Option<&str> {
        self.current_step.as_deref()
    }
}
