//! Join gate: flag-based barrier closing the parallel analysis region.

use async_trait::async_trait;

use crate::graph::Step;
use crate::state::{channels, VerdictState, VerdictUpdate};

use super::PARALLEL_JOIN_GATE;

/// Advances the run once every parallel branch has set its done flag.
///
/// The gate only inspects the three flags and, at most once, sets
/// `parallel_join_complete`; its conditional edge self-loops until then.
/// Safe to invoke any number of times: each branch completion may re-trigger
/// evaluation and the gate has no other side effects.
pub struct JoinGateStep;

impl JoinGateStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JoinGateStep {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Step<VerdictState> for JoinGateStep {
    fn name(&self) -> &str {
        PARALLEL_JOIN_GATE
    }

    fn output_channels(&self) -> &'static [&'static str] {
        &[channels::PARALLEL_JOIN_COMPLETE]
    }

    async fn execute(&self, state: &VerdictState) -> VerdictUpdate {
        let all_done = state.doctrinal_done && state.precedent_done && state.remediation_done;
        if all_done && !state.parallel_join_complete {
            return VerdictUpdate {
                parallel_join_complete: Some(true),
                ..Default::default()
            };
        }
        VerdictUpdate::default()
    }
}

/// Routing after the gate: forward once complete, otherwise re-queue it.
pub fn route_after_join(state: &VerdictState) -> String {
    if state.parallel_join_complete {
        "continue".to_string()
    } else {
        "wait".to_string()
    }
}
