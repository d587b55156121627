//! Step contract: the unit of work the engine schedules.

use async_trait::async_trait;

use crate::state::GraphState;

/// A named processing step over shared state.
///
/// The execution function is total: a step must catch every collaborator
/// failure itself and degrade to a neutral update with its own done flag set.
/// The engine never receives a step-level error.
///
/// **Interaction**: registered on `GraphDefinition::add_step`; the executor
/// checks `is_applicable` before each invocation and takes the skip path for
/// steps the current query does not need.
#[async_trait]
pub trait Step<S: GraphState>: Send + Sync {
    /// Step name; also its node id in the graph.
    fn name(&self) -> &str;

    /// Whether this step should do real work for the current state.
    ///
    /// Evaluated by the scheduler, not inside `execute`. Steps that always
    /// run keep the default.
    fn is_applicable(&self, _state: &S) -> bool {
        true
    }

    /// Channels this step writes. Fan-out frontier members execute
    /// concurrently only when every member declares a non-empty set and the
    /// sets are pairwise disjoint; otherwise the frontier runs sequentially.
    fn output_channels(&self) -> &'static [&'static str] {
        &[]
    }

    /// Runs the step against a read-only view of state.
    async fn execute(&self, state: &S) -> S::Update;

    /// Neutral update used when the step is not applicable: mark the step
    /// done with empty results. The default is the identity update.
    fn skip(&self, _state: &S) -> S::Update {
        S::Update::default()
    }
}
