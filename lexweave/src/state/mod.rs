//! State handling: the merge seam between steps and the engine.
//!
//! A step returns a partial update (`GraphState::Update`); the executor folds
//! it into the run's state with `apply`. The state type owns its per-channel
//! merge policy, so the engine stays generic over what the channels are.

mod verdict_state;

pub use verdict_state::{
    channels, Citation, DoctrinalAnalysis, Finding, IntentClassification, Loophole,
    LoopholeAnalysis, PrecedentMatch, RiskAssessment, VerdictState, VerdictUpdate,
    OUT_OF_DOMAIN_ADVISORY,
};

use std::fmt::Debug;

/// State driven through a graph run.
///
/// The engine only ever mutates state through `apply`, so the implementor
/// decides each channel's policy: overwrite-on-write, append-with-prune, or a
/// custom reduce. An `Update::default()` must be the identity (no channel
/// touched); the scheduler uses it as the skip result for steps without a
/// bespoke skip path.
pub trait GraphState: Clone + Send + Sync + Debug + 'static {
    /// Partial update returned by a step; untouched channels survive merging.
    type Update: Default + Send + 'static;

    /// Folds a partial update into this state.
    fn apply(&mut self, update: Self::Update);

    /// Name of the last completed sequential stage, recorded in snapshots.
    ///
    /// Resume re-derives the frontier from this, so parallel branch steps
    /// must not write it: an interrupted fan-out then replays the whole
    /// parallel region instead of losing a branch.
    fn current_step(&self) -> Option<&str> {
        None
    }
}
