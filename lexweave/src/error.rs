//! Run-time error types for graph execution.
//!
//! Build-time validation failures live in `graph::GraphValidationError`;
//! collaborator failures are recovered inside steps (`collab::CollaboratorError`)
//! and never reach this enum.

use thiserror::Error;

use crate::memory::StoreError;

/// Fatal error while driving a run.
///
/// Returned by `CompiledGraph::invoke` / `resume`. Step-internal failures are
/// degraded inside the step and do not surface here; only routing and
/// persistence failures abort a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// A routing function returned a label absent from its target map.
    #[error("no route for label {label:?} after step {step:?}")]
    Routing { step: String, label: String },

    /// Checkpoint read or write failed. Never retried by the engine.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Resume was requested for a thread with no recorded checkpoint.
    #[error("no checkpoint recorded for thread {thread_id:?}")]
    NoCheckpoint { thread_id: String },

    /// Resume was requested on a graph compiled without a state store.
    #[error("graph was compiled without a state store; resume requires one")]
    StoreNotConfigured,
}
