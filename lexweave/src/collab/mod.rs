//! External collaborators invoked by pipeline steps.
//!
//! The engine never talks to these directly: steps receive a `Capabilities`
//! bundle at construction and must catch every `CollaboratorError`
//! themselves, degrading to a neutral update. No collaborator is reachable
//! through globals.

mod mock;
mod reasoner;
mod retrieval;
mod search;

pub use mock::{MockIndexer, MockReasoner, MockRetriever, MockSearch};
pub use reasoner::{Completion, CompletionRequest, Reasoner, ReasoningTask};
pub use retrieval::{DocumentRef, Indexer, Passage, PassageMeta, Retriever};
pub use search::{SearchHit, WebSearch};

use std::sync::Arc;

use thiserror::Error;

/// Failure from a reasoning/retrieval/search/indexing call.
///
/// Recovered locally inside the step that made the call; never surfaced past
/// the step boundary.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("reasoning call failed: {0}")]
    Reasoning(String),

    #[error("retrieval failed: {0}")]
    Retrieval(String),

    #[error("web search failed: {0}")]
    Search(String),

    #[error("document indexing failed: {0}")]
    Indexing(String),

    /// Output came back but could not be decoded into the expected shape.
    #[error("malformed collaborator output: {0}")]
    Malformed(String),
}

/// Capability bundle constructed once at process start and handed to every
/// step constructor.
#[derive(Clone)]
pub struct Capabilities {
    pub reasoner: Arc<dyn Reasoner>,
    pub retriever: Arc<dyn Retriever>,
    pub indexer: Arc<dyn Indexer>,
    pub search: Arc<dyn WebSearch>,
}

impl Capabilities {
    pub fn new(
        reasoner: Arc<dyn Reasoner>,
        retriever: Arc<dyn Retriever>,
        indexer: Arc<dyn Indexer>,
        search: Arc<dyn WebSearch>,
    ) -> Self {
        Self {
            reasoner,
            retriever,
            indexer,
            search,
        }
    }
}
