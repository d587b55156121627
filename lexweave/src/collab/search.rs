//! Web search collaborator.
//!
//! Only consulted when a step judges local retrieval insufficient.

use async_trait::async_trait;

use super::CollaboratorError;

/// One web search result.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub excerpt: String,
}

/// Web search collaborator.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Returns results ordered by the backend's own relevance.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, CollaboratorError>;
}
