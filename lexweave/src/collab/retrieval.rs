//! Retrieval and indexing collaborators.
//!
//! Vector-index construction and document chunking live behind these traits;
//! the pipeline only sees scored passages and collection handles.

use async_trait::async_trait;

use super::CollaboratorError;

/// Reference to a caller-supplied document.
///
/// Parsing/upload is handled upstream; by the time a run starts the text is
/// already in hand.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DocumentRef {
    /// Where the document came from (path, URL, upload id).
    pub source: String,
    /// Full extracted text.
    pub text: String,
}

/// Metadata attached to a retrieved passage.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PassageMeta {
    pub source: String,
    /// Statute section or clause header, when known.
    pub section: Option<String>,
    /// Set when the passage comes from a decided case rather than a statute.
    pub case_name: Option<String>,
}

/// One scored retrieval result.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Passage {
    pub content: String,
    pub metadata: PassageMeta,
    pub score: f32,
}

impl Passage {
    /// Dedup key used by the retrieval step: same content from the same
    /// source is the same passage regardless of which query found it.
    pub fn dedup_key(&self) -> (String, String) {
        (
            self.content.trim().to_string(),
            self.metadata.source.clone(),
        )
    }
}

/// Retrieval collaborator over the provision/case corpus.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Returns up to `k` passages scoring at or above `relevance_threshold`,
    /// ordered by relevance.
    async fn retrieve(
        &self,
        query: &str,
        k: usize,
        relevance_threshold: f32,
    ) -> Result<Vec<Passage>, CollaboratorError>;
}

/// Indexing collaborator, invoked once per new document reference.
#[async_trait]
pub trait Indexer: Send + Sync {
    /// Indexes the document and returns its collection handle.
    async fn index(&self, document: &DocumentRef) -> Result<String, CollaboratorError>;
}
