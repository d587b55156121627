//! Document ingestion step: index an attached document once per thread.

use async_trait::async_trait;

use crate::collab::Capabilities;
use crate::graph::Step;
use crate::state::{channels, VerdictState, VerdictUpdate};

use super::INGEST_DOCUMENT;

/// Indexes the attached document (when there is one) and records its
/// collection handle. Re-runs on the same thread skip re-indexing. Also
/// resets the review counter for the new run.
pub struct IngestStep {
    caps: Capabilities,
}

impl IngestStep {
    pub fn new(caps: Capabilities) -> Self {
        Self { caps }
    }
}

#[async_trait]
impl Step<VerdictState> for IngestStep {
    fn name(&self) -> &str {
        INGEST_DOCUMENT
    }

    fn output_channels(&self) -> &'static [&'static str] {
        &[
            channels::DOCUMENT_TEXT,
            channels::DOCUMENT_COLLECTION,
            channels::REVIEW_COUNT,
            channels::CURRENT_STEP,
            channels::ERROR,
        ]
    }

    async fn execute(&self, state: &VerdictState) -> VerdictUpdate {
        let base = VerdictUpdate {
            review_count: Some(0),
            current_step: Some(INGEST_DOCUMENT.to_string()),
            ..Default::default()
        };

        let document = match &state.document_reference {
            Some(doc) => doc,
            None => return base,
        };
        // Text already in state means this thread ingested the document on an
        // earlier turn.
        if state.document_text.is_some() {
            return base;
        }

        match self.caps.indexer.index(document).await {
            Ok(collection) => {
                tracing::debug!(collection = %collection, "document indexed");
                VerdictUpdate {
                    document_text: Some(document.text.clone()),
                    document_collection: Some(collection),
                    ..base
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "document indexing failed, continuing without it");
                VerdictUpdate {
                    error: Some(format!("document indexing failed: {e}")),
                    ..base
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::DocumentRef;
    use crate::verdict::tests::mock_caps;

    /// **Scenario**: no document attached: only the counter reset and step
    /// marker are written.
    #[tokio::test]
    async fn no_document_resets_counter_only() {
        let (caps, _mocks) = mock_caps();
        let step = IngestStep::new(caps);
        let update = step.execute(&VerdictState::default()).await;
        assert_eq!(update.review_count, Some(0));
        assert!(update.document_collection.is_none());
        assert!(update.document_text.is_none());
    }

    /// **Scenario**: attached document gets indexed once; a thread that
    /// already has the text does not re-index.
    #[tokio::test]
    async fn document_indexed_once_per_thread() {
        let (caps, mocks) = mock_caps();
        let step = IngestStep::new(caps);
        let doc = DocumentRef {
            source: "contract.pdf".to_string(),
            text: "Clause 4: termination...".to_string(),
        };

        let state = VerdictState {
            document_reference: Some(doc.clone()),
            ..Default::default()
        };
        let update = step.execute(&state).await;
        assert_eq!(update.document_collection.as_deref(), Some("collection-1"));
        assert_eq!(update.document_text.as_deref(), Some("Clause 4: termination..."));
        assert_eq!(mocks.indexer.call_count(), 1);

        let already = VerdictState {
            document_reference: Some(doc),
            document_text: Some("Clause 4: termination...".to_string()),
            ..Default::default()
        };
        let update = step.execute(&already).await;
        assert!(update.document_collection.is_none());
        assert_eq!(mocks.indexer.call_count(), 1, "no second index call");
    }
}
