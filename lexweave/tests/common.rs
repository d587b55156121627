//! Shared fixtures for the pipeline integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use lexweave::collab::{
    MockIndexer, MockReasoner, MockRetriever, MockSearch, Reasoner, SearchHit,
};
use lexweave::Capabilities;

/// Handles onto the non-reasoning mocks behind a bundle.
pub struct CollabMocks {
    pub retriever: Arc<MockRetriever>,
    pub indexer: Arc<MockIndexer>,
    pub search: Arc<MockSearch>,
}

/// Handles onto every mock, including the reasoner.
pub struct Mocks {
    pub reasoner: Arc<MockReasoner>,
    pub retriever: Arc<MockRetriever>,
    pub indexer: Arc<MockIndexer>,
    pub search: Arc<MockSearch>,
}

/// Happy-path bundle: in-domain classification, statute + case passages.
pub fn mock_caps() -> (Capabilities, Mocks) {
    mock_caps_with(MockReasoner::in_domain_defaults())
}

/// Bundle around a custom mock reasoner.
pub fn mock_caps_with(reasoner: MockReasoner) -> (Capabilities, Mocks) {
    let reasoner = Arc::new(reasoner);
    let (caps, rest) = mock_caps_with_reasoner(reasoner.clone());
    (
        caps,
        Mocks {
            reasoner,
            retriever: rest.retriever,
            indexer: rest.indexer,
            search: rest.search,
        },
    )
}

/// Bundle around any reasoner implementation (e.g. a scripted one).
pub fn mock_caps_with_reasoner(reasoner: Arc<dyn Reasoner>) -> (Capabilities, CollabMocks) {
    let retriever = Arc::new(MockRetriever::statute_and_case());
    let indexer = Arc::new(MockIndexer::new("collection-1"));
    let search = Arc::new(MockSearch::with_hits(vec![SearchHit {
        title: "E v F".to_string(),
        url: "https://example.test/e-v-f".to_string(),
        excerpt: "notice held unreasonable".to_string(),
    }]));
    let caps = Capabilities::new(
        reasoner,
        retriever.clone(),
        indexer.clone(),
        search.clone(),
    );
    (
        caps,
        CollabMocks {
            retriever,
            indexer,
            search,
        },
    )
}
