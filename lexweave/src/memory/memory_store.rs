//! In-memory StateStore. Not persistent; for dev and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Checkpoint, StateStore, StoreError};

/// In-memory checkpoint log. Key: thread id; value: checkpoints oldest first.
///
/// The writer lock serializes appends across all threads, which trivially
/// satisfies the per-thread single-writer invariant.
pub struct MemoryStore<S> {
    inner: Arc<RwLock<HashMap<String, Vec<Checkpoint<S>>>>>,
}

impl<S> MemoryStore<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<S> Default for MemoryStore<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> StateStore<S> for MemoryStore<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint<S>>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.get(thread_id).and_then(|log| log.last().cloned()))
    }

    async fn append(
        &self,
        thread_id: &str,
        step_name: &str,
        state: &S,
    ) -> Result<u64, StoreError> {
        let mut guard = self.inner.write().await;
        let log = guard.entry(thread_id.to_string()).or_default();
        let seq = log.last().map(|cp| cp.seq + 1).unwrap_or(1);
        log.push(Checkpoint {
            step_name: step_name.to_string(),
            state: state.clone(),
            seq,
        });
        Ok(seq)
    }

    async fn list(&self, thread_id: &str) -> Result<Vec<Checkpoint<S>>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.get(thread_id).cloned().unwrap_or_default())
    }
}
