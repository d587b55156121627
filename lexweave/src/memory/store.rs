//! StateStore trait: durable, append-only checkpoint log per thread.

use async_trait::async_trait;
use thiserror::Error;

use super::Checkpoint;

/// Checkpoint store failure. Fatal to the run that hit it; the engine never
/// retries a store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage failed (I/O, SQLite, lock poisoning).
    #[error("checkpoint storage failed: {0}")]
    Storage(String),

    /// State snapshot could not be encoded or decoded.
    #[error("checkpoint serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable, append-only checkpoint log keyed by thread id.
///
/// Appends are serialized per thread (single-writer invariant); distinct
/// threads may be written concurrently. `seq` values assigned by `append`
/// are strictly increasing within a thread.
#[async_trait]
pub trait StateStore<S>: Send + Sync {
    /// Latest checkpoint for the thread, or None for a fresh thread.
    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint<S>>, StoreError>;

    /// Atomically appends a snapshot and returns its sequence number.
    async fn append(
        &self,
        thread_id: &str,
        step_name: &str,
        state: &S,
    ) -> Result<u64, StoreError>;

    /// Full ordered log for the thread, oldest first. Audit/debug surface.
    async fn list(&self, thread_id: &str) -> Result<Vec<Checkpoint<S>>, StoreError>;
}
