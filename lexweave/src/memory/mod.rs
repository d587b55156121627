//! Durable checkpointing: the append-only state log behind resumable runs.

mod checkpoint;
mod config;
mod memory_store;
mod sqlite_store;
mod store;

pub use checkpoint::Checkpoint;
pub use config::RunConfig;
pub use memory_store::MemoryStore;
pub use sqlite_store::SqliteStore;
pub use store::{StateStore, StoreError};
