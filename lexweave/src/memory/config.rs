//! Per-run config: identifies the thread whose checkpoint log a run writes.

/// Config for a single run.
///
/// When the graph was compiled with a store and `thread_id` is set, every
/// step merge appends a checkpoint under that thread. Without a thread id the
/// run executes without persistence.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Unique id scoping one conversation's checkpoint chain.
    pub thread_id: Option<String>,
}

impl RunConfig {
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
        }
    }
}
