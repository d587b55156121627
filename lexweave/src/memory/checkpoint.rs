//! Checkpoint: one entry in a thread's append-only state log.

/// Snapshot taken after a step execution.
///
/// `seq` is strictly increasing within a thread; the store assigns it on
/// append. `state` is the full merged state at snapshot time, so the latest
/// entry alone is enough to resume.
#[derive(Debug, Clone)]
pub struct Checkpoint<S> {
    /// Name of the step whose merge produced this snapshot.
    pub step_name: String,
    /// Full state after the merge.
    pub state: S,
    /// Position in the thread's log, starting at 1.
    pub seq: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Checkpoint is a plain data carrier; clone preserves all fields.
    #[test]
    fn checkpoint_clone_preserves_fields() {
        let cp = Checkpoint {
            step_name: "retrieve_passages".to_string(),
            state: 42_i32,
            seq: 3,
        };
        let copy = cp.clone();
        assert_eq!(copy.step_name, "retrieve_passages");
        assert_eq!(copy.state, 42);
        assert_eq!(copy.seq, 3);
    }
}
