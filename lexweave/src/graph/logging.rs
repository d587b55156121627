//! Structured logging for run and step lifecycle events.

/// Log run start.
pub fn log_run_start() {
    tracing::info!("starting graph run");
}

/// Log step execution start.
pub fn log_step_start(step: &str) {
    tracing::debug!(step = step, "executing step");
}

/// Log that the scheduler took a step's skip path.
pub fn log_step_skip(step: &str) {
    tracing::debug!(step = step, "step not applicable, taking skip path");
}

/// Log step completion.
pub fn log_step_complete(step: &str) {
    tracing::debug!(step = step, "step complete");
}

/// Log a checkpoint append.
pub fn log_checkpoint(step: &str, seq: u64) {
    tracing::debug!(step = step, seq = seq, "checkpoint appended");
}

/// Log run completion.
pub fn log_run_complete() {
    tracing::info!("graph run complete");
}

/// Log a fatal run error.
pub fn log_run_error(error: &crate::error::RunError) {
    tracing::error!(?error, "graph run failed");
}
