//! Compiled graph: immutable executor over a validated definition.
//!
//! Drives one run from the entry step to the terminal marker: resolves the
//! next frontier from edges and routers, executes frontier members
//! (concurrently when their output channels are disjoint), merges partial
//! updates, and appends a checkpoint after every merge.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;

use crate::error::RunError;
use crate::memory::{RunConfig, StateStore};
use crate::state::GraphState;

use super::conditional::ConditionalRouter;
use super::logging::{
    log_checkpoint, log_run_complete, log_run_error, log_run_start, log_step_complete,
    log_step_skip, log_step_start,
};
use super::state_graph::END;
use super::step::Step;

/// Immutable executor produced by `GraphDefinition::compile`.
///
/// One instance serves any number of runs; runs for distinct thread ids are
/// fully independent. The only shared mutable resource is the optional
/// checkpoint store, which serializes appends per thread itself.
#[derive(Clone)]
pub struct CompiledGraph<S: GraphState> {
    steps: HashMap<String, Arc<dyn Step<S>>>,
    entry: String,
    edges: HashMap<String, Vec<String>>,
    routers: HashMap<String, ConditionalRouter<S>>,
    store: Option<Arc<dyn StateStore<S>>>,
}

impl<S: GraphState> CompiledGraph<S> {
    pub(super) fn new(
        steps: HashMap<String, Arc<dyn Step<S>>>,
        entry: String,
        edges: HashMap<String, Vec<String>>,
        routers: HashMap<String, ConditionalRouter<S>>,
        store: Option<Arc<dyn StateStore<S>>>,
    ) -> Self {
        Self {
            steps,
            entry,
            edges,
            routers,
            store,
        }
    }

    /// The checkpoint store, when compiled with one.
    pub fn store(&self) -> Option<&Arc<dyn StateStore<S>>> {
        self.store.as_ref()
    }

    /// Runs the graph from the entry step with the given initial state.
    ///
    /// When `config` carries a thread id and the graph was compiled with a
    /// store, a checkpoint is appended after every step merge; a store
    /// failure aborts the run. Pass `None` to run without persistence.
    pub async fn invoke(&self, state: S, config: Option<RunConfig>) -> Result<S, RunError> {
        let config = config.unwrap_or_default();
        self.run_loop(state, vec![self.entry.clone()], &config)
            .await
    }

    /// Continues an interrupted run for the given thread.
    ///
    /// Loads the latest checkpoint and re-derives the frontier from the
    /// `current_step` recorded in the snapshot: not from the entry step.
    /// Returns the loaded state unchanged when the recorded run had already
    /// reached the terminal marker.
    pub async fn resume(&self, config: RunConfig) -> Result<S, RunError> {
        let store = self.store.as_ref().ok_or(RunError::StoreNotConfigured)?;
        let thread_id = config
            .thread_id
            .clone()
            .ok_or(RunError::StoreNotConfigured)?;
        let checkpoint = store
            .load(&thread_id)
            .await?
            .ok_or(RunError::NoCheckpoint {
                thread_id: thread_id.clone(),
            })?;

        let state = checkpoint.state;
        let frontier = match state.current_step() {
            Some(step) if self.steps.contains_key(step) => {
                tracing::info!(thread_id = %thread_id, from = step, "resuming run");
                self.resolve_targets(step, &state)?
            }
            _ => vec![self.entry.clone()],
        };
        let frontier: Vec<String> = frontier.into_iter().filter(|t| t != END).collect();
        if frontier.is_empty() {
            return Ok(state);
        }
        self.run_loop(state, frontier, &config).await
    }

    /// Shared run loop: executes frontiers until one resolves to END.
    async fn run_loop(
        &self,
        mut state: S,
        mut frontier: Vec<String>,
        config: &RunConfig,
    ) -> Result<S, RunError> {
        log_run_start();

        loop {
            let steps: Vec<Arc<dyn Step<S>>> = frontier
                .iter()
                .map(|name| {
                    self.steps
                        .get(name)
                        .expect("compiled graph has all frontier steps")
                        .clone()
                })
                .collect();

            // Execute the whole frontier before merging anything: the merge
            // barrier is what makes unordered branch completion safe.
            let updates: Vec<S::Update> = if steps.len() > 1 && outputs_disjoint(&steps) {
                join_all(steps.iter().map(|step| run_step(step.as_ref(), &state))).await
            } else {
                let mut out = Vec::with_capacity(steps.len());
                for step in &steps {
                    out.push(run_step(step.as_ref(), &state).await);
                }
                out
            };

            for (name, update) in frontier.iter().zip(updates) {
                state.apply(update);
                if let (Some(store), Some(thread_id)) =
                    (&self.store, config.thread_id.as_deref())
                {
                    let seq = match store.append(thread_id, name, &state).await {
                        Ok(seq) => seq,
                        Err(e) => {
                            let err = RunError::from(e);
                            log_run_error(&err);
                            return Err(err);
                        }
                    };
                    log_checkpoint(name, seq);
                }
            }

            let mut next: Vec<String> = Vec::new();
            for name in &frontier {
                for target in self.resolve_targets(name, &state)? {
                    if !next.contains(&target) {
                        next.push(target);
                    }
                }
            }

            if next.iter().all(|t| t == END) {
                log_run_complete();
                return Ok(state);
            }
            // A finished branch does not end the run while others continue.
            next.retain(|t| t != END);
            frontier = next;
        }
    }

    /// Outgoing target(s) of a step against the current merged state.
    fn resolve_targets(&self, step: &str, state: &S) -> Result<Vec<String>, RunError> {
        if let Some(router) = self.routers.get(step) {
            let label = router.label(state);
            let target = router.target(&label).ok_or_else(|| {
                let err = RunError::Routing {
                    step: step.to_string(),
                    label: label.clone(),
                };
                log_run_error(&err);
                err
            })?;
            tracing::debug!(from = step, label = %label, to = %target, "conditional routing");
            Ok(vec![target])
        } else {
            Ok(self
                .edges
                .get(step)
                .expect("validated graph has a route for every step")
                .clone())
        }
    }
}

/// Runs one step, honoring its applicability predicate.
async fn run_step<S: GraphState>(step: &dyn Step<S>, state: &S) -> S::Update {
    if step.is_applicable(state) {
        log_step_start(step.name());
        let update = step.execute(state).await;
        log_step_complete(step.name());
        update
    } else {
        log_step_skip(step.name());
        step.skip(state)
    }
}

/// True when every step declares output channels and the sets are pairwise
/// disjoint: the contract that makes concurrent branch execution safe.
fn outputs_disjoint<S: GraphState>(steps: &[Arc<dyn Step<S>>]) -> bool {
    let mut seen: HashSet<&str> = HashSet::new();
    for step in steps {
        let channels = step.output_channels();
        if channels.is_empty() {
            return false;
        }
        for channel in channels {
            if !seen.insert(channel) {
                return false;
            }
        }
    }
    true
}
