//! Graph definition: mutable builder, validated once into a CompiledGraph.
//!
//! Steps are registered under their own names; edges are either unconditional
//! (several from one source form a fan-out) or conditional (a router plus a
//! total label→target map). Validation runs in `compile`, before any run.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use thiserror::Error;

use crate::memory::StateStore;
use crate::state::GraphState;

use super::compiled::CompiledGraph;
use super::conditional::{ConditionalRouter, RouterFn};
use super::step::Step;

/// Virtual source marking the entry edge.
pub const START: &str = "__start__";
/// Terminal marker; a frontier resolving to it ends the run.
pub const END: &str = "__end__";

/// Malformed graph detected at build time. Prevents the engine from starting.
#[derive(Debug, Error)]
pub enum GraphValidationError {
    #[error("graph has no entry step; add an edge from START")]
    MissingEntry,

    #[error("graph declares more than one entry step: {0:?}")]
    MultipleEntries(Vec<String>),

    #[error("edge references undeclared step {step:?}")]
    UnknownStep { step: String },

    #[error("step {step:?} has both unconditional and conditional edges")]
    ConflictingEdges { step: String },

    #[error("step {step:?} has no outgoing route")]
    MissingRoute { step: String },

    #[error("step {step:?} is unreachable from the entry step")]
    UnreachableStep { step: String },

    #[error("terminal marker is unreachable from step {step:?}")]
    NoTerminalPath { step: String },
}

/// Mutable graph builder.
///
/// **Interaction**: `compile()` / `compile_with_store()` validate and produce
/// the immutable `CompiledGraph` executor.
pub struct GraphDefinition<S: GraphState> {
    steps: HashMap<String, Arc<dyn Step<S>>>,
    /// Registration order; keeps validation output deterministic.
    order: Vec<String>,
    /// Targets of edges from START. Validation requires exactly one.
    entries: Vec<String>,
    edges: HashMap<String, Vec<String>>,
    routers: HashMap<String, ConditionalRouter<S>>,
}

impl<S: GraphState> GraphDefinition<S> {
    pub fn new() -> Self {
        Self {
            steps: HashMap::new(),
            order: Vec::new(),
            entries: Vec::new(),
            edges: HashMap::new(),
            routers: HashMap::new(),
        }
    }

    /// Registers a step under its own name. A later registration with the
    /// same name replaces the earlier one.
    pub fn add_step(&mut self, step: Arc<dyn Step<S>>) -> &mut Self {
        let name = step.name().to_string();
        if self.steps.insert(name.clone(), step).is_none() {
            self.order.push(name);
        }
        self
    }

    /// Adds an unconditional edge. `START` as source declares the entry;
    /// several edges from one source form a fan-out frontier.
    pub fn add_edge(&mut self, from: &str, to: &str) -> &mut Self {
        if from == START {
            self.entries.push(to.to_string());
        } else {
            self.edges
                .entry(from.to_string())
                .or_default()
                .push(to.to_string());
        }
        self
    }

    /// Adds a conditional edge: router plus total label→target map. Targets
    /// may include `END` and the source itself (self-loop).
    pub fn add_conditional_edges(
        &mut self,
        from: &str,
        path: RouterFn<S>,
        path_map: HashMap<String, String>,
    ) -> &mut Self {
        self.routers
            .insert(from.to_string(), ConditionalRouter::new(path, path_map));
        self
    }

    /// All outgoing targets of a step, across both edge kinds.
    fn targets_of(&self, step: &str) -> Vec<&String> {
        let mut out: Vec<&String> = Vec::new();
        if let Some(ts) = self.edges.get(step) {
            out.extend(ts.iter());
        }
        if let Some(router) = self.routers.get(step) {
            out.extend(router.targets());
        }
        out
    }

    fn validate(&self) -> Result<String, GraphValidationError> {
        let entry = match self.entries.as_slice() {
            [] => return Err(GraphValidationError::MissingEntry),
            [one] => one.clone(),
            many => return Err(GraphValidationError::MultipleEntries(many.to_vec())),
        };
        if !self.steps.contains_key(&entry) {
            return Err(GraphValidationError::UnknownStep { step: entry });
        }

        for name in &self.order {
            if self.edges.contains_key(name) && self.routers.contains_key(name) {
                return Err(GraphValidationError::ConflictingEdges { step: name.clone() });
            }
            if self.targets_of(name).is_empty() {
                return Err(GraphValidationError::MissingRoute { step: name.clone() });
            }
        }
        for source in self.edges.keys().chain(self.routers.keys()) {
            if !self.steps.contains_key(source) {
                return Err(GraphValidationError::UnknownStep {
                    step: source.clone(),
                });
            }
        }
        for name in &self.order {
            for target in self.targets_of(name) {
                if target != END && !self.steps.contains_key(target) {
                    return Err(GraphValidationError::UnknownStep {
                        step: target.clone(),
                    });
                }
            }
        }

        // Forward reachability from the entry.
        let mut reached: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([entry.as_str()]);
        while let Some(step) = queue.pop_front() {
            if step == END || !reached.insert(step) {
                continue;
            }
            for target in self.targets_of(step) {
                queue.push_back(target.as_str());
            }
        }
        for name in &self.order {
            if !reached.contains(name.as_str()) {
                return Err(GraphValidationError::UnreachableStep { step: name.clone() });
            }
        }

        // Every step must have a forward path to END (reverse reachability).
        let mut can_end: HashSet<&str> = HashSet::new();
        loop {
            let mut grew = false;
            for name in &self.order {
                if can_end.contains(name.as_str()) {
                    continue;
                }
                let reaches = self
                    .targets_of(name)
                    .iter()
                    .any(|t| *t == END || can_end.contains(t.as_str()));
                if reaches {
                    can_end.insert(name.as_str());
                    grew = true;
                }
            }
            if !grew {
                break;
            }
        }
        for name in &self.order {
            if !can_end.contains(name.as_str()) {
                return Err(GraphValidationError::NoTerminalPath { step: name.clone() });
            }
        }

        Ok(entry)
    }

    /// Validates and freezes the definition into an executor.
    pub fn compile(self) -> Result<CompiledGraph<S>, GraphValidationError> {
        let entry = self.validate()?;
        Ok(CompiledGraph::new(
            self.steps,
            entry,
            self.edges,
            self.routers,
            None,
        ))
    }

    /// Like `compile`, with a checkpoint store: runs given a thread id
    /// persist a snapshot after every step merge.
    pub fn compile_with_store(
        self,
        store: Arc<dyn StateStore<S>>,
    ) -> Result<CompiledGraph<S>, GraphValidationError> {
        let entry = self.validate()?;
        Ok(CompiledGraph::new(
            self.steps,
            entry,
            self.edges,
            self.routers,
            Some(store),
        ))
    }
}

impl<S: GraphState> Default for GraphDefinition<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Debug, Clone, Default)]
    struct Unit;

    impl GraphState for Unit {
        type Update = ();
        fn apply(&mut self, _update: ()) {}
    }

    struct Noop(&'static str);

    #[async_trait]
    impl Step<Unit> for Noop {
        fn name(&self) -> &str {
            self.0
        }
        async fn execute(&self, _state: &Unit) {}
    }

    fn graph_with(names: &[&'static str]) -> GraphDefinition<Unit> {
        let mut graph = GraphDefinition::new();
        for name in names {
            graph.add_step(Arc::new(Noop(name)));
        }
        graph
    }

    /// **Scenario**: a well-formed linear graph compiles.
    #[test]
    fn linear_graph_compiles() {
        let mut graph = graph_with(&["a", "b"]);
        graph.add_edge(START, "a").add_edge("a", "b").add_edge("b", END);
        assert!(graph.compile().is_ok());
    }

    /// **Scenario**: no START edge → MissingEntry.
    #[test]
    fn missing_entry_rejected() {
        let mut graph = graph_with(&["a"]);
        graph.add_edge("a", END);
        assert!(matches!(
            graph.compile(),
            Err(GraphValidationError::MissingEntry)
        ));
    }

    /// **Scenario**: two START edges → MultipleEntries.
    #[test]
    fn multiple_entries_rejected() {
        let mut graph = graph_with(&["a", "b"]);
        graph
            .add_edge(START, "a")
            .add_edge(START, "b")
            .add_edge("a", END)
            .add_edge("b", END);
        assert!(matches!(
            graph.compile(),
            Err(GraphValidationError::MultipleEntries(_))
        ));
    }

    /// **Scenario**: edge to an undeclared step → UnknownStep (dangling edge).
    #[test]
    fn dangling_edge_rejected() {
        let mut graph = graph_with(&["a"]);
        graph.add_edge(START, "a").add_edge("a", "ghost");
        assert!(matches!(
            graph.compile(),
            Err(GraphValidationError::UnknownStep { step }) if step == "ghost"
        ));
    }

    /// **Scenario**: conditional path-map target undeclared → UnknownStep.
    #[test]
    fn dangling_router_target_rejected() {
        let mut graph = graph_with(&["a"]);
        graph.add_edge(START, "a");
        graph.add_conditional_edges(
            "a",
            Arc::new(|_: &Unit| "go".into()),
            [("go".to_string(), "ghost".to_string())].into_iter().collect(),
        );
        assert!(matches!(
            graph.compile(),
            Err(GraphValidationError::UnknownStep { step }) if step == "ghost"
        ));
    }

    /// **Scenario**: a step with both edge kinds → ConflictingEdges.
    #[test]
    fn conflicting_edge_kinds_rejected() {
        let mut graph = graph_with(&["a", "b"]);
        graph
            .add_edge(START, "a")
            .add_edge("a", "b")
            .add_edge("b", END);
        graph.add_conditional_edges(
            "a",
            Arc::new(|_: &Unit| "x".into()),
            [("x".to_string(), END.to_string())].into_iter().collect(),
        );
        assert!(matches!(
            graph.compile(),
            Err(GraphValidationError::ConflictingEdges { step }) if step == "a"
        ));
    }

    /// **Scenario**: declared step never wired in → UnreachableStep.
    #[test]
    fn unreachable_step_rejected() {
        let mut graph = graph_with(&["a", "island"]);
        graph.add_edge(START, "a").add_edge("a", END).add_edge("island", END);
        assert!(matches!(
            graph.compile(),
            Err(GraphValidationError::UnreachableStep { step }) if step == "island"
        ));
    }

    /// **Scenario**: a cycle with no exit to END → NoTerminalPath.
    #[test]
    fn cycle_without_exit_rejected() {
        let mut graph = graph_with(&["a", "b"]);
        graph
            .add_edge(START, "a")
            .add_edge("a", "b")
            .add_edge("b", "a");
        assert!(matches!(
            graph.compile(),
            Err(GraphValidationError::NoTerminalPath { .. })
        ));
    }

    /// **Scenario**: a step with no outgoing edge at all → MissingRoute.
    #[test]
    fn missing_route_rejected() {
        let mut graph = graph_with(&["a", "b"]);
        graph.add_edge(START, "a").add_edge("a", "b");
        assert!(matches!(
            graph.compile(),
            Err(GraphValidationError::MissingRoute { step }) if step == "b"
        ));
    }

    /// **Scenario**: a self-loop with a forward exit is valid (join-gate shape).
    #[test]
    fn self_loop_with_exit_compiles() {
        let mut graph = graph_with(&["gate", "next"]);
        graph.add_edge(START, "gate").add_edge("next", END);
        graph.add_conditional_edges(
            "gate",
            Arc::new(|_: &Unit| "wait".into()),
            [
                ("wait".to_string(), "gate".to_string()),
                ("continue".to_string(), "next".to_string()),
            ]
            .into_iter()
            .collect(),
        );
        assert!(graph.compile().is_ok());
    }
}
