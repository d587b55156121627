//! Conditional edges: route to the next step based on state.
//!
//! A source step carries a routing function that maps the current merged
//! state to a label; the label is looked up in a total label→target map.
//! Targets may include the terminal marker and the source itself (self-loop).
//!
//! **Interaction**: built by `GraphDefinition::add_conditional_edges`, used
//! by the `CompiledGraph` run loop to resolve the next frontier.

use std::collections::HashMap;
use std::sync::Arc;

/// Routing function: state in, label out.
///
/// Must be deterministic and side-effect-free; it may run several times
/// against the same state (e.g. a join gate re-evaluated per branch
/// completion).
pub type RouterFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// Conditional edge definition: routing function plus its label→target map.
///
/// Unlike an id-passthrough router, the map is mandatory: a label absent from
/// it is a fatal routing error at run time, never an implicit node id.
#[derive(Clone)]
pub struct ConditionalRouter<S> {
    path: RouterFn<S>,
    path_map: HashMap<String, String>,
}

impl<S> ConditionalRouter<S> {
    pub fn new(path: RouterFn<S>, path_map: HashMap<String, String>) -> Self {
        Self { path, path_map }
    }

    /// Evaluates the routing function against the current state.
    pub fn label(&self, state: &S) -> String {
        (self.path)(state)
    }

    /// Looks the label up in the target map.
    pub fn target(&self, label: &str) -> Option<String> {
        self.path_map.get(label).cloned()
    }

    /// All mapped targets; used by graph validation.
    pub fn targets(&self) -> impl Iterator<Item = &String> {
        self.path_map.values()
    }
}
