//! Graph engine: definition, validation, and the run loop.

mod compiled;
mod conditional;
mod logging;
mod state_graph;
mod step;

pub use compiled::CompiledGraph;
pub use conditional::{ConditionalRouter, RouterFn};
pub use state_graph::{GraphDefinition, GraphValidationError, END, START};
pub use step::Step;
