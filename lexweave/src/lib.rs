//! LexWeave: durable verdict pipelines with state-in, state-out graphs.
//!
//! The engine (`graph`, `memory`, `state`) runs named steps over shared
//! typed state with conditional routing, parallel fan-out, a bounded review
//! loop, and a checkpoint after every step merge. The verdict pipeline
//! (`verdict`, `collab`, `service`) builds a cited legal verdict on top of
//! it; every external call goes through the injected capability bundle.

pub mod collab;
pub mod config;
pub mod error;
pub mod graph;
pub mod memory;
pub mod message;
pub mod service;
pub mod state;
pub mod verdict;

pub use collab::Capabilities;
pub use config::PipelineConfig;
pub use error::RunError;
pub use graph::{CompiledGraph, GraphDefinition, GraphValidationError, Step, END, START};
pub use memory::{Checkpoint, MemoryStore, RunConfig, SqliteStore, StateStore, StoreError};
pub use message::{ChatMessage, MessageOp, Role};
pub use service::{
    RunRequest, RunResponse, SummariseRequest, SummariseResponse, VerdictReport, VerdictService,
};
pub use state::{GraphState, VerdictState, VerdictUpdate};
pub use verdict::build_verdict_graph;
