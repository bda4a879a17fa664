//! Executor del grafo de stages.
//!
//! Provee el builder validado (`StageGraphBuilder`), el executor secuencial
//! y los tipos de resultado de un run.

pub mod builder;
pub mod core;
pub mod outcome;

pub use builder::{StageGraph, StageGraphBuilder};
pub use core::StageExecutor;
pub use outcome::{ReviewFlag, ReviewReason, RunFailure, RunOutcome};

pub use crate::event::{EventStore, FlowEvent, FlowEventKind, InMemoryEventStore};
pub use crate::repo::RunSnapshot;
