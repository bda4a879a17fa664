//! Repositorios: sink de artifacts y replay del estado de un run.
//!
//! - `ArtifactStore`: append-only, nunca actualiza ni borra.
//! - `RunSnapshot::replay`: consume los eventos de un run en orden y
//!   reconstruye el estado de cada stage.
pub mod artifact_store;
pub mod replay;

pub use artifact_store::{ArtifactStore, InMemoryArtifactStore};
pub use replay::{RunSnapshot, StageSlot};
