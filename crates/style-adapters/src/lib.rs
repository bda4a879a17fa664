//! style-adapters: dominio "guía de estilo" sobre `style-core`.
//!
//! Define los payloads y roles de cada stage, los grafos documento/campo, la
//! inyección de conocimiento y los workers concretos (stub y proceso
//! externo).
pub mod injectors;
pub mod payloads;
pub mod roles;
pub mod stages;
pub mod workers;

pub use injectors::{knowledge_injectors, KnowledgeInjector};
pub use stages::{field_guide_graph, style_guide_graph};
pub use workers::{CommandWorker, StubWorker};
