//! Resolución de conocimiento de referencia con fallback por tiers.
//!
//! Rol en el flujo:
//! - Antes del primer stage se resuelven las pautas base (categoría +
//!   tipo de producto) y las restricciones legales (dominio).
//! - Cada `KnowledgeKey` es una lista ordenada de tiers; gana el primero con
//!   contenido no vacío y si ninguno tiene contenido el resultado es `""`.
//! - El resolver es de sólo lectura y se comparte entre runs concurrentes.
pub mod key;
pub mod memory;
pub mod resolver;

pub use key::{KnowledgeKey, KnowledgeKind, Selector, TierKey};
pub use memory::InMemoryKnowledgeSource;
pub use resolver::{KnowledgeResolver, KnowledgeSource, Resolution};
