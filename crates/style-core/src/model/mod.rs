//! Modelos neutrales (schema, payload tipado, contexto, artifact).

pub mod artifact;
pub mod context;
pub mod schema;
pub mod typed_payload;

pub use artifact::{Artifact, ArtifactId, PendingArtifact};
pub use context::{ContextKey, WorkflowContext};
pub use schema::{FieldKind, FieldSpec, Payload, Schema, SchemaViolation};
pub use typed_payload::PayloadSpec;
