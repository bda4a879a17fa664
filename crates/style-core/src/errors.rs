//! Errores del core.
//!
//! Cada tipo cubre una frontera distinta:
//! - `WorkerError`: lo que devuelve un `WorkerInvoker` (schema o transporte).
//! - `StageError`: por qué se detuvo un stage (incluye cancelación).
//! - `GraphError`: errores de configuración detectados al construir el grafo.
//! - `ContextError`: violaciones de las reglas de escritura del contexto.
//! - `KnowledgeError`: fallos del almacén de referencia (nunca llegan al
//!   caller de `resolve`).
//! - `PersistenceFailure`: el sink de artifacts no pudo guardar.
//!
//! Los errores que viajan dentro de eventos derivan `Serialize`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Clasificación estable que se reporta al usuario junto al stage fallido.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    SchemaViolation,
    InvocationFailure,
    PersistenceFailure,
    Cancelled,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::SchemaViolation => "SchemaViolation",
            ErrorKind::InvocationFailure => "InvocationFailure",
            ErrorKind::PersistenceFailure => "PersistenceFailure",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::Internal => "Internal",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum WorkerError {
    #[error("schema violation in role '{role}': {reason}")]
    SchemaViolation { role: String, reason: String },
    #[error("invocation failure in role '{role}': {reason}")]
    InvocationFailure { role: String, reason: String },
}

impl WorkerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkerError::SchemaViolation { .. } => ErrorKind::SchemaViolation,
            WorkerError::InvocationFailure { .. } => ErrorKind::InvocationFailure,
        }
    }

    pub fn role(&self) -> &str {
        match self {
            WorkerError::SchemaViolation { role, .. } | WorkerError::InvocationFailure { role, .. } => role,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum StageError {
    #[error(transparent)]
    Worker(#[from] WorkerError),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("run cancelled")]
    Cancelled,
    #[error("internal: {0}")]
    Internal(String),
}

impl StageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StageError::Worker(w) => w.kind(),
            StageError::Context(c) => c.kind(),
            StageError::Cancelled => ErrorKind::Cancelled,
            StageError::Internal(_) => ErrorKind::Internal,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum GraphError {
    #[error("stage graph has no stages")]
    Empty,
    #[error("duplicate stage id '{0}'")]
    DuplicateStage(String),
    #[error("name '{0}' is reserved")]
    ReservedName(String),
    #[error("stage id '{0}' is also a context variable name")]
    StageShadowsVar(String),
    #[error("stage '{stage}' depends on unknown stage '{upstream}'")]
    UnknownUpstream { stage: String, upstream: String },
    #[error("stage '{stage}' depends on '{upstream}', which is not declared earlier")]
    UpstreamNotEarlier { stage: String, upstream: String },
    #[error("variable '{var}' appended by stage '{stage}' is already written by '{other}'")]
    AppendCollision { var: String, stage: String, other: String },
    #[error("stage '{stage}' appends '{field}', which is not in its output schema")]
    AppendNotInSchema { stage: String, field: String },
    #[error("result key '{0}' does not name a declared stage field")]
    UnknownResult(String),
    #[error("no result key configured")]
    MissingResult,
    #[error("iteration stage '{stage}' needs a cap >= 1 (got {cap})")]
    InvalidIterationCap { stage: String, cap: u32 },
    #[error("critic of stage '{stage}' does not declare text-list field '{field}'")]
    MissingCritiqueField { stage: String, field: String },
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum ContextError {
    #[error("context variable '{0}' is already set")]
    Collision(String),
    #[error("context name '{0}' is reserved")]
    Reserved(String),
    #[error("missing required context variable '{0}'")]
    MissingVar(String),
    #[error("stage '{0}' already merged its output")]
    StageAlreadyMerged(String),
    #[error("context is sealed; cannot set '{0}'")]
    Sealed(String),
}

impl ContextError {
    /// Una variable semilla ausente es un input inválido; el resto son
    /// configuraciones que el builder no pudo ver.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ContextError::MissingVar(_) => ErrorKind::SchemaViolation,
            _ => ErrorKind::Internal,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum KnowledgeError {
    #[error("knowledge source '{source_name}' unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },
}

/// Fallo del sink de artifacts. No invalida el resultado en memoria.
#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[error("persistence failure: {reason}")]
pub struct PersistenceFailure {
    pub reason: String,
}

impl PersistenceFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::PersistenceFailure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_error_kind_follows_worker_error() {
        let e: StageError = WorkerError::InvocationFailure { role: "writer".into(),
                                                             reason: "timeout".into() }.into();
        assert_eq!(e.kind(), ErrorKind::InvocationFailure);
        assert_eq!(e.to_string(), "invocation failure in role 'writer': timeout");
        assert_eq!(StageError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn stage_error_roundtrips_through_json() {
        let e = StageError::Worker(WorkerError::SchemaViolation { role: "critic".into(),
                                                                  reason: "missing field 'feedback'".into() });
        let v = serde_json::to_value(&e).unwrap();
        let back: StageError = serde_json::from_value(v).unwrap();
        assert_eq!(back, e);
    }
}
