//! Resultado de un run: éxito con contexto final o fallo con contexto
//! parcial.
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{ErrorKind, StageError};
use crate::model::WorkflowContext;

/// Por qué un stage quedó marcado para revisión humana.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewReason {
    /// El crítico nunca devolvió una crítica vacía.
    Exhausted { producer_calls: u32, last_critique: Vec<String> },
    /// El gate de aprobación rechazó un borrador aceptado por el crítico.
    Rejected { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewFlag {
    pub stage_id: String,
    pub reason: ReviewReason,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub context: WorkflowContext,
    /// Valor de la clave de resultado del grafo.
    pub result: Value,
    pub reviews: Vec<ReviewFlag>,
    pub flow_fingerprint: String,
}

impl RunOutcome {
    pub fn needs_review(&self) -> bool {
        !self.reviews.is_empty()
    }

    /// Resultado como texto (string tal cual, otros valores como JSON).
    pub fn result_text(&self) -> String {
        match &self.result {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Run detenido. `stage_id` es `None` si falló antes del primer stage.
#[derive(Debug, Clone)]
pub struct RunFailure {
    pub run_id: Uuid,
    pub stage_id: Option<String>,
    pub error: StageError,
    pub context: WorkflowContext,
}

impl RunFailure {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.stage_id {
            Some(stage) => write!(f, "run {} failed at stage '{}' ({}): {}", self.run_id, stage, self.kind(), self.error),
            None => write!(f, "run {} failed before the first stage ({}): {}", self.run_id, self.kind(), self.error),
        }
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
