use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use thiserror::Error;

use crate::errors::WorkerError;
use crate::model::{Payload, Schema};

/// Resultado tipado de una invocación: payload validado o error clasificado.
pub type WorkerResult = Result<Payload, WorkerError>;

/// Fallo de transporte reportado por un `Worker`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkerFault {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    Transport(String),
}

/// Capacidad externa de generación. Llamada síncrona.
pub trait Worker: Send + Sync {
    fn call(&self, role: &str, input: &Payload) -> Result<String, WorkerFault>;
}

/// Declaración de un rol: nombre + contrato de entrada y salida.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    pub input: Schema,
    pub output: Schema,
}

impl Role {
    pub fn new(name: impl Into<String>, input: Schema, output: Schema) -> Self {
        Self { name: name.into(),
               input,
               output }
    }
}

/// Rol ligado a un worker concreto.
#[derive(Clone)]
pub struct WorkerInvoker {
    role: Role,
    worker: Arc<dyn Worker>,
}

impl fmt::Debug for WorkerInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerInvoker").field("role", &self.role.name).finish()
    }
}

impl WorkerInvoker {
    pub fn new(role: Role, worker: Arc<dyn Worker>) -> Self {
        Self { role, worker }
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn output_schema(&self) -> &Schema {
        &self.role.output
    }

    /// Valida el input, llama al worker y valida el output. Nunca sustituye
    /// un valor por defecto ante un fallo.
    pub fn invoke(&self, input: &Payload) -> WorkerResult {
        let role = &self.role.name;
        self.role
            .input
            .validate(input)
            .map_err(|v| WorkerError::SchemaViolation { role: role.clone(),
                                                        reason: format!("input rejected: {v}") })?;
        debug!("invoking role '{}'", role);
        let raw = self.worker
                      .call(role, input)
                      .map_err(|f| WorkerError::InvocationFailure { role: role.clone(),
                                                                    reason: f.to_string() })?;
        self.role
            .output
            .parse(&raw)
            .map_err(|v| WorkerError::SchemaViolation { role: role.clone(),
                                                        reason: v.to_string() })
    }
}
