use style_core::{ContextError, ErrorKind, GraphError, RunFailure};
use thiserror::Error;

use crate::service::GeneratedGuide;

/// Campo que no pudo generarse en modo por campo.
#[derive(Debug)]
pub struct FieldFailure {
    pub field: String,
    pub error: ServiceError,
}

/// Errores del servicio de generación.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Petición inválida: {0}")]
    InvalidRequest(String),
    #[error("Grafo inválido: {0}")]
    Graph(#[from] GraphError),
    #[error("Contexto inválido: {0}")]
    Context(#[from] ContextError),
    #[error(transparent)]
    Run(Box<RunFailure>),
    /// Los campos que sí terminaron ya están publicados en `published`.
    #[error("Fallaron {} campo(s): {}", .failures.len(), field_list(.failures))]
    FieldsFailed {
        published: Vec<GeneratedGuide>,
        failures: Vec<FieldFailure>,
    },
}

fn field_list(failures: &[FieldFailure]) -> String {
    failures.iter()
            .map(|f| format!("{} ({})", f.field, f.error))
            .collect::<Vec<_>>()
            .join("; ")
}

impl From<RunFailure> for ServiceError {
    fn from(f: RunFailure) -> Self {
        ServiceError::Run(Box::new(f))
    }
}

impl ServiceError {
    /// Clase del error del run; `None` si el run ni siquiera empezó.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ServiceError::Run(f) => Some(f.kind()),
            ServiceError::FieldsFailed { failures, .. } => failures.first().and_then(|f| f.error.kind()),
            _ => None,
        }
    }

    /// Stage donde se detuvo el run, si lo hubo.
    pub fn failed_stage(&self) -> Option<&str> {
        match self {
            ServiceError::Run(f) => f.stage_id.as_deref(),
            ServiceError::FieldsFailed { failures, .. } => failures.first().and_then(|f| f.error.failed_stage()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_format() {
        let err = ServiceError::InvalidRequest("category vacía".into());
        assert_eq!(err.to_string(), "Petición inválida: category vacía");
        assert_eq!(err.kind(), None);
    }

    #[test]
    fn test_graph_variant_from() {
        let err: ServiceError = GraphError::Empty.into();
        assert_eq!(err.to_string(), "Grafo inválido: stage graph has no stages");
    }

    #[test]
    fn test_fields_failed_lists_each_field() {
        let err = ServiceError::FieldsFailed { published: Vec::new(),
                                               failures: vec![FieldFailure { field: "longDesc".into(),
                                                                             error: ServiceError::InvalidRequest("x".into()) }] };
        assert_eq!(err.to_string(), "Fallaron 1 campo(s): longDesc (Petición inválida: x)");
        assert_eq!(err.kind(), None);
    }
}
