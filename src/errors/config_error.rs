use thiserror::Error;

/// Errores al leer la configuración de la aplicación.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Valor inválido para {key}: '{value}'")]
    Invalid { key: String, value: String },
    #[error("Error de configuración: {0}")]
    Other(String),
}
