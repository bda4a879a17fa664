//! Errores de la aplicación (configuración y servicio de generación).
pub mod config_error;
pub mod service_error;

pub use config_error::ConfigError;
pub use service_error::{FieldFailure, ServiceError};
