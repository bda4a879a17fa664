//! Styleflow Rust Library
//!
//! Este crate expone la capa de aplicación sobre los crates del workspace:
//! - `config`: configuración `STYLEFLOW_*` desde el entorno.
//! - `errors`: errores de configuración y del servicio.
//! - `service`: disparador del workflow (documento completo o por campo).
//!
//! Puede usarse desde `main.rs` o por otros crates/clientes.

pub mod config;
pub mod errors;
pub mod service;

pub use config::{AppConfig, RunMode};
pub use errors::{ConfigError, FieldFailure, ServiceError};
pub use service::{GeneratedGuide, GenerationRequest, StyleGuideService};
