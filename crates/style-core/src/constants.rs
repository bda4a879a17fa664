//! Constantes del motor core.
//!
//! Algunos valores participan en el cálculo de fingerprints (`ENGINE_VERSION`)
//! y cambiarlos invalida la comparación entre ejecuciones registradas.

/// Versión lógica del motor. Entra en el fingerprint de cada stage y del run.
pub const ENGINE_VERSION: &str = "S1.0";

/// Valor comodín usado por el tier intermedio de las tablas de conocimiento.
pub const WILDCARD_TOKEN: &str = "ALL";

/// Tope de iteraciones usado cuando la configuración no indica otro.
pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

/// Campo del crítico que transporta la lista de observaciones.
pub const DEFAULT_CRITIQUE_FIELD: &str = "feedback";

/// Claves que el controlador de iteración agrega al input de los workers.
pub const FEEDBACK_KEY: &str = "feedback";
pub const PREVIOUS_DRAFT_KEY: &str = "previous_draft";
pub const DRAFT_KEY: &str = "draft";

/// Nombres que ninguna variable de contexto ni stage puede usar.
pub const RESERVED_NAMES: &[&str] = &[FEEDBACK_KEY, PREVIOUS_DRAFT_KEY, DRAFT_KEY];
