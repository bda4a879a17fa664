//! Bucle productor/crítico acotado.
//!
//! Estados: `Drafting → Validating → {Approved | Revising}`, y desde
//! `Revising` de vuelta a `Drafting` o a `Exhausted` cuando se alcanza el
//! tope. Una crítica vacía es la única señal de aceptación; el tope limita
//! llamadas al productor, no transiciones.
pub mod controller;
pub mod state;

pub use controller::{IterationController, IterationReport, IterationRound, IterationSpec};
pub use state::{IterationOutcome, IterationPhase, IterationState};
