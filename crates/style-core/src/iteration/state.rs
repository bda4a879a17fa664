//! Máquina de estados pura del bucle de iteración (sin I/O).
use serde::{Deserialize, Serialize};

use crate::errors::StageError;
use crate::model::Payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IterationPhase {
    Drafting,
    Validating,
    Revising,
    Approved,
    Exhausted,
}

impl IterationPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, IterationPhase::Approved | IterationPhase::Exhausted)
    }
}

/// Resultado terminal. `Exhausted` no es un error: lleva el último borrador
/// y se reporta como parcial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IterationOutcome {
    Approved { draft: Payload },
    Exhausted { draft: Payload },
}

impl IterationOutcome {
    pub fn draft(&self) -> &Payload {
        match self {
            IterationOutcome::Approved { draft } | IterationOutcome::Exhausted { draft } => draft,
        }
    }

    pub fn into_draft(self) -> Payload {
        match self {
            IterationOutcome::Approved { draft } | IterationOutcome::Exhausted { draft } => draft,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, IterationOutcome::Approved { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            IterationOutcome::Approved { .. } => "approved",
            IterationOutcome::Exhausted { .. } => "exhausted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationState {
    /// Rondas de revisión completadas.
    pub iteration: u32,
    pub max_iterations: u32,
    pub producer_calls: u32,
    pub draft: Option<Payload>,
    /// Última crítica (vacía = aceptado).
    pub critique: Vec<String>,
    pub phase: IterationPhase,
}

impl IterationState {
    pub fn new(max_iterations: u32) -> Self {
        Self { iteration: 0,
               max_iterations,
               producer_calls: 0,
               draft: None,
               critique: Vec::new(),
               phase: IterationPhase::Drafting }
    }

    /// `Drafting → Validating`.
    pub fn on_draft(&mut self, draft: Payload) -> Result<IterationPhase, StageError> {
        self.require_phase(IterationPhase::Drafting)?;
        self.producer_calls += 1;
        self.draft = Some(draft);
        self.phase = IterationPhase::Validating;
        Ok(self.phase)
    }

    /// `Validating → Approved | Revising`.
    pub fn on_critique(&mut self, critique: Vec<String>) -> Result<IterationPhase, StageError> {
        self.require_phase(IterationPhase::Validating)?;
        self.phase = if critique.is_empty() {
            IterationPhase::Approved
        } else {
            IterationPhase::Revising
        };
        self.critique = critique;
        Ok(self.phase)
    }

    /// `Revising → Drafting | Exhausted`.
    pub fn revise(&mut self) -> Result<IterationPhase, StageError> {
        self.require_phase(IterationPhase::Revising)?;
        self.iteration += 1;
        self.phase = if self.iteration >= self.max_iterations {
            IterationPhase::Exhausted
        } else {
            IterationPhase::Drafting
        };
        Ok(self.phase)
    }

    /// Outcome si el estado es terminal.
    pub fn outcome(&self) -> Option<IterationOutcome> {
        let draft = self.draft.clone()?;
        match self.phase {
            IterationPhase::Approved => Some(IterationOutcome::Approved { draft }),
            IterationPhase::Exhausted => Some(IterationOutcome::Exhausted { draft }),
            _ => None,
        }
    }

    fn require_phase(&self, phase: IterationPhase) -> Result<(), StageError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(StageError::Internal(format!("iteration transition from {:?}, expected {:?}", self.phase, phase)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_pass_approval() {
        let mut s = IterationState::new(3);
        assert_eq!(s.on_draft(Payload::new()).unwrap(), IterationPhase::Validating);
        assert_eq!(s.on_critique(vec![]).unwrap(), IterationPhase::Approved);
        assert!(s.outcome().unwrap().is_approved());
        assert_eq!(s.producer_calls, 1);
    }

    #[test]
    fn cap_reached_on_revise_exhausts() {
        let mut s = IterationState::new(1);
        s.on_draft(Payload::new()).unwrap();
        s.on_critique(vec!["too long".into()]).unwrap();
        assert_eq!(s.revise().unwrap(), IterationPhase::Exhausted);
        assert_eq!(s.outcome().unwrap().label(), "exhausted");
        assert_eq!(s.critique, vec!["too long".to_string()]);
    }

    #[test]
    fn out_of_order_transition_is_internal_error() {
        let mut s = IterationState::new(2);
        assert!(matches!(s.on_critique(vec![]), Err(StageError::Internal(_))));
        assert!(matches!(s.revise(), Err(StageError::Internal(_))));
        assert!(s.outcome().is_none());
    }
}
