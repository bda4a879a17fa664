//! `IterationController`: conduce `IterationState` invocando productor y
//! crítico.
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::state::{IterationOutcome, IterationPhase, IterationState};
use crate::constants::{DEFAULT_CRITIQUE_FIELD, DRAFT_KEY, FEEDBACK_KEY, PREVIOUS_DRAFT_KEY};
use crate::errors::{StageError, WorkerError};
use crate::model::{FieldKind, Payload};
use crate::worker::WorkerInvoker;

/// Configuración de un stage iterativo.
#[derive(Debug, Clone)]
pub struct IterationSpec {
    pub producer: WorkerInvoker,
    pub critic: WorkerInvoker,
    pub max_iterations: u32,
    /// Campo `TextList` del output del crítico que transporta la crítica.
    pub critique_field: String,
}

impl IterationSpec {
    pub fn new(producer: WorkerInvoker, critic: WorkerInvoker, max_iterations: u32) -> Self {
        Self { producer,
               critic,
               max_iterations,
               critique_field: DEFAULT_CRITIQUE_FIELD.to_string() }
    }

    pub fn critique_field(mut self, field: impl Into<String>) -> Self {
        self.critique_field = field.into();
        self
    }

    /// El crítico declara el campo de crítica como lista de texto.
    pub fn critic_declares_critique(&self) -> bool {
        self.critic
            .output_schema()
            .field_spec(&self.critique_field)
            .map(|f| f.kind == FieldKind::TextList && f.required)
            .unwrap_or(false)
    }
}

/// Una ronda productor + crítico.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRound {
    pub iteration: u32,
    pub draft: Payload,
    pub critique: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    pub outcome: IterationOutcome,
    pub state: IterationState,
    /// Fases visitadas, empezando por `Drafting`.
    pub trace: Vec<IterationPhase>,
    pub rounds: Vec<IterationRound>,
}

impl IterationReport {
    pub fn critique_history(&self) -> Vec<&[String]> {
        self.rounds.iter().map(|r| r.critique.as_slice()).collect()
    }
}

pub struct IterationController<'a> {
    spec: &'a IterationSpec,
    cancel: &'a CancellationToken,
}

impl<'a> IterationController<'a> {
    pub fn new(spec: &'a IterationSpec, cancel: &'a CancellationToken) -> Self {
        Self { spec, cancel }
    }

    /// Ejecuta el bucle hasta un estado terminal. Cualquier `Err` de un worker
    /// termina el bucle sin reintento.
    pub fn run(&self, base: &Payload) -> Result<IterationReport, StageError> {
        let mut state = IterationState::new(self.spec.max_iterations);
        let mut trace = vec![state.phase];
        let mut rounds = Vec::new();

        while !state.phase.is_terminal() {
            if self.cancel.is_cancelled() {
                debug!("iteration cancelled in {:?}", state.phase);
                return Err(StageError::Cancelled);
            }
            let next = match state.phase {
                IterationPhase::Drafting => {
                    let input = self.producer_input(base, &state);
                    let draft = self.spec.producer.invoke(&input)?;
                    state.on_draft(draft)?
                }
                IterationPhase::Validating => {
                    let draft = state.draft.clone().unwrap_or_default();
                    let input = extend(base, [(DRAFT_KEY, Value::Object(draft.clone()))]);
                    let verdict = self.spec.critic.invoke(&input)?;
                    let critique = self.extract_critique(&verdict)?;
                    debug!("iteration {}: critic returned {} item(s)", state.iteration, critique.len());
                    rounds.push(IterationRound { iteration: state.iteration,
                                                 draft,
                                                 critique: critique.clone() });
                    state.on_critique(critique)?
                }
                IterationPhase::Revising => state.revise()?,
                IterationPhase::Approved | IterationPhase::Exhausted => break,
            };
            trace.push(next);
        }

        let outcome = state.outcome()
                           .ok_or_else(|| StageError::Internal("iteration ended without a draft".into()))?;
        if !outcome.is_approved() {
            warn!("iteration exhausted after {} producer call(s); keeping partial draft", state.producer_calls);
        }
        Ok(IterationReport { outcome,
                             state,
                             trace,
                             rounds })
    }

    fn producer_input(&self, base: &Payload, state: &IterationState) -> Payload {
        let feedback = Value::from(state.critique.clone());
        let previous = state.draft.clone().map(Value::Object).unwrap_or(Value::Null);
        extend(base, [(FEEDBACK_KEY, feedback), (PREVIOUS_DRAFT_KEY, previous)])
    }

    fn extract_critique(&self, verdict: &Payload) -> Result<Vec<String>, StageError> {
        let field = &self.spec.critique_field;
        let items = verdict.get(field)
                           .and_then(Value::as_array)
                           .ok_or_else(|| WorkerError::SchemaViolation { role: self.spec.critic.role().name.clone(),
                                                                         reason: format!("critic output lacks '{field}'") })?;
        Ok(items.iter().filter_map(Value::as_str).map(str::to_string).collect())
    }
}

fn extend<const N: usize>(base: &Payload, extra: [(&str, Value); N]) -> Payload {
    let mut out = base.clone();
    for (k, v) in extra {
        out.insert(k.to_string(), v);
    }
    out
}
