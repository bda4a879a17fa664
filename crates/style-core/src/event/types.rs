//! Tipos de evento del run y estructura `FlowEvent`.
//!
//! Rol en el flujo:
//! - Cada ejecución del `StageExecutor` emite eventos a un `EventStore`
//!   append-only.
//! - Con estos eventos `RunSnapshot::replay` reconstruye el estado de cada
//!   stage sin estructuras mutables compartidas.
//! - `FlowEventKind` es el contrato observable del motor.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::StageError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlowEventKind {
    /// Primer evento de un run. Fija el hash del grafo y la cantidad de
    /// stages.
    FlowInitialized { definition_hash: String, stage_count: usize },
    StageStarted { stage_index: usize, stage_id: String },
    /// Stage terminado con su payload validado (hash) y fingerprint.
    StageFinished {
        stage_index: usize,
        stage_id: String,
        output_hash: String,
        fingerprint: String,
    },
    /// Error terminal; el run no continúa.
    StageFailed { stage_index: usize, stage_id: String, error: StageError },
    /// Borrador del productor dentro de un stage iterativo.
    DraftProduced { stage_id: String, iteration: u32, draft_hash: String },
    CritiqueReceived { stage_id: String, iteration: u32, critique: Vec<String> },
    IterationTerminated {
        stage_id: String,
        outcome: String,
        producer_calls: u32,
    },
    /// Decisión del gate de aprobación sobre un borrador aprobado.
    ApprovalDecided {
        stage_id: String,
        approved: bool,
        reason: Option<String>,
    },
    FlowCancelled { stage_id: String },
    /// Cierre con fingerprint agregado (hash de los fingerprints de stages
    /// exitosos en orden).
    FlowCompleted { flow_fingerprint: String, needs_review: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEvent {
    pub seq: u64, // orden de append dentro del run
    pub run_id: Uuid,
    pub kind: FlowEventKind,
    pub ts: DateTime<Utc>, // metadato (no entra en fingerprint)
}

/// Variante compacta de una secuencia de eventos (una letra por evento).
pub fn variant_letters(events: &[FlowEvent]) -> String {
    events.iter()
          .map(|e| match e.kind {
              FlowEventKind::FlowInitialized { .. } => 'I',
              FlowEventKind::StageStarted { .. } => 'S',
              FlowEventKind::StageFinished { .. } => 'F',
              FlowEventKind::StageFailed { .. } => 'X',
              FlowEventKind::DraftProduced { .. } => 'D',
              FlowEventKind::CritiqueReceived { .. } => 'Q',
              FlowEventKind::IterationTerminated { .. } => 'T',
              FlowEventKind::ApprovalDecided { .. } => 'A',
              FlowEventKind::FlowCancelled { .. } => 'K',
              FlowEventKind::FlowCompleted { .. } => 'C',
          })
          .collect()
}
