//! Replay lineal: eventos de un run → `RunSnapshot`.
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::engine::StageGraph;
use crate::event::{FlowEvent, FlowEventKind};
use crate::stage::StageStatus;

/// Estado de un stage en el snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSlot {
    pub stage_id: String,
    pub status: StageStatus,
    pub fingerprint: Option<String>,
    pub output_hash: Option<String>, // sólo el hash; el payload vive en el contexto
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Llamadas al productor (sólo stages iterativos).
    pub producer_calls: u32,
    pub needs_review: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSnapshot {
    pub run_id: Uuid,
    pub stages: Vec<StageSlot>,
    pub completed: bool,
    pub cancelled: bool,
    pub flow_fingerprint: Option<String>,
}

fn slot_index(stages: &[StageSlot], id: &str) -> Option<usize> {
    stages.iter().position(|s| s.stage_id == id)
}

impl RunSnapshot {
    pub fn replay(run_id: Uuid, events: &[FlowEvent], graph: &StageGraph) -> Self {
        let mut stages: Vec<StageSlot> = graph.stage_ids()
                                              .into_iter()
                                              .map(|id| StageSlot { stage_id: id.to_string(),
                                                                    status: StageStatus::Pending,
                                                                    fingerprint: None,
                                                                    output_hash: None,
                                                                    started_at: None,
                                                                    finished_at: None,
                                                                    producer_calls: 0,
                                                                    needs_review: false,
                                                                    error: None })
                                              .collect();
        let mut snap = RunSnapshot { run_id,
                                     stages: Vec::new(),
                                     completed: false,
                                     cancelled: false,
                                     flow_fingerprint: None };

        for ev in events.iter().filter(|e| e.run_id == run_id) {
            match &ev.kind {
                FlowEventKind::FlowInitialized { .. } => {}
                FlowEventKind::StageStarted { stage_index, .. } => {
                    if let Some(slot) = stages.get_mut(*stage_index) {
                        slot.status = StageStatus::Running;
                        slot.started_at = Some(ev.ts);
                    }
                }
                FlowEventKind::StageFinished { stage_index,
                                               output_hash,
                                               fingerprint,
                                               .. } => {
                    if let Some(slot) = stages.get_mut(*stage_index) {
                        slot.status = StageStatus::FinishedOk;
                        slot.output_hash = Some(output_hash.clone());
                        slot.fingerprint = Some(fingerprint.clone());
                        slot.finished_at = Some(ev.ts);
                    }
                }
                FlowEventKind::StageFailed { stage_index, error, .. } => {
                    if let Some(slot) = stages.get_mut(*stage_index) {
                        slot.status = StageStatus::Failed;
                        slot.error = Some(error.to_string());
                        slot.finished_at = Some(ev.ts);
                    }
                }
                FlowEventKind::IterationTerminated { stage_id,
                                                     outcome,
                                                     producer_calls } => {
                    if let Some(i) = slot_index(&stages, stage_id) {
                        stages[i].producer_calls = *producer_calls;
                        stages[i].needs_review |= outcome != "approved";
                    }
                }
                FlowEventKind::ApprovalDecided { stage_id, approved, .. } => {
                    if let Some(i) = slot_index(&stages, stage_id) {
                        stages[i].needs_review |= !approved;
                    }
                }
                FlowEventKind::FlowCancelled { stage_id } => {
                    snap.cancelled = true;
                    if let Some(i) = slot_index(&stages, stage_id) {
                        stages[i].status = StageStatus::Cancelled;
                        stages[i].finished_at = Some(ev.ts);
                    }
                }
                FlowEventKind::FlowCompleted { flow_fingerprint, .. } => {
                    snap.completed = true;
                    snap.flow_fingerprint = Some(flow_fingerprint.clone());
                }
                FlowEventKind::DraftProduced { .. } | FlowEventKind::CritiqueReceived { .. } => {}
            }
        }
        snap.stages = stages;
        snap
    }

    /// Índice del primer stage que no terminó bien.
    pub fn cursor(&self) -> usize {
        self.stages
            .iter()
            .position(|s| s.status != StageStatus::FinishedOk)
            .unwrap_or(self.stages.len())
    }

    pub fn needs_review(&self) -> bool {
        self.stages.iter().any(|s| s.needs_review)
    }

    pub fn failed_stage(&self) -> Option<&StageSlot> {
        self.stages.iter().find(|s| s.status == StageStatus::Failed)
    }
}
