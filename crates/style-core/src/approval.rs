//! Gate de aprobación humana sobre borradores aprobados por el crítico.
//!
//! El executor consulta el gate (si hay uno) cuando un stage iterativo
//! termina en `Approved`. Un rechazo conserva el borrador pero marca el run
//! para revisión.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Payload;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingApproval {
    pub run_id: Uuid,
    pub stage_id: String,
    pub draft: Payload,
    pub producer_calls: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approved,
    Rejected { reason: String },
}

pub trait ApprovalGate: Send + Sync {
    fn decide(&self, pending: &PendingApproval) -> Decision;
}

/// Aprueba todo.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

impl ApprovalGate for AutoApprove {
    fn decide(&self, _pending: &PendingApproval) -> Decision {
        Decision::Approved
    }
}
