use serde::{Deserialize, Serialize};

/// Estado de un stage reconstruido desde eventos.
///
/// Transiciones válidas:
/// - `Pending` -> `Running`
/// - `Running` -> `FinishedOk` | `Failed` | `Cancelled`
/// - `Pending` -> `Cancelled` (cancelación antes de empezar)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageStatus {
    Pending,
    Running,
    FinishedOk,
    Failed,
    Cancelled,
}

impl StageStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, StageStatus::FinishedOk | StageStatus::Failed | StageStatus::Cancelled)
    }
}
