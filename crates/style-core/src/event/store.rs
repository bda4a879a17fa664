use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use super::{FlowEvent, FlowEventKind};

/// Almacenamiento de eventos append-only, compartido entre runs.
pub trait EventStore: Send + Sync {
    /// Agrega un evento a partir de su kind y devuelve el evento completo (con seq y ts).
    fn append_kind(&self, run_id: Uuid, kind: FlowEventKind) -> FlowEvent;
    /// Lista eventos de un run (orden ascendente por seq).
    fn list(&self, run_id: Uuid) -> Vec<FlowEvent>;
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    inner: DashMap<Uuid, Vec<FlowEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run_count(&self) -> usize {
        self.inner.len()
    }
}

impl EventStore for InMemoryEventStore {
    fn append_kind(&self, run_id: Uuid, kind: FlowEventKind) -> FlowEvent {
        let mut events = self.inner.entry(run_id).or_default();
        let ev = FlowEvent { seq: events.len() as u64,
                             run_id,
                             kind,
                             ts: Utc::now() };
        events.push(ev.clone());
        ev
    }

    fn list(&self, run_id: Uuid) -> Vec<FlowEvent> {
        self.inner.get(&run_id).map(|v| v.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_have_independent_sequences() {
        let store = InMemoryEventStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        store.append_kind(a, FlowEventKind::FlowInitialized { definition_hash: "h".into(), stage_count: 1 });
        store.append_kind(b, FlowEventKind::FlowInitialized { definition_hash: "h".into(), stage_count: 1 });
        let ev = store.append_kind(a, FlowEventKind::StageStarted { stage_index: 0, stage_id: "s".into() });
        assert_eq!(ev.seq, 1);
        assert_eq!(store.list(a).len(), 2);
        assert_eq!(store.list(b).len(), 1);
        assert!(store.list(Uuid::new_v4()).is_empty());
        assert_eq!(store.run_count(), 2);
    }
}
