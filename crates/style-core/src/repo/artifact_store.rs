use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use log::debug;

use crate::errors::PersistenceFailure;
use crate::model::{Artifact, ArtifactId, PendingArtifact};

/// Sink append-only de documentos publicados. Seguro entre runs
/// concurrentes.
pub trait ArtifactStore: Send + Sync {
    fn store(&self, pending: PendingArtifact) -> Result<ArtifactId, PersistenceFailure>;

    /// Artifacts de una categoría y tipo de producto, en orden de creación.
    fn list_for(&self, category: &str, product_type: &str) -> Result<Vec<Artifact>, PersistenceFailure>;
}

#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    rows: DashMap<ArtifactId, (u64, Artifact)>,
    seq: AtomicU64,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: ArtifactId) -> Option<Artifact> {
        self.rows.get(&id).map(|r| r.value().1.clone())
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn store(&self, pending: PendingArtifact) -> Result<ArtifactId, PersistenceFailure> {
        let id = ArtifactId::new();
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        debug!("storing artifact {} for {}/{}", id, pending.category, pending.product_type);
        self.rows.insert(id, (seq, Artifact::from_pending(id, pending)));
        Ok(id)
    }

    fn list_for(&self, category: &str, product_type: &str) -> Result<Vec<Artifact>, PersistenceFailure> {
        let mut found: Vec<(u64, Artifact)> = self.rows
                                                  .iter()
                                                  .filter(|r| r.value().1.category == category && r.value().1.product_type == product_type)
                                                  .map(|r| r.value().clone())
                                                  .collect();
        found.sort_by_key(|(seq, _)| *seq);
        Ok(found.into_iter().map(|(_, a)| a).collect())
    }
}
