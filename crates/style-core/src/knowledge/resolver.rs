//! `KnowledgeResolver`: recorre los tiers de una clave contra un
//! `KnowledgeSource`.
use std::sync::Arc;

use log::{debug, warn};

use super::key::{KnowledgeKey, KnowledgeKind, TierKey};
use crate::errors::KnowledgeError;

/// Almacén de referencia de sólo lectura.
pub trait KnowledgeSource: Send + Sync {
    /// Nombre para diagnósticos.
    fn name(&self) -> &str;

    /// Contenido de exactamente un tier (`None` si no hay fila).
    fn fetch(&self, kind: KnowledgeKind, tier: &TierKey) -> Result<Option<String>, KnowledgeError>;
}

/// Resultado de una resolución.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub content: String,
    /// Índice del tier que aportó el contenido (`None` si todos fallaron).
    pub tier: Option<usize>,
}

impl Resolution {
    pub fn miss() -> Self {
        Self { content: String::new(),
               tier: None }
    }

    pub fn is_miss(&self) -> bool {
        self.tier.is_none()
    }
}

#[derive(Clone)]
pub struct KnowledgeResolver {
    source: Arc<dyn KnowledgeSource>,
}

impl std::fmt::Debug for KnowledgeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeResolver").field("source", &self.source.name()).finish()
    }
}

impl KnowledgeResolver {
    pub fn new(source: Arc<dyn KnowledgeSource>) -> Self {
        Self { source }
    }

    /// Primer tier con contenido no vacío; `""` si ninguno. Los fallos del
    /// almacén se registran y cuentan como tier vacío.
    pub fn resolve(&self, key: &KnowledgeKey) -> String {
        let source = self.source.name().to_string();
        self.walk(key, |tier, err| {
                warn!("knowledge lookup {} {} on '{}' failed, treating as miss: {}", key.kind, tier, source, err);
                Ok(None)
            })
            .map(|r| r.content)
            .unwrap_or_default()
    }

    /// Igual que `resolve` pero propaga el primer fallo del almacén.
    pub fn try_resolve(&self, key: &KnowledgeKey) -> Result<Resolution, KnowledgeError> {
        self.walk(key, |_, err| Err(err))
    }

    fn walk<F>(&self, key: &KnowledgeKey, mut on_error: F) -> Result<Resolution, KnowledgeError>
        where F: FnMut(&TierKey, KnowledgeError) -> Result<Option<String>, KnowledgeError>
    {
        for (idx, tier) in key.tiers().iter().enumerate() {
            let fetched = match self.source.fetch(key.kind, tier) {
                Ok(v) => v,
                Err(e) => on_error(tier, e)?,
            };
            if let Some(content) = fetched.filter(|c| !c.trim().is_empty()) {
                debug!("knowledge {} resolved at tier {} {}", key.kind, idx, tier);
                return Ok(Resolution { content,
                                       tier: Some(idx) });
            }
        }
        debug!("knowledge {} missed every tier", key.kind);
        Ok(Resolution::miss())
    }
}
