//! Fuente de conocimiento en memoria (tests, CLI sin base de datos).
use dashmap::DashMap;

use super::key::{KnowledgeKind, Selector, TierKey};
use super::resolver::KnowledgeSource;
use crate::errors::KnowledgeError;

#[derive(Debug, Default)]
pub struct InMemoryKnowledgeSource {
    rows: DashMap<(KnowledgeKind, TierKey), String>,
}

impl InMemoryKnowledgeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// `product_type = None` representa la fila NULL.
    pub fn insert_baseline(&self, category: &str, product_type: Option<&str>, content: impl Into<String>) {
        let selector = match product_type {
            Some(pt) => Selector::exact(pt),
            None => Selector::Null,
        };
        self.insert(KnowledgeKind::Baseline,
                    TierKey { scope: Some(category.to_string()),
                              selector },
                    content);
    }

    pub fn insert_legal(&self, domain: &str, content: impl Into<String>) {
        self.insert(KnowledgeKind::Legal,
                    TierKey { scope: None,
                              selector: Selector::exact(domain) },
                    content);
    }

    /// Reemplaza la fila si ya existía.
    pub fn insert(&self, kind: KnowledgeKind, tier: TierKey, content: impl Into<String>) {
        self.rows.insert((kind, tier), content.into());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl KnowledgeSource for InMemoryKnowledgeSource {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn fetch(&self, kind: KnowledgeKind, tier: &TierKey) -> Result<Option<String>, KnowledgeError> {
        Ok(self.rows.get(&(kind, tier.clone())).map(|r| r.value().clone()))
    }
}
