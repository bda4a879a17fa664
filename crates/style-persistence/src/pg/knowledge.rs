//! `KnowledgeSource` sobre `baseline_style_guidelines` y `legal_guidelines`.
//!
//! Cada `fetch` resuelve exactamente un tier; el orden de fallback lo
//! decide el `KnowledgeResolver` del core. Si hay varias filas para el mismo
//! tier gana la más reciente.
use diesel::prelude::*;
use log::debug;

use style_core::{KnowledgeError, KnowledgeKind, KnowledgeSource};
use style_core::knowledge::{Selector, TierKey};

use super::{with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::{baseline_style_guidelines, legal_guidelines};

const SOURCE_NAME: &str = "postgres";

pub struct PgKnowledgeSource<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgKnowledgeSource<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    fn fetch_baseline(&self, tier: &TierKey) -> Result<Option<String>, PersistenceError> {
        use baseline_style_guidelines::dsl as b;
        let Some(category) = tier.scope.as_deref() else {
            return Ok(None);
        };
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            let query = b::baseline_style_guidelines.filter(b::category.eq(category))
                                                    .select(b::content)
                                                    .order(b::id.desc())
                                                    .into_boxed();
            let query = match tier.selector.as_column() {
                Some(pt) => query.filter(b::product_type.eq(pt)),
                None => query.filter(b::product_type.is_null()),
            };
            Ok(query.first::<String>(&mut conn).optional()?)
        })
    }

    fn fetch_legal(&self, tier: &TierKey) -> Result<Option<String>, PersistenceError> {
        use legal_guidelines::dsl as l;
        let domain = match &tier.selector {
            Selector::Null => return Ok(None),
            other => other.as_column().unwrap_or_default().to_string(),
        };
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            Ok(l::legal_guidelines.filter(l::domain.eq(&domain))
                                  .select(l::content)
                                  .order(l::id.desc())
                                  .first::<String>(&mut conn)
                                  .optional()?)
        })
    }

    /// Inserta una fila de pautas base (carga de datos y tests).
    pub fn insert_baseline(&self, category: &str, product_type: Option<&str>, content: &str) -> Result<(), PersistenceError> {
        use baseline_style_guidelines::dsl as b;
        let mut conn = self.provider.connection()?;
        diesel::insert_into(b::baseline_style_guidelines).values((b::category.eq(category),
                                                                  b::product_type.eq(product_type),
                                                                  b::content.eq(content)))
                                                         .execute(&mut conn)?;
        Ok(())
    }

    pub fn insert_legal(&self, domain: &str, content: &str) -> Result<(), PersistenceError> {
        use legal_guidelines::dsl as l;
        let mut conn = self.provider.connection()?;
        diesel::insert_into(l::legal_guidelines).values((l::domain.eq(domain), l::content.eq(content)))
                                                .execute(&mut conn)?;
        Ok(())
    }
}

impl<P: ConnectionProvider> KnowledgeSource for PgKnowledgeSource<P> {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn fetch(&self, kind: KnowledgeKind, tier: &TierKey) -> Result<Option<String>, KnowledgeError> {
        debug!("pg knowledge fetch {} {}", kind, tier);
        let res = match kind {
            KnowledgeKind::Baseline => self.fetch_baseline(tier),
            KnowledgeKind::Legal => self.fetch_legal(tier),
        };
        res.map_err(|e| e.into_knowledge_error(SOURCE_NAME))
    }
}
