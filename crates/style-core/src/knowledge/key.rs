//! Claves compuestas de conocimiento.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::WILDCARD_TOKEN;

/// Tabla lógica consultada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KnowledgeKind {
    /// Pautas de estilo por categoría y tipo de producto.
    Baseline,
    /// Restricciones legales por dominio.
    Legal,
}

impl fmt::Display for KnowledgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnowledgeKind::Baseline => f.write_str("baseline"),
            KnowledgeKind::Legal => f.write_str("legal"),
        }
    }
}

/// Valor del componente variable de un tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    Exact(String),
    /// Fila comodín (`ALL`).
    Wildcard,
    /// Fila sin valor (NULL en la tabla).
    Null,
}

impl Selector {
    /// `ALL` se normaliza a `Wildcard`; así una petición literal por `ALL`
    /// no consulta dos veces la misma fila.
    pub fn exact(value: impl Into<String>) -> Self {
        let value = value.into();
        if value == WILDCARD_TOKEN {
            Selector::Wildcard
        } else {
            Selector::Exact(value)
        }
    }

    /// Valor tal como se guarda en la tabla (`None` = NULL).
    pub fn as_column(&self) -> Option<&str> {
        match self {
            Selector::Exact(v) => Some(v),
            Selector::Wildcard => Some(WILDCARD_TOKEN),
            Selector::Null => None,
        }
    }
}

/// Un nivel de búsqueda: ámbito fijo (p. ej. la categoría) + selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TierKey {
    pub scope: Option<String>,
    pub selector: Selector,
}

impl fmt::Display for TierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sel = self.selector.as_column().unwrap_or("NULL");
        match &self.scope {
            Some(scope) => write!(f, "({scope}, {sel})"),
            None => write!(f, "({sel})"),
        }
    }
}

/// Clave compuesta: tiers en orden estricto de prioridad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeKey {
    pub kind: KnowledgeKind,
    tiers: Vec<TierKey>,
}

impl KnowledgeKey {
    /// Construye la clave eliminando tiers consecutivos repetidos.
    pub fn new(kind: KnowledgeKind, tiers: Vec<TierKey>) -> Self {
        let mut tiers = tiers;
        tiers.dedup();
        Self { kind, tiers }
    }

    /// `(categoría, tipo)` → `(categoría, ALL)` → `(categoría, NULL)`.
    pub fn baseline(category: &str, product_type: &str) -> Self {
        let scope = Some(category.to_string());
        Self::new(KnowledgeKind::Baseline,
                  vec![TierKey { scope: scope.clone(),
                                 selector: Selector::exact(product_type) },
                       TierKey { scope: scope.clone(),
                                 selector: Selector::Wildcard },
                       TierKey { scope,
                                 selector: Selector::Null }])
    }

    /// `(dominio)` → `(ALL)`.
    pub fn legal(domain: &str) -> Self {
        Self::new(KnowledgeKind::Legal,
                  vec![TierKey { scope: None,
                                 selector: Selector::exact(domain) },
                       TierKey { scope: None,
                                 selector: Selector::Wildcard }])
    }

    pub fn tiers(&self) -> &[TierKey] {
        &self.tiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_key_has_three_tiers_in_priority_order() {
        let key = KnowledgeKey::baseline("Fashion", "Dresses");
        let shown: Vec<String> = key.tiers().iter().map(|t| t.to_string()).collect();
        assert_eq!(shown, vec!["(Fashion, Dresses)", "(Fashion, ALL)", "(Fashion, NULL)"]);
    }

    #[test]
    fn literal_wildcard_collapses_duplicate_tiers() {
        let key = KnowledgeKey::baseline("Fashion", "ALL");
        assert_eq!(key.tiers().len(), 2);
        let legal = KnowledgeKey::legal("ALL");
        assert_eq!(legal.tiers().len(), 1);
        assert_eq!(legal.tiers()[0].selector, Selector::Wildcard);
    }
}
