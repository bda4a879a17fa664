//! Inyección del conocimiento de referencia antes de sellar el contexto.
use log::info;
use serde_json::Value;
use style_core::{CompositeInjector, KnowledgeKey, KnowledgeKind, KnowledgeResolver, Payload, VarInjector, WorkflowContext};

pub const BASELINE_VAR: &str = "baseline_guidelines";
pub const LEGAL_VAR: &str = "legal_guidelines";

/// Resuelve una clase de conocimiento a partir de `category` y
/// `product_type` ya presentes en el contexto. El dominio legal es la
/// categoría.
#[derive(Debug, Clone)]
pub struct KnowledgeInjector {
    resolver: KnowledgeResolver,
    kind: KnowledgeKind,
}

impl KnowledgeInjector {
    pub fn baseline(resolver: KnowledgeResolver) -> Self {
        Self { resolver,
               kind: KnowledgeKind::Baseline }
    }

    pub fn legal(resolver: KnowledgeResolver) -> Self {
        Self { resolver,
               kind: KnowledgeKind::Legal }
    }

    pub fn var_name(&self) -> &'static str {
        match self.kind {
            KnowledgeKind::Baseline => BASELINE_VAR,
            KnowledgeKind::Legal => LEGAL_VAR,
        }
    }
}

impl VarInjector for KnowledgeInjector {
    fn inject(&self, ctx: &WorkflowContext) -> Payload {
        let category = ctx.var_str("category").unwrap_or_default();
        let key = match self.kind {
            KnowledgeKind::Baseline => KnowledgeKey::baseline(category, ctx.var_str("product_type").unwrap_or_default()),
            KnowledgeKind::Legal => KnowledgeKey::legal(category),
        };
        let content = self.resolver.resolve(&key);
        if content.is_empty() {
            info!("no {} knowledge for category '{}'; injecting empty text", self.kind, category);
        }
        let mut out = Payload::new();
        out.insert(self.var_name().to_string(), Value::String(content));
        out
    }
}

/// Inyectores estándar: baseline y luego legal.
pub fn knowledge_injectors(resolver: &KnowledgeResolver) -> CompositeInjector {
    CompositeInjector::new().push(KnowledgeInjector::baseline(resolver.clone()))
                            .push(KnowledgeInjector::legal(resolver.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use style_core::InMemoryKnowledgeSource;

    fn resolver() -> KnowledgeResolver {
        let source = InMemoryKnowledgeSource::new();
        source.insert_baseline("Fashion", None, "generic fashion rules");
        source.insert_baseline("Fashion", Some("Dresses"), "dress rules");
        source.insert_legal("ALL", "global legal");
        KnowledgeResolver::new(Arc::new(source))
    }

    #[test]
    fn injects_most_specific_baseline_and_fallback_legal() {
        let ctx = WorkflowContext::new().with_var("category", "Fashion")
                                        .unwrap()
                                        .with_var("product_type", "Dresses")
                                        .unwrap();
        let ctx = knowledge_injectors(&resolver()).apply(ctx).unwrap();
        assert_eq!(ctx.var_str(BASELINE_VAR), Some("dress rules"));
        assert_eq!(ctx.var_str(LEGAL_VAR), Some("global legal"));
    }

    #[test]
    fn unknown_category_yields_empty_text() {
        let ctx = WorkflowContext::new().with_var("category", "Garden")
                                        .unwrap()
                                        .with_var("product_type", "Hoses")
                                        .unwrap();
        let ctx = knowledge_injectors(&resolver()).apply(ctx).unwrap();
        assert_eq!(ctx.var_str(BASELINE_VAR), Some(""));
        assert_eq!(ctx.var_str(LEGAL_VAR), Some("global legal"));
    }
}
