use std::sync::Arc;

use proptest::prelude::*;
use style_core::{InMemoryKnowledgeSource, KnowledgeKey, KnowledgeResolver};

#[test]
fn only_wildcard_row_present_returns_wildcard_content() {
    let src = InMemoryKnowledgeSource::new();
    src.insert_baseline("Fashion", Some("ALL"), "generic fashion rules");
    let resolver = KnowledgeResolver::new(Arc::new(src));
    let res = resolver.try_resolve(&KnowledgeKey::baseline("Fashion", "Dresses")).unwrap();
    assert_eq!(res.content, "generic fashion rules");
    assert_eq!(res.tier, Some(1));
}

#[test]
fn legal_lookup_falls_back_to_all_domain() {
    let src = InMemoryKnowledgeSource::new();
    src.insert_legal("ALL", "no medical claims");
    let resolver = KnowledgeResolver::new(Arc::new(src));
    assert_eq!(resolver.resolve(&KnowledgeKey::legal("Fashion")), "no medical claims");
}

#[test]
fn other_category_rows_never_leak() {
    let src = InMemoryKnowledgeSource::new();
    src.insert_baseline("Home", Some("ALL"), "home rules");
    src.insert_baseline("Home", None, "home null");
    let resolver = KnowledgeResolver::new(Arc::new(src));
    assert_eq!(resolver.resolve(&KnowledgeKey::baseline("Fashion", "Dresses")), "");
}

proptest! {
    /// Con cualquier subconjunto de filas presentes gana la de mayor
    /// prioridad; sin filas el resultado es "".
    #[test]
    fn highest_priority_present_tier_wins(t1 in any::<bool>(), t2 in any::<bool>(), t3 in any::<bool>()) {
        let src = InMemoryKnowledgeSource::new();
        if t1 { src.insert_baseline("Fashion", Some("Dresses"), "T1"); }
        if t2 { src.insert_baseline("Fashion", Some("ALL"), "T2"); }
        if t3 { src.insert_baseline("Fashion", None, "T3"); }
        let resolver = KnowledgeResolver::new(Arc::new(src));
        let expected = if t1 { "T1" } else if t2 { "T2" } else if t3 { "T3" } else { "" };
        let key = KnowledgeKey::baseline("Fashion", "Dresses");
        prop_assert_eq!(resolver.resolve(&key), expected);
        // idempotente
        prop_assert_eq!(resolver.resolve(&key), expected);
    }
}
