
use style_core::{ArtifactStore, PendingArtifact};
use style_persistence::{PgArtifactStore, PoolProvider};
use test_support::{unique_category, with_pool};

#[test]
fn stored_guides_are_listed_in_insertion_order() {
    let ran = with_pool(|pool| {
        let cat = unique_category("Fashion");
        let store = PgArtifactStore::new(PoolProvider { pool: pool.clone() });
        let first = store.store(PendingArtifact::new(&cat, "Dresses", "# Guide v1")).unwrap();
        let second = store.store(PendingArtifact::new(&cat, "Dresses", "# Guide v2").for_field("title").needs_review(true))
                          .unwrap();
        let listed = store.list_for(&cat, "Dresses").unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first);
        assert_eq!(listed[1].id, second);
        assert_eq!(listed[1].field_name.as_deref(), Some("title"));
        assert!(listed[1].needs_review);
        assert!(store.list_for(&cat, "Skirts").unwrap().is_empty());
    });
    if ran.is_none() {
        eprintln!("DATABASE_URL not set - skipping");
    }
}
