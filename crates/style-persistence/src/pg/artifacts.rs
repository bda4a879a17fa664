//! `ArtifactStore` sobre `published_style_guides`.
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::debug;
use uuid::Uuid;

use style_core::{Artifact, ArtifactId, ArtifactStore, PendingArtifact, PersistenceFailure};

use super::{with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::published_style_guides;

/// Fila para inserción; `seq` lo asigna la base de datos.
#[derive(Insertable, Debug)]
#[diesel(table_name = published_style_guides)]
struct NewGuideRow<'a> {
    id: Uuid,
    category: &'a str,
    product_type: &'a str,
    field_name: Option<&'a str>,
    style_guide_md: &'a str,
    needs_review: bool,
    created_at: DateTime<Utc>,
}

/// Fila leída de `published_style_guides` (mismo orden de columnas que el
/// esquema).
#[derive(Queryable, Debug, Clone)]
pub struct GuideRow {
    pub id: Uuid,
    pub seq: i64,
    pub category: String,
    pub product_type: String,
    pub field_name: Option<String>,
    pub style_guide_md: String,
    pub needs_review: bool,
    pub created_at: DateTime<Utc>,
}

impl From<GuideRow> for Artifact {
    fn from(row: GuideRow) -> Self {
        Artifact { id: ArtifactId(row.id),
                   category: row.category,
                   product_type: row.product_type,
                   field_name: row.field_name,
                   body: row.style_guide_md,
                   needs_review: row.needs_review,
                   created_at: row.created_at }
    }
}

pub struct PgArtifactStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgArtifactStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    fn insert(&self, id: Uuid, pending: &PendingArtifact) -> Result<(), PersistenceError> {
        let row = NewGuideRow { id,
                                category: &pending.category,
                                product_type: &pending.product_type,
                                field_name: pending.field_name.as_deref(),
                                style_guide_md: &pending.body,
                                needs_review: pending.needs_review,
                                created_at: pending.created_at };
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::insert_into(published_style_guides::table).values(&row).execute(&mut conn)?;
            Ok(())
        })
    }

    fn select_for(&self, category: &str, product_type: &str) -> Result<Vec<GuideRow>, PersistenceError> {
        use published_style_guides::dsl as g;
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            Ok(g::published_style_guides.filter(g::category.eq(category))
                                        .filter(g::product_type.eq(product_type))
                                        .order(g::seq.asc())
                                        .load::<GuideRow>(&mut conn)?)
        })
    }
}

impl<P: ConnectionProvider> ArtifactStore for PgArtifactStore<P> {
    fn store(&self, pending: PendingArtifact) -> Result<ArtifactId, PersistenceFailure> {
        let id = Uuid::new_v4();
        debug!("pg store artifact {} for {}/{}", id, pending.category, pending.product_type);
        self.insert(id, &pending)?;
        Ok(ArtifactId(id))
    }

    fn list_for(&self, category: &str, product_type: &str) -> Result<Vec<Artifact>, PersistenceFailure> {
        Ok(self.select_for(category, product_type)?
               .into_iter()
               .map(Artifact::from)
               .collect())
    }
}
