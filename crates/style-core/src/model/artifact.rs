//! Artifact publicado al final de un run.
//!
//! Un `Artifact` sólo lo crea un `ArtifactStore` a partir de un
//! `PendingArtifact`; el id lo asigna el store y el valor nunca se muta
//! después de almacenado.
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactId(pub Uuid);

impl ArtifactId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ArtifactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Documento listo para publicar (todavía sin id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingArtifact {
    pub category: String,
    pub product_type: String,
    /// `None` cuando el artifact cubre el documento completo.
    pub field_name: Option<String>,
    pub body: String,
    /// Borrador parcial (iteración agotada o rechazada por el gate humano).
    pub needs_review: bool,
    pub created_at: DateTime<Utc>,
}

impl PendingArtifact {
    pub fn new(category: impl Into<String>, product_type: impl Into<String>, body: impl Into<String>) -> Self {
        Self { category: category.into(),
               product_type: product_type.into(),
               field_name: None,
               body: body.into(),
               needs_review: false,
               created_at: Utc::now() }
    }

    pub fn for_field(mut self, field: impl Into<String>) -> Self {
        self.field_name = Some(field.into());
        self
    }

    pub fn needs_review(mut self, flag: bool) -> Self {
        self.needs_review = flag;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: ArtifactId,
    pub category: String,
    pub product_type: String,
    pub field_name: Option<String>,
    pub body: String,
    pub needs_review: bool,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    pub fn from_pending(id: ArtifactId, pending: PendingArtifact) -> Self {
        Self { id,
               category: pending.category,
               product_type: pending.product_type,
               field_name: pending.field_name,
               body: pending.body,
               needs_review: pending.needs_review,
               created_at: pending.created_at }
    }
}
