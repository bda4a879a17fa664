//! Roles de worker del dominio guía de estilo.
//!
//! Cada rol fija el nombre con el que se invoca al worker externo, las
//! variables de contexto que su input debe traer y el payload que devuelve.
use style_core::{FieldKind, PayloadSpec, Role, Schema};

use crate::payloads::{CategoryInsights, FieldDraft, FinalGuide, KnowledgeSummary, LegalReview, ProductTypeAnalysis,
                      SchemaInference, StyleGuideDraft, Verdict};

pub const KNOWLEDGE_RETRIEVAL: &str = "knowledge_retrieval";
pub const DOMAIN_BREAKDOWN: &str = "domain_breakdown";
pub const PRODUCT_TYPE_ANALYSIS: &str = "product_type_analysis";
pub const SCHEMA_INFERENCE: &str = "schema_inference";
pub const STYLE_GUIDE_CONSTRUCTION: &str = "style_guide_construction";
pub const LEGAL_REVIEW: &str = "legal_review";
pub const FINAL_REFINEMENT: &str = "final_refinement";
pub const WRITER: &str = "writer";
pub const VALIDATOR: &str = "validator";

/// Variables que todo input de rol debe traer.
fn base_input(name: &str) -> Schema {
    Schema::open(format!("{name}_input")).field("category", FieldKind::Text)
                                          .field("product_type", FieldKind::Text)
}

fn role<P: PayloadSpec>(name: &str) -> Role {
    Role::new(name, base_input(name), P::schema())
}

pub fn knowledge_retrieval() -> Role {
    Role::new(KNOWLEDGE_RETRIEVAL,
              base_input(KNOWLEDGE_RETRIEVAL).field("baseline_guidelines", FieldKind::Text)
                                             .field("legal_guidelines", FieldKind::Text),
              KnowledgeSummary::schema())
}

pub fn domain_breakdown() -> Role {
    role::<CategoryInsights>(DOMAIN_BREAKDOWN)
}

pub fn product_type_analysis() -> Role {
    Role::new(PRODUCT_TYPE_ANALYSIS,
              base_input(PRODUCT_TYPE_ANALYSIS).field("fields_needed", FieldKind::TextList),
              ProductTypeAnalysis::schema())
}

pub fn schema_inference() -> Role {
    role::<SchemaInference>(SCHEMA_INFERENCE)
}

pub fn style_guide_construction() -> Role {
    Role::new(STYLE_GUIDE_CONSTRUCTION,
              base_input(STYLE_GUIDE_CONSTRUCTION).field("final_schema", FieldKind::Text),
              StyleGuideDraft::schema())
}

pub fn legal_review() -> Role {
    Role::new(LEGAL_REVIEW,
              base_input(LEGAL_REVIEW).field("legal_guidelines", FieldKind::Text),
              LegalReview::schema())
}

pub fn final_refinement() -> Role {
    role::<FinalGuide>(FINAL_REFINEMENT)
}

/// Productor del bucle por campo: recibe además la crítica anterior.
pub fn writer() -> Role {
    Role::new(WRITER,
              base_input(WRITER).field("field_name", FieldKind::Text)
                                .field("baseline_guidelines", FieldKind::Text)
                                .field("feedback", FieldKind::TextList),
              FieldDraft::schema())
}

pub fn validator() -> Role {
    Role::new(VALIDATOR,
              base_input(VALIDATOR).field("field_name", FieldKind::Text)
                                   .field("draft", FieldKind::Object),
              Verdict::schema())
}
