//! Payloads tipados de cada stage de la guía de estilo.
//!
//! Estos tipos no agregan semántica al core: sólo fijan la forma del objeto
//! JSON que cada rol debe devolver. El schema que valida el executor se
//! deriva de la declaración.

use serde::{Deserialize, Serialize};
use style_core::typed_payload;

// Resumen del conocimiento de referencia ya resuelto.
typed_payload!(KnowledgeSummary {
    baseline_rules_summary: String => Text,
    legal_guidelines_summary: String => Text,
});

typed_payload!(CategoryInsights {
    category_insights: Vec<String> => TextList,
});

/// Notas por campo del listado de producto.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldGuideline {
    pub field: String,
    pub notes: String,
}

typed_payload!(ProductTypeAnalysis {
    product_type_analysis: String => Text,
    field_guidelines: Vec<FieldGuideline> => List,
});

typed_payload!(SchemaInference {
    final_schema: String => Text,
    schema_details: Vec<String> => TextList,
});

typed_payload!(StyleGuideDraft {
    draft_style_guide: String => Text,
} validate(d) {
    if d.draft_style_guide.trim().is_empty() {
        Err("draft_style_guide must not be blank".to_string())
    } else {
        Ok(())
    }
});

typed_payload!(LegalReview {
    legally_reviewed_guide: String => Text,
    legal_issues_found: Vec<String> => TextList,
});

typed_payload!(FinalGuide {
    final_style_guide: String => Text,
    notes: Vec<String> => TextList,
});

// Borrador de un campo (rol productor del bucle por campo).
typed_payload!(FieldDraft {
    draft_text: String => Text,
});

// Veredicto del validador: `feedback` vacío = aprobado.
typed_payload!(Verdict {
    pending_text: String => Text,
    feedback: Vec<String> => TextList,
});

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use style_core::PayloadSpec;

    #[test]
    fn field_guidelines_must_be_a_list() {
        let ok = json!({"product_type_analysis": "x", "field_guidelines": [{"field": "title", "notes": "short"}]});
        let decoded = ProductTypeAnalysis::from_payload(ok.as_object().unwrap()).unwrap();
        assert_eq!(decoded.field_guidelines[0].field, "title");

        let bad = json!({"product_type_analysis": "x", "field_guidelines": "title: short"});
        assert!(ProductTypeAnalysis::schema().validate(bad.as_object().unwrap()).is_err());
    }

    #[test]
    fn blank_draft_fails_semantic_validation() {
        let blank = json!({"draft_style_guide": " "});
        assert!(StyleGuideDraft::from_payload(blank.as_object().unwrap()).is_err());
    }
}
