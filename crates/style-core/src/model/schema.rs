//! Schemas de payload.
//!
//! Un `Payload` es siempre un objeto JSON. Cada stage y cada rol de worker
//! declaran un `Schema` con los campos que esperan; la validación ocurre en
//! la frontera (antes de despachar el input y antes de aceptar el output),
//! nunca aguas abajo accediendo a claves opcionales.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Contrato entre stages: objeto JSON validado contra un `Schema`.
pub type Payload = Map<String, Value>;

/// Tipo esperado de un campo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// String.
    Text,
    /// Lista de strings (p. ej. feedback del crítico).
    TextList,
    /// Lista de cualquier valor.
    List,
    /// Objeto JSON.
    Object,
    Bool,
    /// Cualquier valor no nulo.
    Any,
}

impl FieldKind {
    fn accepts(self, v: &Value) -> bool {
        match (self, v) {
            (_, Value::Null) => false,
            (FieldKind::Text, Value::String(_)) => true,
            (FieldKind::TextList, Value::Array(items)) => items.iter().all(Value::is_string),
            (FieldKind::List, Value::Array(_)) => true,
            (FieldKind::Object, Value::Object(_)) => true,
            (FieldKind::Bool, Value::Bool(_)) => true,
            (FieldKind::Any, _) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}

/// Payload rechazado por un schema (o texto que no es JSON).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{schema}: {reason}")]
pub struct SchemaViolation {
    pub schema: String,
    pub reason: String,
}

/// Regla semántica sobre un payload que ya cumple la forma del schema.
#[derive(Clone, Copy)]
pub struct SemanticCheck(pub fn(&Payload) -> Result<(), String>);

impl fmt::Debug for SemanticCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SemanticCheck(..)")
    }
}

impl PartialEq for SemanticCheck {
    fn eq(&self, other: &Self) -> bool {
        self.0 as usize == other.0 as usize
    }
}

impl Eq for SemanticCheck {}

/// Descripción declarativa de un payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    name: String,
    fields: Vec<FieldSpec>,
    allow_extra: bool,
    /// No viaja serializado: sólo existe en el proceso que declaró el schema.
    #[serde(skip)]
    check: Option<SemanticCheck>,
}

impl Schema {
    /// Schema estricto sin campos; agregar con `field`/`optional`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(),
               fields: Vec::new(),
               allow_extra: false,
               check: None }
    }

    /// Schema que acepta cualquier objeto.
    pub fn open(name: impl Into<String>) -> Self {
        Self::new(name).allow_extra()
    }

    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec { name: name.into(),
                                     kind,
                                     required: true });
        self
    }

    pub fn optional(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldSpec { name: name.into(),
                                     kind,
                                     required: false });
        self
    }

    pub fn allow_extra(mut self) -> Self {
        self.allow_extra = true;
        self
    }

    /// Regla que corre después de la validación estructural.
    pub fn with_check(mut self, check: fn(&Payload) -> Result<(), String>) -> Self {
        self.check = Some(SemanticCheck(check));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_spec(name).is_some()
    }

    fn violation(&self, reason: impl Into<String>) -> SchemaViolation {
        SchemaViolation { schema: self.name.clone(),
                          reason: reason.into() }
    }

    /// Valida un payload ya decodificado.
    pub fn validate(&self, payload: &Payload) -> Result<(), SchemaViolation> {
        for spec in &self.fields {
            match payload.get(&spec.name) {
                None | Some(Value::Null) if !spec.required => {}
                None => return Err(self.violation(format!("missing field '{}'", spec.name))),
                Some(v) if !spec.kind.accepts(v) => {
                    return Err(self.violation(format!("field '{}' is not {:?}", spec.name, spec.kind)));
                }
                Some(_) => {}
            }
        }
        if !self.allow_extra {
            if let Some(extra) = payload.keys().find(|k| !self.has_field(k)) {
                return Err(self.violation(format!("unexpected field '{extra}'")));
            }
        }
        match self.check {
            Some(SemanticCheck(check)) => check(payload).map_err(|reason| self.violation(reason)),
            None => Ok(()),
        }
    }

    /// Decodifica texto de un worker (JSON, opcionalmente dentro de un bloque
    /// de código Markdown) y lo valida.
    pub fn parse(&self, raw: &str) -> Result<Payload, SchemaViolation> {
        let text = strip_code_fence(raw);
        let value: Value = serde_json::from_str(text).map_err(|e| self.violation(format!("output is not JSON: {e}")))?;
        match value {
            Value::Object(map) => {
                self.validate(&map)?;
                Ok(map)
            }
            other => Err(self.violation(format!("output is not a JSON object (got {})", json_type(&other)))),
        }
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // descarta la etiqueta de lenguaje (```json)
    let body = match rest.find('\n') {
        Some(i) => &rest[i + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn critique() -> Schema {
        Schema::new("Critique").field("pending_text", FieldKind::Text)
                               .field("feedback", FieldKind::TextList)
                               .optional("score", FieldKind::Any)
    }

    fn obj(v: Value) -> Payload {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn accepts_conforming_payload() {
        let p = obj(json!({"pending_text": "x", "feedback": ["a", "b"]}));
        assert!(critique().validate(&p).is_ok());
    }

    #[test]
    fn rejects_missing_wrong_type_and_extra_fields() {
        let s = critique();
        let missing = s.validate(&obj(json!({"pending_text": "x"}))).unwrap_err();
        assert!(missing.reason.contains("missing field 'feedback'"));

        let wrong = s.validate(&obj(json!({"pending_text": "x", "feedback": [1]}))).unwrap_err();
        assert!(wrong.reason.contains("TextList"));

        let extra = s.validate(&obj(json!({"pending_text": "x", "feedback": [], "other": 1}))).unwrap_err();
        assert!(extra.reason.contains("unexpected field 'other'"));
    }

    #[test]
    fn required_null_is_rejected_optional_null_is_not() {
        let s = critique();
        assert!(s.validate(&obj(json!({"pending_text": null, "feedback": []}))).is_err());
        assert!(s.validate(&obj(json!({"pending_text": "", "feedback": [], "score": null}))).is_ok());
    }

    #[test]
    fn parse_handles_fenced_json_and_rejects_non_objects() {
        let s = critique();
        let fenced = "```json\n{\"pending_text\": \"t\", \"feedback\": []}\n```";
        assert_eq!(s.parse(fenced).unwrap().get("pending_text"), Some(&json!("t")));

        let arr = s.parse("[1,2]").unwrap_err();
        assert!(arr.reason.contains("not a JSON object"));
        let garbage = s.parse("Sure! here is your guide").unwrap_err();
        assert!(garbage.reason.contains("not JSON"));
    }

    fn no_blank_pending_text(p: &Payload) -> Result<(), String> {
        match p.get("pending_text").and_then(Value::as_str) {
            Some(t) if t.trim().is_empty() => Err("pending_text must not be blank".into()),
            _ => Ok(()),
        }
    }

    #[test]
    fn check_runs_after_structural_validation() {
        let s = critique().with_check(no_blank_pending_text);
        assert!(s.validate(&obj(json!({"pending_text": "t", "feedback": []}))).is_ok());

        let blank = s.parse(r#"{"pending_text": "  ", "feedback": []}"#).unwrap_err();
        assert_eq!(blank, SchemaViolation { schema: "Critique".into(),
                                            reason: "pending_text must not be blank".into() });

        // la forma se valida primero
        let missing = s.validate(&obj(json!({"pending_text": " "}))).unwrap_err();
        assert!(missing.reason.contains("missing field 'feedback'"));
    }

    #[test]
    fn open_schema_accepts_anything_object() {
        let s = Schema::open("Any");
        assert!(s.validate(&obj(json!({"whatever": [1, {"x": 2}]}))).is_ok());
    }
}
