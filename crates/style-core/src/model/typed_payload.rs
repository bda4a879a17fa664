//! Infraestructura opcional de tipado fuerte para `Payload`, manteniendo el
//! núcleo agnóstico: el engine sólo ve objetos JSON + `Schema`; las
//! aplicaciones describen cada payload con un tipo concreto.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::{Payload, Schema, SchemaViolation};

/// Especificación de un payload tipado.
pub trait PayloadSpec: Sized + Serialize + DeserializeOwned {
    /// Schema que el engine usará para validar el payload neutro.
    fn schema() -> Schema;

    /// Validación semántica ligera (sin efectos secundarios). Opcional.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// `validate` sobre el payload neutro; es la regla que el macro adjunta
    /// al schema con `Schema::with_check`.
    fn semantic_check(payload: &Payload) -> Result<(), String> {
        let decoded: Self = serde_json::from_value(Value::Object(payload.clone())).map_err(|e| e.to_string())?;
        decoded.validate()
    }

    /// Serializa a payload neutro.
    fn into_payload(self) -> Result<Payload, SchemaViolation> {
        let name = Self::schema().name().to_string();
        match serde_json::to_value(&self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(SchemaViolation { schema: name,
                                           reason: "type does not serialize to a JSON object".into() }),
            Err(e) => Err(SchemaViolation { schema: name,
                                            reason: e.to_string() }),
        }
    }

    /// Decodifica desde payload neutro verificando schema y validación.
    fn from_payload(payload: &Payload) -> Result<Self, SchemaViolation> {
        let schema = Self::schema();
        schema.validate(payload)?;
        let decoded: Self = serde_json::from_value(Value::Object(payload.clone()))
            .map_err(|e| SchemaViolation { schema: schema.name().to_string(),
                                           reason: e.to_string() })?;
        decoded.validate().map_err(|reason| SchemaViolation { schema: schema.name().to_string(),
                                                               reason })?;
        Ok(decoded)
    }
}

/// Declara un payload tipado con derives y `PayloadSpec`.
///
/// Cada campo indica su `FieldKind`:
///
/// ```ignore
/// typed_payload!(TitleDraft {
///     category: String => Text,
///     draft_text: String => Text,
/// });
/// ```
///
/// La variante con `validate(self) { .. }` agrega una validación semántica
/// que debe devolver `Result<(), String>`; el schema generado la lleva
/// consigo, así que también la aplica `WorkerInvoker` al aceptar el output.
#[macro_export]
macro_rules! typed_payload {
    ($(#[$meta:meta])* $name:ident { $($fname:ident : $fty:ty => $kind:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        pub struct $name { $(pub $fname: $fty,)+ }
        impl $crate::model::PayloadSpec for $name {
            fn schema() -> $crate::model::Schema {
                $crate::model::Schema::new(stringify!($name))
                    $(.field(stringify!($fname), $crate::model::FieldKind::$kind))+
            }
        }
    };
    ($(#[$meta:meta])* $name:ident { $($fname:ident : $fty:ty => $kind:ident),+ $(,)? }
     validate($self_ident:ident) $body:block) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        pub struct $name { $(pub $fname: $fty,)+ }
        impl $crate::model::PayloadSpec for $name {
            fn schema() -> $crate::model::Schema {
                $crate::model::Schema::new(stringify!($name))
                    $(.field(stringify!($fname), $crate::model::FieldKind::$kind))+
                    .with_check(<$name as $crate::model::PayloadSpec>::semantic_check)
            }
            fn validate(&self) -> Result<(), String> {
                let $self_ident = self;
                $body
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    crate::typed_payload!(Summary {
        title: String => Text,
        notes: Vec<String> => TextList,
    } validate(s) {
        if s.title.trim().is_empty() { Err("title must not be blank".to_string()) } else { Ok(()) }
    });

    #[test]
    fn schema_is_derived_from_fields() {
        let schema = Summary::schema();
        assert_eq!(schema.name(), "Summary");
        assert_eq!(schema.fields().len(), 2);
        assert!(schema.has_field("notes"));
    }

    #[test]
    fn from_payload_runs_schema_then_semantic_validation() {
        let ok = json!({"title": "T", "notes": []});
        let decoded = Summary::from_payload(ok.as_object().unwrap()).unwrap();
        assert_eq!(decoded.title, "T");

        let blank = json!({"title": "  ", "notes": []});
        let err = Summary::from_payload(blank.as_object().unwrap()).unwrap_err();
        assert_eq!(err.reason, "title must not be blank");

        let wrong = json!({"title": "T"});
        assert!(Summary::from_payload(wrong.as_object().unwrap()).is_err());
    }

    #[test]
    fn derived_schema_carries_the_semantic_rule() {
        let err = Summary::schema().parse(r#"{"title": " ", "notes": []}"#).unwrap_err();
        assert_eq!(err.schema, "Summary");
        assert_eq!(err.reason, "title must not be blank");
    }

    #[test]
    fn into_payload_produces_object() {
        let p = Summary { title: "x".into(),
                          notes: vec!["a".into()] }.into_payload()
                                                   .unwrap();
        assert_eq!(p.get("notes"), Some(&json!(["a"])));
    }
}
