//! `WorkflowContext`: el valor explícito que atraviesa todos los stages.
//!
//! Contiene dos zonas:
//! - `vars`: variables con nombre (category, product_type, conocimiento
//!   resuelto...). Se fijan antes de sellar el contexto; después sólo un
//!   stage con permiso explícito (`appends`) puede agregar variables nuevas,
//!   nunca reemplazar existentes.
//! - `outputs`: payload validado de cada stage terminado, con alcance por
//!   stage (`stage_id.campo`).
//!
//! El contexto pertenece a un único run; se mueve hacia el executor y vuelve
//! en el resultado (o en el error, como contexto parcial).

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::Payload;
use crate::constants::RESERVED_NAMES;
use crate::errors::ContextError;

/// Clave con alcance de stage: `stage.field`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextKey {
    pub stage: String,
    pub field: String,
}

impl ContextKey {
    pub fn new(stage: impl Into<String>, field: impl Into<String>) -> Self {
        Self { stage: stage.into(),
               field: field.into() }
    }

    /// Parsea `stage.field`; `None` si no hay punto.
    pub fn parse(dotted: &str) -> Option<Self> {
        let (stage, field) = dotted.split_once('.')?;
        if stage.is_empty() || field.is_empty() {
            return None;
        }
        Some(Self::new(stage, field))
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.stage, self.field)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowContext {
    run_id: Uuid,
    vars: IndexMap<String, Value>,
    outputs: IndexMap<String, Payload>,
    sealed: bool,
}

impl Default for WorkflowContext {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowContext {
    pub fn new() -> Self {
        Self { run_id: Uuid::new_v4(),
               vars: IndexMap::new(),
               outputs: IndexMap::new(),
               sealed: false }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Variante encadenable de `set_var`.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<Self, ContextError> {
        self.set_var(name, value)?;
        Ok(self)
    }

    /// Fija una variable nueva. Falla si ya existe, si el nombre es reservado
    /// o si el contexto está sellado.
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<(), ContextError> {
        let name = name.into();
        if self.sealed {
            return Err(ContextError::Sealed(name));
        }
        check_name(&name)?;
        if self.vars.contains_key(&name) {
            return Err(ContextError::Collision(name));
        }
        self.vars.insert(name, value.into());
        Ok(())
    }

    /// Cierra la fase de resolución: a partir de aquí las variables son
    /// inmutables.
    pub fn seal(mut self) -> Self {
        self.sealed = true;
        self
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn var_str(&self, name: &str) -> Option<&str> {
        self.vars.get(name).and_then(Value::as_str)
    }

    pub fn vars(&self) -> &IndexMap<String, Value> {
        &self.vars
    }

    pub fn outputs(&self) -> &IndexMap<String, Payload> {
        &self.outputs
    }

    pub fn stage_output(&self, stage_id: &str) -> Option<&Payload> {
        self.outputs.get(stage_id)
    }

    pub fn get(&self, key: &ContextKey) -> Option<&Value> {
        self.outputs.get(&key.stage).and_then(|p| p.get(&key.field))
    }

    /// Busca `stage.field` o, si no hay punto, una variable.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        match ContextKey::parse(name) {
            Some(key) => self.get(&key),
            None => self.var(name),
        }
    }

    /// Input para un worker: todas las variables más un objeto por cada stage
    /// upstream (clave = id del stage).
    pub fn input_for(&self, upstream: &[String]) -> Payload {
        let mut input: Payload = self.vars.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        for id in upstream {
            if let Some(out) = self.outputs.get(id) {
                input.insert(id.clone(), Value::Object(out.clone()));
            }
        }
        input
    }

    /// Registra el output validado de un stage. `appends` son campos del
    /// payload que además se publican como variables; se verifica todo antes
    /// de mutar.
    pub(crate) fn merge_stage_output(&mut self, stage_id: &str, payload: Payload, appends: &[String]) -> Result<(), ContextError> {
        if self.outputs.contains_key(stage_id) {
            return Err(ContextError::StageAlreadyMerged(stage_id.to_string()));
        }
        for var in appends {
            if self.vars.contains_key(var) {
                return Err(ContextError::Collision(var.clone()));
            }
        }
        for var in appends {
            if let Some(v) = payload.get(var) {
                self.vars.insert(var.clone(), v.clone());
            }
        }
        self.outputs.insert(stage_id.to_string(), payload);
        Ok(())
    }
}

fn check_name(name: &str) -> Result<(), ContextError> {
    if RESERVED_NAMES.contains(&name) || name.contains('.') {
        return Err(ContextError::Reserved(name.to_string()));
    }
    Ok(())
}
