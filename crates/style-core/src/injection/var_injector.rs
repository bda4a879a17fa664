use serde_json::Value;

use crate::model::{Payload, WorkflowContext};

/// Produce variables nuevas a partir del contexto acumulado.
pub trait VarInjector: Send + Sync + std::fmt::Debug {
    /// Variables a agregar. No deben existir ya en el contexto.
    fn inject(&self, ctx: &WorkflowContext) -> Payload;
}

/// Variables fijas.
#[derive(Debug, Clone, Default)]
pub struct StaticInjector {
    vars: Payload,
}

impl StaticInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl VarInjector for StaticInjector {
    fn inject(&self, _ctx: &WorkflowContext) -> Payload {
        self.vars.clone()
    }
}
