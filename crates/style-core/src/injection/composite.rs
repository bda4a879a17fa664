//! `CompositeInjector`: aplica una secuencia de `VarInjector` en orden.
//!
//! A diferencia de un merge de parámetros, nunca sobrescribe: si un
//! inyector produce una variable que ya existe la composición falla con
//! `ContextError::Collision`.
use log::debug;

use super::var_injector::VarInjector;
use crate::errors::ContextError;
use crate::model::WorkflowContext;

#[derive(Debug, Default)]
pub struct CompositeInjector {
    pub injectors: Vec<Box<dyn VarInjector>>,
}

impl CompositeInjector {
    pub fn new() -> Self {
        Self { injectors: vec![] }
    }

    pub fn with_injectors(inj: Vec<Box<dyn VarInjector>>) -> Self {
        Self { injectors: inj }
    }

    pub fn push(mut self, injector: impl VarInjector + 'static) -> Self {
        self.injectors.push(Box::new(injector));
        self
    }

    /// Aplica los inyectores sobre `ctx`; cada uno ve las variables de los
    /// anteriores.
    pub fn apply(&self, mut ctx: WorkflowContext) -> Result<WorkflowContext, ContextError> {
        for inj in self.injectors.iter() {
            for (name, value) in inj.inject(&ctx) {
                debug!("injecting context var '{}'", name);
                ctx.set_var(name, value)?;
            }
        }
        Ok(ctx)
    }
}
