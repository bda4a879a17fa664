//! Inyección determinista de variables semilla en el `WorkflowContext`.
pub mod composite;
pub mod var_injector;

pub use composite::CompositeInjector;
pub use var_injector::{StaticInjector, VarInjector};
