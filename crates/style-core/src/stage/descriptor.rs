//! `StageDescriptor`: identidad, dependencias, acción y contrato de salida de
//! un stage.
use crate::iteration::IterationSpec;
use crate::model::Schema;
use crate::worker::WorkerInvoker;

/// Lo que ejecuta un stage.
#[derive(Debug, Clone)]
pub enum StageAction {
    /// Una invocación de worker.
    Worker(WorkerInvoker),
    /// Un bucle productor/crítico; el output es el borrador final.
    Iteration(IterationSpec),
}

impl StageAction {
    pub fn label(&self) -> &'static str {
        match self {
            StageAction::Worker(_) => "worker",
            StageAction::Iteration(_) => "iteration",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StageDescriptor {
    pub id: String,
    /// Stages (anteriores) cuyo output consume, en orden.
    pub upstream: Vec<String>,
    pub action: StageAction,
    /// Schema que el payload del stage debe cumplir.
    pub output: Schema,
    /// Campos del output que además se publican como variables del contexto.
    pub appends: Vec<String>,
}

impl StageDescriptor {
    /// Stage de una sola invocación; el schema de salida es el del rol.
    pub fn worker(id: impl Into<String>, invoker: WorkerInvoker) -> Self {
        let output = invoker.output_schema().clone();
        Self { id: id.into(),
               upstream: Vec::new(),
               action: StageAction::Worker(invoker),
               output,
               appends: Vec::new() }
    }

    /// Stage iterativo; el schema de salida es el del productor.
    pub fn iteration(id: impl Into<String>, spec: IterationSpec) -> Self {
        let output = spec.producer.output_schema().clone();
        Self { id: id.into(),
               upstream: Vec::new(),
               action: StageAction::Iteration(spec),
               output,
               appends: Vec::new() }
    }

    pub fn after<I, S>(mut self, upstream: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        self.upstream.extend(upstream.into_iter().map(Into::into));
        self
    }

    pub fn appends(mut self, field: impl Into<String>) -> Self {
        self.appends.push(field.into());
        self
    }

    pub fn with_output(mut self, schema: Schema) -> Self {
        self.output = schema;
        self
    }

    pub fn is_iteration(&self) -> bool {
        matches!(self.action, StageAction::Iteration(_))
    }
}
