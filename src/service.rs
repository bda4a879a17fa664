//! Punto de entrada del workflow: recibe `{category, product_type,
//! fields_needed}`, ejecuta el grafo (documento completo o un run por campo),
//! publica cada cuerpo en el `ArtifactStore` y devuelve los resultados.
use std::sync::Arc;

use rayon::prelude::*;
use serde_json::Value;
use style_adapters::{field_guide_graph, knowledge_injectors, style_guide_graph};
use style_core::{ArtifactId, ArtifactStore, CancellationToken, ErrorKind, KnowledgeResolver, PendingArtifact,
                 PersistenceFailure, RunOutcome, RunSnapshot, StageExecutor, StageGraph, TimeoutWorker, Worker,
                 WorkflowContext};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{AppConfig, RunMode};
use crate::errors::{FieldFailure, ServiceError};

/// Campos generados cuando la petición no indica ninguno.
pub const DEFAULT_FIELDS: &[&str] = &["title", "shortDesc", "longDesc"];

/// Prefijo de un borrador que no superó la validación.
pub const PARTIAL_PREFIX: &str = "(Partial Draft) ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub category: String,
    pub product_type: String,
    pub fields_needed: Vec<String>,
}

impl GenerationRequest {
    pub fn new(category: impl Into<String>, product_type: impl Into<String>) -> Self {
        Self { category: category.into(),
               product_type: product_type.into(),
               fields_needed: Vec::new() }
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields_needed.push(name.into());
        self
    }

    /// Campos pedidos, o los de por defecto si la lista está vacía.
    pub fn effective_fields(&self) -> Vec<String> {
        if self.fields_needed.is_empty() {
            DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect()
        } else {
            self.fields_needed.clone()
        }
    }

    fn validate(&self) -> Result<(), ServiceError> {
        if self.category.trim().is_empty() {
            return Err(ServiceError::InvalidRequest("category must not be blank".into()));
        }
        if self.product_type.trim().is_empty() {
            return Err(ServiceError::InvalidRequest("product_type must not be blank".into()));
        }
        Ok(())
    }
}

/// Un cuerpo generado (documento completo o un campo).
#[derive(Debug, Clone)]
pub struct GeneratedGuide {
    pub run_id: Uuid,
    /// `None` en modo documento.
    pub field_name: Option<String>,
    pub body: String,
    pub needs_review: bool,
    /// Resultado de la publicación; un fallo no invalida `body`.
    pub artifact: Result<ArtifactId, PersistenceFailure>,
}

pub struct StyleGuideService {
    config: AppConfig,
    knowledge: KnowledgeResolver,
    artifacts: Arc<dyn ArtifactStore>,
    executor: StageExecutor,
    document_graph: StageGraph,
    field_graph: StageGraph,
}

impl StyleGuideService {
    /// Construye ambos grafos; el worker queda envuelto con el timeout
    /// configurado.
    pub fn new(config: AppConfig,
               knowledge: KnowledgeResolver,
               worker: Arc<dyn Worker>,
               artifacts: Arc<dyn ArtifactStore>)
               -> Result<Self, ServiceError> {
        let worker: Arc<dyn Worker> = Arc::new(TimeoutWorker::new(worker, config.worker_timeout));
        let document_graph = style_guide_graph(Arc::clone(&worker))?;
        let field_graph = field_guide_graph(worker, config.max_iterations)?;
        Ok(Self { config,
                  knowledge,
                  artifacts,
                  executor: StageExecutor::new(),
                  document_graph,
                  field_graph })
    }

    /// Reemplaza el executor (p. ej. para agregar un gate de aprobación).
    pub fn with_executor(mut self, executor: StageExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn graph(&self, mode: RunMode) -> &StageGraph {
        match mode {
            RunMode::Document => &self.document_graph,
            RunMode::PerField => &self.field_graph,
        }
    }

    /// Línea de tiempo reconstruida desde los eventos del run.
    pub fn snapshot(&self, mode: RunMode, run_id: Uuid) -> RunSnapshot {
        RunSnapshot::replay(run_id, &self.executor.events_for(run_id), self.graph(mode))
    }

    pub fn generate(&self, request: &GenerationRequest, cancel: &CancellationToken) -> Result<Vec<GeneratedGuide>, ServiceError> {
        request.validate()?;
        let fields = request.effective_fields();
        info!(category = %request.category,
              product_type = %request.product_type,
              mode = %self.config.run_mode,
              fields = fields.len(),
              "generating style guide");
        match self.config.run_mode {
            RunMode::Document => {
                let fields_value = Value::from(fields);
                let outcome = self.run_with_retry(&self.document_graph, cancel, || {
                                      Ok(self.seed(request)?.with_var("fields_needed", fields_value.clone())?)
                                  })?;
                Ok(vec![self.publish(request, None, outcome)])
            }
            RunMode::PerField => {
                let results: Vec<(String, Result<GeneratedGuide, ServiceError>)> =
                    fields.par_iter()
                          .map(|field| (field.clone(), self.generate_field(request, field, cancel)))
                          .collect();
                let mut published = Vec::with_capacity(results.len());
                let mut failures = Vec::new();
                for (field, res) in results {
                    match res {
                        Ok(guide) => published.push(guide),
                        Err(error) => {
                            warn!(field = %field, "field not generated: {}", error);
                            failures.push(FieldFailure { field, error });
                        }
                    }
                }
                if failures.is_empty() {
                    Ok(published)
                } else {
                    Err(ServiceError::FieldsFailed { published, failures })
                }
            }
        }
    }

    fn generate_field(&self, request: &GenerationRequest, field: &String, cancel: &CancellationToken) -> Result<GeneratedGuide, ServiceError> {
        let outcome = self.run_with_retry(&self.field_graph, cancel, || {
                              Ok(self.seed(request)?.with_var("field_name", field.as_str())?)
                          })?;
        Ok(self.publish(request, Some(field), outcome))
    }

    fn seed(&self, request: &GenerationRequest) -> Result<WorkflowContext, ServiceError> {
        Ok(WorkflowContext::new().with_var("category", request.category.trim())?
                                 .with_var("product_type", request.product_type.trim())?)
    }

    /// Re-ejecuta el grafo completo (contexto nuevo) sólo ante
    /// `InvocationFailure`, hasta `invocation_retries` veces.
    fn run_with_retry<F>(&self, graph: &StageGraph, cancel: &CancellationToken, build: F) -> Result<RunOutcome, ServiceError>
        where F: Fn() -> Result<WorkflowContext, ServiceError>
    {
        let mut attempt = 0;
        loop {
            let ctx = knowledge_injectors(&self.knowledge).apply(build()?)?;
            match self.executor.run(graph, ctx, cancel) {
                Ok(outcome) => return Ok(outcome),
                Err(failure) if failure.kind() == ErrorKind::InvocationFailure
                                && attempt < self.config.invocation_retries
                                && !cancel.is_cancelled() =>
                {
                    attempt += 1;
                    warn!(run_id = %failure.run_id, attempt, "retrying after invocation failure: {}", failure);
                }
                Err(failure) => return Err(failure.into()),
            }
        }
    }

    fn publish(&self, request: &GenerationRequest, field: Option<&String>, outcome: RunOutcome) -> GeneratedGuide {
        let needs_review = outcome.needs_review();
        let body = render_body(&outcome);
        let mut pending = PendingArtifact::new(request.category.trim(), request.product_type.trim(), body.clone())
            .needs_review(needs_review);
        if let Some(f) = field {
            pending = pending.for_field(f.clone());
        }
        let artifact = self.artifacts.store(pending);
        match &artifact {
            Ok(id) => info!(run_id = %outcome.run_id, artifact = %id, needs_review, "style guide published"),
            Err(e) => warn!(run_id = %outcome.run_id, "style guide not published: {}", e),
        }
        GeneratedGuide { run_id: outcome.run_id,
                         field_name: field.cloned(),
                         body,
                         needs_review,
                         artifact }
    }
}

/// Texto final; los borradores parciales llevan `PARTIAL_PREFIX`.
pub fn render_body(outcome: &RunOutcome) -> String {
    let text = outcome.result_text();
    if outcome.needs_review() {
        format!("{PARTIAL_PREFIX}{text}")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_field_list_uses_defaults() {
        let req = GenerationRequest::new("Fashion", "Dresses");
        assert_eq!(req.effective_fields(), vec!["title", "shortDesc", "longDesc"]);
        let req = req.field("title");
        assert_eq!(req.effective_fields(), vec!["title"]);
    }

    #[test]
    fn blank_category_or_product_type_is_rejected() {
        assert!(matches!(GenerationRequest::new(" ", "Dresses").validate(), Err(ServiceError::InvalidRequest(_))));
        assert!(matches!(GenerationRequest::new("Fashion", "").validate(), Err(ServiceError::InvalidRequest(_))));
    }
}
