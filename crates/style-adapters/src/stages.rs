//! Grafos de stages de la guía de estilo, construidos por funciones fábrica.
//!
//! - `style_guide_graph`: documento completo en siete stages secuenciales.
//! - `field_guide_graph`: un campo (título, descripción...) escrito por un
//!   bucle escritor/validador acotado.
use std::sync::Arc;

use style_core::{GraphError, IterationSpec, StageDescriptor, StageGraph, Worker, WorkerInvoker};

use crate::roles;

/// Variables semilla del documento completo.
pub const DOCUMENT_VARS: &[&str] = &["category", "product_type", "fields_needed", "baseline_guidelines", "legal_guidelines"];

/// Variables semilla del bucle por campo.
pub const FIELD_VARS: &[&str] = &["category", "product_type", "field_name", "baseline_guidelines", "legal_guidelines"];

pub const DOCUMENT_RESULT: &str = "final_refinement.final_style_guide";
pub const FIELD_STAGE: &str = "field_guide";
pub const FIELD_RESULT: &str = "field_guide.draft_text";

pub fn style_guide_graph(worker: Arc<dyn Worker>) -> Result<StageGraph, GraphError> {
    let bind = |role| WorkerInvoker::new(role, Arc::clone(&worker));
    let builder = DOCUMENT_VARS.iter().fold(StageGraph::builder(), |b, v| b.require_var(*v));
    builder.stage(StageDescriptor::worker(roles::KNOWLEDGE_RETRIEVAL, bind(roles::knowledge_retrieval())))
           .stage(StageDescriptor::worker(roles::DOMAIN_BREAKDOWN, bind(roles::domain_breakdown())).after([roles::KNOWLEDGE_RETRIEVAL]))
           .stage(StageDescriptor::worker(roles::PRODUCT_TYPE_ANALYSIS, bind(roles::product_type_analysis())).after([roles::DOMAIN_BREAKDOWN]))
           .stage(StageDescriptor::worker(roles::SCHEMA_INFERENCE, bind(roles::schema_inference())).after([roles::PRODUCT_TYPE_ANALYSIS])
                                                                                                   .appends("final_schema"))
           .stage(StageDescriptor::worker(roles::STYLE_GUIDE_CONSTRUCTION, bind(roles::style_guide_construction()))
                      .after([roles::KNOWLEDGE_RETRIEVAL, roles::DOMAIN_BREAKDOWN, roles::PRODUCT_TYPE_ANALYSIS, roles::SCHEMA_INFERENCE]))
           .stage(StageDescriptor::worker(roles::LEGAL_REVIEW, bind(roles::legal_review())).after([roles::STYLE_GUIDE_CONSTRUCTION]))
           .stage(StageDescriptor::worker(roles::FINAL_REFINEMENT, bind(roles::final_refinement())).after([roles::LEGAL_REVIEW]))
           .result(DOCUMENT_RESULT)
           .build()
}

pub fn field_guide_graph(worker: Arc<dyn Worker>, max_iterations: u32) -> Result<StageGraph, GraphError> {
    let spec = IterationSpec::new(WorkerInvoker::new(roles::writer(), Arc::clone(&worker)),
                                  WorkerInvoker::new(roles::validator(), worker),
                                  max_iterations);
    let builder = FIELD_VARS.iter().fold(StageGraph::builder(), |b, v| b.require_var(*v));
    builder.stage(StageDescriptor::iteration(FIELD_STAGE, spec))
           .result(FIELD_RESULT)
           .build()
}
