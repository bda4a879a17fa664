//! `StageGraphBuilder`: arma y valida un grafo de stages.
//!
//! Todas las colisiones y referencias rotas son errores de configuración que
//! se detectan aquí, antes de cualquier run.
use std::collections::{HashMap, HashSet};

use serde_json::json;

use crate::constants::RESERVED_NAMES;
use crate::errors::GraphError;
use crate::hashing::hash_value;
use crate::model::ContextKey;
use crate::stage::{StageAction, StageDescriptor};

/// Grafo validado e inmutable.
#[derive(Debug, Clone)]
pub struct StageGraph {
    stages: Vec<StageDescriptor>,
    required_vars: Vec<String>,
    result: ContextKey,
    definition_hash: String,
}

impl StageGraph {
    pub fn builder() -> StageGraphBuilder {
        StageGraphBuilder::new()
    }

    pub fn stages(&self) -> &[StageDescriptor] {
        &self.stages
    }

    pub fn stage_ids(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn required_vars(&self) -> &[String] {
        &self.required_vars
    }

    pub fn result_key(&self) -> &ContextKey {
        &self.result
    }

    pub fn definition_hash(&self) -> &str {
        &self.definition_hash
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct StageGraphBuilder {
    stages: Vec<StageDescriptor>,
    required_vars: Vec<String>,
    result: Option<String>,
}

impl StageGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variable semilla que debe existir antes del primer stage.
    pub fn require_var(mut self, name: impl Into<String>) -> Self {
        self.required_vars.push(name.into());
        self
    }

    pub fn stage(mut self, stage: StageDescriptor) -> Self {
        self.stages.push(stage);
        self
    }

    /// Campo que se entrega como resultado del run (`stage.field`).
    pub fn result(mut self, key: impl Into<String>) -> Self {
        self.result = Some(key.into());
        self
    }

    pub fn build(self) -> Result<StageGraph, GraphError> {
        if self.stages.is_empty() {
            return Err(GraphError::Empty);
        }
        for var in &self.required_vars {
            if RESERVED_NAMES.contains(&var.as_str()) {
                return Err(GraphError::ReservedName(var.clone()));
            }
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut writers: HashMap<&str, &str> = self.required_vars.iter().map(|v| (v.as_str(), "<seed>")).collect();
        for stage in &self.stages {
            let id = stage.id.as_str();
            if RESERVED_NAMES.contains(&id) || id.contains('.') {
                return Err(GraphError::ReservedName(stage.id.clone()));
            }
            if seen.contains(id) {
                return Err(GraphError::DuplicateStage(stage.id.clone()));
            }
            check_upstream(stage, &seen, &self.stages)?;
            for var in &stage.appends {
                if RESERVED_NAMES.contains(&var.as_str()) {
                    return Err(GraphError::ReservedName(var.clone()));
                }
                if !stage.output.has_field(var) {
                    return Err(GraphError::AppendNotInSchema { stage: stage.id.clone(),
                                                               field: var.clone() });
                }
                if let Some(other) = writers.insert(var.as_str(), id) {
                    return Err(GraphError::AppendCollision { var: var.clone(),
                                                             stage: stage.id.clone(),
                                                             other: other.to_string() });
                }
            }
            if let StageAction::Iteration(spec) = &stage.action {
                if spec.max_iterations < 1 {
                    return Err(GraphError::InvalidIterationCap { stage: stage.id.clone(),
                                                                 cap: spec.max_iterations });
                }
                if !spec.critic_declares_critique() {
                    return Err(GraphError::MissingCritiqueField { stage: stage.id.clone(),
                                                                  field: spec.critique_field.clone() });
                }
            }
            seen.insert(id);
        }
        // el input de un stage lleva vars y outputs upstream en el mismo objeto
        if let Some(stage) = self.stages.iter().find(|s| writers.contains_key(s.id.as_str())) {
            return Err(GraphError::StageShadowsVar(stage.id.clone()));
        }

        let raw = self.result.ok_or(GraphError::MissingResult)?;
        let result = ContextKey::parse(&raw).ok_or_else(|| GraphError::UnknownResult(raw.clone()))?;
        let declared = self.stages
                           .iter()
                           .find(|s| s.id == result.stage)
                           .map(|s| s.output.field_spec(&result.field).map(|f| f.required).unwrap_or(false))
                           .unwrap_or(false);
        if !declared {
            return Err(GraphError::UnknownResult(raw));
        }

        let definition_hash = definition_hash(&self.stages, &self.required_vars, &result);
        Ok(StageGraph { stages: self.stages,
                        required_vars: self.required_vars,
                        result,
                        definition_hash })
    }
}

fn check_upstream(stage: &StageDescriptor, earlier: &HashSet<&str>, all: &[StageDescriptor]) -> Result<(), GraphError> {
    for up in &stage.upstream {
        if earlier.contains(up.as_str()) {
            continue;
        }
        return Err(if all.iter().any(|s| &s.id == up) {
                       GraphError::UpstreamNotEarlier { stage: stage.id.clone(),
                                                        upstream: up.clone() }
                   } else {
                       GraphError::UnknownUpstream { stage: stage.id.clone(),
                                                     upstream: up.clone() }
                   });
    }
    Ok(())
}

fn definition_hash(stages: &[StageDescriptor], required: &[String], result: &ContextKey) -> String {
    let stages_json: Vec<_> = stages.iter()
                                    .map(|s| {
                                        json!({
                                            "id": s.id,
                                            "action": s.action.label(),
                                            "upstream": s.upstream,
                                            "appends": s.appends,
                                            "output": s.output.name(),
                                        })
                                    })
                                    .collect();
    hash_value(&json!({
        "stages": stages_json,
        "required_vars": required,
        "result": result.to_string(),
    }))
}
