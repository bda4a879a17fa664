//! `StageExecutor`: ejecuta un `StageGraph` en orden sobre un
//! `WorkflowContext`.
//!
//! Cada stage recibe las variables del contexto más el output de sus
//! upstreams, su payload se valida contra el schema del stage y se guarda
//! bajo el id del stage. Cualquier `Err` detiene el run (stop-on-failure) y
//! devuelve el contexto parcial; no hay checkpoint ni resume.
use std::sync::Arc;

use log::{debug, error, info, warn};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::builder::StageGraph;
use super::outcome::{ReviewFlag, ReviewReason, RunFailure, RunOutcome};
use crate::approval::{ApprovalGate, Decision, PendingApproval};
use crate::constants::ENGINE_VERSION;
use crate::errors::{ContextError, StageError, WorkerError};
use crate::event::{EventStore, FlowEvent, FlowEventKind, InMemoryEventStore};
use crate::hashing::hash_value;
use crate::iteration::{IterationController, IterationOutcome, IterationSpec};
use crate::model::{Payload, WorkflowContext};
use crate::stage::{StageAction, StageDescriptor};

pub struct StageExecutor {
    event_store: Arc<dyn EventStore>,
    gate: Option<Arc<dyn ApprovalGate>>,
}

impl Default for StageExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StageExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageExecutor").field("has_gate", &self.gate.is_some()).finish()
    }
}

impl StageExecutor {
    /// Executor con event store en memoria y sin gate de aprobación.
    pub fn new() -> Self {
        Self::with_event_store(Arc::new(InMemoryEventStore::new()))
    }

    pub fn with_event_store(event_store: Arc<dyn EventStore>) -> Self {
        Self { event_store,
               gate: None }
    }

    pub fn approval_gate(mut self, gate: Arc<dyn ApprovalGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn event_store(&self) -> &Arc<dyn EventStore> {
        &self.event_store
    }

    pub fn events_for(&self, run_id: Uuid) -> Vec<FlowEvent> {
        self.event_store.list(run_id)
    }

    /// Ejecuta todos los stages. El contexto se sella antes del primer stage.
    pub fn run(&self, graph: &StageGraph, ctx: WorkflowContext, cancel: &CancellationToken) -> Result<RunOutcome, RunFailure> {
        let mut ctx = ctx.seal();
        let run_id = ctx.run_id();
        info!("run {} started ({} stages)", run_id, graph.len());
        self.emit(run_id,
                  FlowEventKind::FlowInitialized { definition_hash: graph.definition_hash().to_string(),
                                                   stage_count: graph.len() });

        if let Some(missing) = graph.required_vars().iter().find(|v| ctx.var(v).is_none()) {
            let err = StageError::Context(ContextError::MissingVar(missing.clone()));
            error!("run {} rejected: {}", run_id, err);
            return Err(RunFailure { run_id,
                                    stage_id: None,
                                    error: err,
                                    context: ctx });
        }

        let mut reviews = Vec::new();
        let mut fingerprints = Vec::with_capacity(graph.len());
        for (index, stage) in graph.stages().iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(self.fail(run_id, index, stage, StageError::Cancelled, ctx));
            }
            self.emit(run_id,
                      FlowEventKind::StageStarted { stage_index: index,
                                                    stage_id: stage.id.clone() });
            debug!("run {}: stage {} '{}' ({})", run_id, index, stage.id, stage.action.label());

            let input = ctx.input_for(&stage.upstream);
            let (payload, review) = match self.execute(run_id, stage, &input, cancel) {
                Ok(done) => done,
                Err(e) => return Err(self.fail(run_id, index, stage, e, ctx)),
            };
            let output_hash = hash_value(&Value::Object(payload.clone()));
            if let Err(e) = ctx.merge_stage_output(&stage.id, payload, &stage.appends) {
                return Err(self.fail(run_id, index, stage, e.into(), ctx));
            }
            if let Some(flag) = review {
                reviews.push(flag);
            }

            let fingerprint = hash_value(&json!({
                "engine_version": ENGINE_VERSION,
                "definition_hash": graph.definition_hash(),
                "stage_index": index,
                "output_hash": output_hash,
            }));
            self.emit(run_id,
                      FlowEventKind::StageFinished { stage_index: index,
                                                     stage_id: stage.id.clone(),
                                                     output_hash,
                                                     fingerprint: fingerprint.clone() });
            fingerprints.push(fingerprint);
        }

        let result = match ctx.get(graph.result_key()).cloned() {
            Some(v) => v,
            None => {
                let err = StageError::Internal(format!("result '{}' missing after run", graph.result_key()));
                let last = graph.len() - 1;
                return Err(self.fail(run_id, last, &graph.stages()[last], err, ctx));
            }
        };
        let flow_fingerprint = hash_value(&json!({
            "engine_version": ENGINE_VERSION,
            "definition_hash": graph.definition_hash(),
            "stage_fingerprints": fingerprints,
        }));
        let needs_review = !reviews.is_empty();
        self.emit(run_id,
                  FlowEventKind::FlowCompleted { flow_fingerprint: flow_fingerprint.clone(),
                                                 needs_review });
        info!("run {} completed (needs_review={})", run_id, needs_review);
        Ok(RunOutcome { run_id,
                        context: ctx,
                        result,
                        reviews,
                        flow_fingerprint })
    }

    fn execute(&self,
               run_id: Uuid,
               stage: &StageDescriptor,
               input: &Payload,
               cancel: &CancellationToken)
               -> Result<(Payload, Option<ReviewFlag>), StageError> {
        let (payload, review) = match &stage.action {
            StageAction::Worker(invoker) => (invoker.invoke(input)?, None),
            StageAction::Iteration(spec) => self.execute_iteration(run_id, stage, spec, input, cancel)?,
        };
        stage.output
             .validate(&payload)
             .map_err(|v| WorkerError::SchemaViolation { role: stage.id.clone(),
                                                         reason: v.to_string() })?;
        Ok((payload, review))
    }

    fn execute_iteration(&self,
                         run_id: Uuid,
                         stage: &StageDescriptor,
                         spec: &IterationSpec,
                         input: &Payload,
                         cancel: &CancellationToken)
                         -> Result<(Payload, Option<ReviewFlag>), StageError> {
        let report = IterationController::new(spec, cancel).run(input)?;
        for round in &report.rounds {
            self.emit(run_id,
                      FlowEventKind::DraftProduced { stage_id: stage.id.clone(),
                                                     iteration: round.iteration,
                                                     draft_hash: hash_value(&Value::Object(round.draft.clone())) });
            self.emit(run_id,
                      FlowEventKind::CritiqueReceived { stage_id: stage.id.clone(),
                                                        iteration: round.iteration,
                                                        critique: round.critique.clone() });
        }
        let calls = report.state.producer_calls;
        self.emit(run_id,
                  FlowEventKind::IterationTerminated { stage_id: stage.id.clone(),
                                                       outcome: report.outcome.label().to_string(),
                                                       producer_calls: calls });

        let review = match &report.outcome {
            IterationOutcome::Exhausted { .. } => {
                Some(ReviewFlag { stage_id: stage.id.clone(),
                                  reason: ReviewReason::Exhausted { producer_calls: calls,
                                                                    last_critique: report.state.critique.clone() } })
            }
            IterationOutcome::Approved { draft } => self.consult_gate(run_id, stage, draft, calls),
        };
        Ok((report.outcome.into_draft(), review))
    }

    fn consult_gate(&self, run_id: Uuid, stage: &StageDescriptor, draft: &Payload, calls: u32) -> Option<ReviewFlag> {
        let gate = self.gate.as_ref()?;
        let pending = PendingApproval { run_id,
                                        stage_id: stage.id.clone(),
                                        draft: draft.clone(),
                                        producer_calls: calls };
        let decision = gate.decide(&pending);
        let (approved, reason) = match &decision {
            Decision::Approved => (true, None),
            Decision::Rejected { reason } => (false, Some(reason.clone())),
        };
        self.emit(run_id,
                  FlowEventKind::ApprovalDecided { stage_id: stage.id.clone(),
                                                   approved,
                                                   reason: reason.clone() });
        match decision {
            Decision::Approved => None,
            Decision::Rejected { reason } => {
                warn!("run {}: draft of '{}' rejected at approval: {}", run_id, stage.id, reason);
                Some(ReviewFlag { stage_id: stage.id.clone(),
                                  reason: ReviewReason::Rejected { reason } })
            }
        }
    }

    fn fail(&self, run_id: Uuid, index: usize, stage: &StageDescriptor, err: StageError, ctx: WorkflowContext) -> RunFailure {
        if err == StageError::Cancelled {
            info!("run {} cancelled at stage '{}'", run_id, stage.id);
            self.emit(run_id, FlowEventKind::FlowCancelled { stage_id: stage.id.clone() });
        } else {
            error!("run {} failed at stage '{}' ({}): {}", run_id, stage.id, err.kind(), err);
            self.emit(run_id,
                      FlowEventKind::StageFailed { stage_index: index,
                                                   stage_id: stage.id.clone(),
                                                   error: err.clone() });
        }
        RunFailure { run_id,
                     stage_id: Some(stage.id.clone()),
                     error: err,
                     context: ctx }
    }

    fn emit(&self, run_id: Uuid, kind: FlowEventKind) {
        let _ = self.event_store.append_kind(run_id, kind);
    }
}
