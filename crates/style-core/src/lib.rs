//! style-core: núcleo de orquestación de workflows de generación de texto.
//!
//! Piezas, de las hojas hacia arriba:
//! - `knowledge`: resolución de conocimiento con fallback por tiers.
//! - `worker`: invocación de capacidades externas con schemas en la
//!   frontera.
//! - `iteration`: bucle productor/crítico acotado.
//! - `engine`: grafo de stages validado y executor secuencial.
//! - `repo`: sink de artifacts y replay de eventos.
pub mod approval;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod injection;
pub mod iteration;
pub mod knowledge;
pub mod model;
pub mod repo;
pub mod stage;
pub mod worker;

pub use approval::{ApprovalGate, AutoApprove, Decision, PendingApproval};
pub use engine::{ReviewFlag, ReviewReason, RunFailure, RunOutcome, StageExecutor, StageGraph, StageGraphBuilder};
pub use errors::{ContextError, ErrorKind, GraphError, KnowledgeError, PersistenceFailure, StageError, WorkerError};
pub use event::{EventStore, FlowEvent, FlowEventKind, InMemoryEventStore};
pub use injection::{CompositeInjector, StaticInjector, VarInjector};
pub use iteration::{IterationController, IterationOutcome, IterationPhase, IterationReport, IterationSpec, IterationState};
pub use knowledge::{InMemoryKnowledgeSource, KnowledgeKey, KnowledgeKind, KnowledgeResolver, KnowledgeSource, Resolution};
pub use model::{Artifact, ArtifactId, ContextKey, FieldKind, Payload, PayloadSpec, PendingArtifact, Schema, SchemaViolation, WorkflowContext};
pub use repo::{ArtifactStore, InMemoryArtifactStore, RunSnapshot};
pub use stage::{StageAction, StageDescriptor, StageStatus};
pub use worker::{FnWorker, Role, TimeoutWorker, Worker, WorkerFault, WorkerInvoker, WorkerResult};

/// Token de cancelación cooperativa compartido entre el caller y el run.
pub use tokio_util::sync::CancellationToken;
