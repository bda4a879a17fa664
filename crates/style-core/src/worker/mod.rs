//! Invocación de workers externos (generadores de texto opacos).
//!
//! - `Worker`: la capacidad externa; recibe un rol y un input JSON y devuelve
//!   texto que debe ser un objeto JSON (opcionalmente dentro de un bloque de
//!   código Markdown).
//! - `WorkerInvoker`: liga un `Role` (schemas de input/output) a un `Worker`
//!   y hace cumplir ambos schemas en la frontera.
//! - `TimeoutWorker` / `FnWorker`: adaptadores genéricos.
pub mod fn_worker;
pub mod invoker;
pub mod timeout;

pub use fn_worker::FnWorker;
pub use invoker::{Role, Worker, WorkerFault, WorkerInvoker, WorkerResult};
pub use timeout::TimeoutWorker;
