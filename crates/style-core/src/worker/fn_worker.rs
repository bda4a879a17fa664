use super::invoker::{Worker, WorkerFault};
use crate::model::Payload;

/// Adapta un closure a `Worker`.
pub struct FnWorker<F>
    where F: Fn(&str, &Payload) -> Result<String, WorkerFault> + Send + Sync
{
    f: F,
}

impl<F> FnWorker<F> where F: Fn(&str, &Payload) -> Result<String, WorkerFault> + Send + Sync
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Worker for FnWorker<F> where F: Fn(&str, &Payload) -> Result<String, WorkerFault> + Send + Sync
{
    fn call(&self, role: &str, input: &Payload) -> Result<String, WorkerFault> {
        (self.f)(role, input)
    }
}
