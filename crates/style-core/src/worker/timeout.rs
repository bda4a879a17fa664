//! Timeout por invocación.
//!
//! La llamada corre en un hilo auxiliar; si no responde a tiempo el invoker
//! recibe `WorkerFault::Timeout`. El hilo no se interrumpe: su respuesta
//! tardía se descarta. Un worker que retiene procesos o conexiones debe
//! aplicar además su propio plazo y liberarlos.
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use log::warn;

use super::invoker::{Worker, WorkerFault};
use crate::model::Payload;

pub struct TimeoutWorker {
    inner: Arc<dyn Worker>,
    timeout: Duration,
}

impl TimeoutWorker {
    pub fn new(inner: Arc<dyn Worker>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl Worker for TimeoutWorker {
    fn call(&self, role: &str, input: &Payload) -> Result<String, WorkerFault> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let role_owned = role.to_string();
        let input = input.clone();
        thread::Builder::new().name(format!("worker-{role}"))
                              .spawn(move || {
                                  // el receptor puede haberse ido por timeout
                                  let _ = tx.send(inner.call(&role_owned, &input));
                              })
                              .map_err(|e| WorkerFault::Transport(format!("cannot spawn worker thread: {e}")))?;
        match rx.recv_timeout(self.timeout) {
            Ok(res) => res,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!("role '{}' exceeded {:?}", role, self.timeout);
                Err(WorkerFault::Timeout(self.timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(WorkerFault::Transport("worker thread panicked".into())),
        }
    }
}
