//! Workers concretos.
//!
//! - `StubWorker`: respuestas deterministas por rol, sin red. Sirve para la
//!   CLI en modo offline y para los tests de extremo a extremo.
//! - `CommandWorker`: delega en un proceso externo que recibe
//!   `{"role", "input"}` por stdin y responde el payload por stdout.
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use log::{debug, warn};
use serde_json::{json, Value};
use style_core::{Payload, Worker, WorkerFault};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::roles;

/// Marca que el stub agrega a cada revisión del borrador.
const REVISION_MARK: &str = "[revised]";

#[derive(Debug, Clone, Default)]
pub struct StubWorker {
    /// Rondas que el validador critica antes de aprobar.
    critique_rounds: usize,
    /// Rol que siempre falla con `Transport` (para simular caídas).
    failing_role: Option<String>,
}

impl StubWorker {
    /// Validador que aprueba el primer borrador.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn critique_rounds(mut self, rounds: usize) -> Self {
        self.critique_rounds = rounds;
        self
    }

    pub fn failing(mut self, role: impl Into<String>) -> Self {
        self.failing_role = Some(role.into());
        self
    }

    fn respond(&self, role: &str, input: &Payload) -> Value {
        let category = text(input, "category");
        let product_type = text(input, "product_type");
        match role {
            roles::KNOWLEDGE_RETRIEVAL => json!({
                "baseline_rules_summary": summarize(text(input, "baseline_guidelines")),
                "legal_guidelines_summary": summarize(text(input, "legal_guidelines")),
            }),
            roles::DOMAIN_BREAKDOWN => json!({
                "category_insights": [format!("{category} shoppers compare materials first")],
            }),
            roles::PRODUCT_TYPE_ANALYSIS => {
                let fields: Vec<Value> = input.get("fields_needed")
                                              .and_then(Value::as_array)
                                              .map(|a| a.iter().filter_map(Value::as_str).collect::<Vec<_>>())
                                              .unwrap_or_default()
                                              .into_iter()
                                              .map(|f| json!({"field": f, "notes": format!("{f} for {product_type}")}))
                                              .collect();
                json!({
                    "product_type_analysis": format!("{product_type} within {category}"),
                    "field_guidelines": fields,
                })
            }
            roles::SCHEMA_INFERENCE => json!({
                "final_schema": format!("{category}/{product_type}: title, shortDesc, longDesc"),
                "schema_details": ["title is mandatory"],
            }),
            roles::STYLE_GUIDE_CONSTRUCTION => json!({
                "draft_style_guide": format!("# {category} / {product_type}\n\nSchema: {}", text(input, "final_schema")),
            }),
            roles::LEGAL_REVIEW => {
                let draft = input.get(roles::STYLE_GUIDE_CONSTRUCTION)
                                 .and_then(|v| v.get("draft_style_guide"))
                                 .and_then(Value::as_str)
                                 .unwrap_or_default();
                json!({"legally_reviewed_guide": draft, "legal_issues_found": []})
            }
            roles::FINAL_REFINEMENT => {
                let reviewed = input.get(roles::LEGAL_REVIEW)
                                    .and_then(|v| v.get("legally_reviewed_guide"))
                                    .and_then(Value::as_str)
                                    .unwrap_or_default();
                json!({"final_style_guide": reviewed, "notes": []})
            }
            roles::WRITER => {
                let previous = input.get("previous_draft")
                                    .and_then(|d| d.get("draft_text"))
                                    .and_then(Value::as_str);
                let field = text(input, "field_name");
                let draft = match previous {
                    Some(prev) => format!("{prev} {REVISION_MARK}"),
                    None => format!("{field} guide for {category} / {product_type}"),
                };
                json!({"draft_text": draft})
            }
            roles::VALIDATOR => {
                let draft = input.get("draft")
                                 .and_then(|d| d.get("draft_text"))
                                 .and_then(Value::as_str)
                                 .unwrap_or_default();
                let revisions = draft.matches(REVISION_MARK).count();
                let feedback: Vec<String> = if revisions < self.critique_rounds {
                    vec![format!("round {}: tighten the wording", revisions + 1)]
                } else {
                    Vec::new()
                };
                json!({"pending_text": draft, "feedback": feedback})
            }
            other => json!({"role": other}),
        }
    }
}

impl Worker for StubWorker {
    fn call(&self, role: &str, input: &Payload) -> Result<String, WorkerFault> {
        if self.failing_role.as_deref() == Some(role) {
            return Err(WorkerFault::Transport(format!("stub role '{role}' is down")));
        }
        Ok(self.respond(role, input).to_string())
    }
}

fn text<'a>(input: &'a Payload, key: &str) -> &'a str {
    input.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn summarize(content: &str) -> String {
    match content.lines().next() {
        Some(first) if !first.trim().is_empty() => first.trim().to_string(),
        _ => "none".to_string(),
    }
}

/// Proceso externo por invocación.
///
/// Con `timeout` el proceso se mata al vencer el plazo (`kill_on_drop`), así
/// que un worker colgado no sobrevive a la llamada.
#[derive(Debug, Clone)]
pub struct CommandWorker {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandWorker {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(),
               args: Vec::new(),
               timeout: None }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    async fn run(&self, role: &str, request: String) -> Result<String, WorkerFault> {
        let mut child = Command::new(&self.program).args(&self.args)
                                                   .kill_on_drop(true)
                                                   .stdin(Stdio::piped())
                                                   .stdout(Stdio::piped())
                                                   .stderr(Stdio::piped())
                                                   .spawn()
                                                   .map_err(|e| WorkerFault::Transport(format!("cannot spawn '{}': {e}", self.program)))?;
        let stdin = child.stdin.take();
        // stdin se escribe mientras se drena stdout; si no, un payload grande bloquea a ambos
        let write = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(request.as_bytes()).await {
                Ok(()) => stdin.shutdown().await,
                // el proceso puede responder sin leer toda la entrada
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                Err(e) => Err(e),
            }
        };
        let (written, output) = tokio::join!(write, child.wait_with_output());
        let output = output.map_err(|e| WorkerFault::Transport(format!("worker process failed: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("worker '{}' exited with {} for role '{}'", self.program, output.status, role);
            return Err(WorkerFault::Transport(format!("exit status {}: {}", output.status, stderr.trim())));
        }
        written.map_err(|e| WorkerFault::Transport(format!("cannot write request: {e}")))?;
        String::from_utf8(output.stdout).map_err(|e| WorkerFault::Transport(format!("stdout is not UTF-8: {e}")))
    }
}

impl Worker for CommandWorker {
    fn call(&self, role: &str, input: &Payload) -> Result<String, WorkerFault> {
        let request = json!({"role": role, "input": input}).to_string();
        debug!("spawning '{}' for role '{}'", self.program, role);
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all()
                                                                   .build()
                                                                   .map_err(|e| WorkerFault::Transport(format!("cannot start runtime: {e}")))?;
        runtime.block_on(async {
                   let Some(limit) = self.timeout else {
                       return self.run(role, request).await;
                   };
                   match tokio::time::timeout(limit, self.run(role, request)).await {
                       Ok(res) => res,
                       Err(_) => {
                           warn!("worker '{}' killed after {:?} for role '{}'", self.program, limit, role);
                           Err(WorkerFault::Timeout(limit))
                       }
                   }
               })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use style_core::{PayloadSpec, WorkerInvoker};
    use std::sync::Arc;

    use crate::payloads::{FieldDraft, Verdict};

    fn input(v: Value) -> Payload {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn stub_validator_critiques_until_enough_revisions() {
        let stub = StubWorker::new().critique_rounds(1);
        let first = input(json!({"draft": {"draft_text": "title guide"}}));
        let v: Value = serde_json::from_str(&stub.call(roles::VALIDATOR, &first).unwrap()).unwrap();
        assert_eq!(v["feedback"], json!(["round 1: tighten the wording"]));

        let revised = input(json!({"draft": {"draft_text": "title guide [revised]"}}));
        let v: Value = serde_json::from_str(&stub.call(roles::VALIDATOR, &revised).unwrap()).unwrap();
        assert_eq!(v["feedback"], json!([]));
    }

    #[test]
    fn stub_outputs_satisfy_role_schemas() {
        let stub: Arc<dyn Worker> = Arc::new(StubWorker::new());
        let base = json!({"category": "Fashion", "product_type": "Dresses", "field_name": "title",
                          "baseline_guidelines": "", "feedback": []});
        let draft = WorkerInvoker::new(roles::writer(), Arc::clone(&stub)).invoke(&input(base.clone())).unwrap();
        assert!(FieldDraft::from_payload(&draft).is_ok());

        let mut critic_in = input(base);
        critic_in.insert("draft".into(), Value::Object(draft));
        let verdict = WorkerInvoker::new(roles::validator(), stub).invoke(&critic_in).unwrap();
        assert!(Verdict::from_payload(&verdict).unwrap().feedback.is_empty());
    }

    #[test]
    fn blank_style_guide_draft_is_rejected_at_the_boundary() {
        let blank = style_core::FnWorker::new(|_, _| Ok(r#"{"draft_style_guide": "   "}"#.to_string()));
        let invoker = WorkerInvoker::new(roles::style_guide_construction(), Arc::new(blank));
        let input = input(json!({"category": "Fashion", "product_type": "Dresses", "final_schema": "title"}));
        match invoker.invoke(&input) {
            Err(style_core::WorkerError::SchemaViolation { role, reason }) => {
                assert_eq!(role, roles::STYLE_GUIDE_CONSTRUCTION);
                assert!(reason.contains("draft_style_guide must not be blank"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn failing_role_reports_transport_fault() {
        let stub = StubWorker::new().failing(roles::LEGAL_REVIEW);
        assert!(matches!(stub.call(roles::LEGAL_REVIEW, &Payload::new()), Err(WorkerFault::Transport(_))));
        assert!(stub.call(roles::DOMAIN_BREAKDOWN, &Payload::new()).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn command_worker_reads_stdout_and_maps_exit_status() {
        let echo = CommandWorker::new("sh").arg("-c").arg("cat > /dev/null; echo '{\"draft_text\": \"from sh\"}'");
        let raw = echo.call(roles::WRITER, &Payload::new()).unwrap();
        assert!(raw.contains("from sh"));

        let broken = CommandWorker::new("sh").arg("-c").arg("cat > /dev/null; echo boom >&2; exit 3");
        match broken.call(roles::WRITER, &Payload::new()) {
            Err(WorkerFault::Transport(msg)) => assert!(msg.contains("boom")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn command_worker_kills_the_process_when_the_deadline_passes() {
        let pid_file = std::env::temp_dir().join(format!("styleflow-worker-{}.pid", std::process::id()));
        let script = format!("echo $$ > {}; exec sleep 5", pid_file.display());
        let slow = CommandWorker::new("sh").arg("-c").arg(script).timeout(Duration::from_millis(200));

        let started = std::time::Instant::now();
        assert_eq!(slow.call(roles::WRITER, &Payload::new()), Err(WorkerFault::Timeout(Duration::from_millis(200))));
        assert!(started.elapsed() < Duration::from_secs(4));

        std::thread::sleep(Duration::from_millis(300));
        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let _ = std::fs::remove_file(&pid_file);
        // muerto o zombie, nunca durmiendo
        if let Ok(stat) = std::fs::read_to_string(format!("/proc/{}/stat", pid.trim())) {
            let state = stat.rsplit(')').next().unwrap().trim_start().chars().next().unwrap();
            assert!(state == 'Z' || state == 'X', "worker process still alive in state {state}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn command_worker_streams_large_requests() {
        let big = "x".repeat(1 << 20);
        let echo = CommandWorker::new("cat").timeout(Duration::from_secs(20));
        let mut payload = Payload::new();
        payload.insert("brief".into(), Value::String(big.clone()));

        let raw = echo.call(roles::WRITER, &payload).unwrap();
        let v: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["role"], json!(roles::WRITER));
        assert_eq!(v["input"]["brief"].as_str().map(str::len), Some(big.len()));
    }
}
