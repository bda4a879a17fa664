use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

use serde_json::{json, Value};
use style_core::event::variant_letters;
use style_core::{ApprovalGate, CancellationToken, Decision, FieldKind, FnWorker, IterationSpec, Payload, PendingApproval,
                 ReviewReason, Role, RunSnapshot, Schema, StageDescriptor, StageExecutor, StageGraph, StageStatus,
                 WorkerInvoker, WorkflowContext};

fn writer(calls: Arc<AtomicU32>) -> WorkerInvoker {
    let w = FnWorker::new(move |_, input: &Payload| {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        let cat = input.get("category").and_then(Value::as_str).unwrap_or("?");
        Ok(json!({ "draft_text": format!("{cat} guide v{n}") }).to_string())
    });
    WorkerInvoker::new(Role::new("writer",
                                 Schema::open("WriterInput").field("category", FieldKind::Text),
                                 Schema::new("Draft").field("draft_text", FieldKind::Text)),
                       Arc::new(w))
}

fn critic(always: Vec<&'static str>) -> WorkerInvoker {
    let w = FnWorker::new(move |_, _| Ok(json!({ "pending_text": "", "feedback": always }).to_string()));
    WorkerInvoker::new(Role::new("validator",
                                 Schema::open("ValidatorInput").field("draft", FieldKind::Object),
                                 Schema::new("Verdict").field("pending_text", FieldKind::Text)
                                                       .field("feedback", FieldKind::TextList)),
                       Arc::new(w))
}

fn fixed(id: &str, field: &str, value: &str) -> StageDescriptor {
    let mut out = Payload::new();
    out.insert(field.to_string(), Value::from(value));
    let body = Value::Object(out).to_string();
    let w = FnWorker::new(move |_, _| Ok(body.clone()));
    StageDescriptor::worker(id,
                            WorkerInvoker::new(Role::new(id, Schema::open("In"), Schema::new(id).field(field, FieldKind::Text)),
                                               Arc::new(w)))
}

fn seeded(category: &str) -> WorkflowContext {
    WorkflowContext::new().with_var("category", category).unwrap()
}

#[test]
fn stages_writing_same_field_name_stay_isolated() {
    let graph = StageGraph::builder().stage(fixed("a", "summary", "alpha"))
                                     .stage(fixed("b", "summary", "beta").after(["a"]))
                                     .result("b.summary")
                                     .build()
                                     .unwrap();
    let out = StageExecutor::new().run(&graph, seeded("Fashion"), &CancellationToken::new()).unwrap();
    assert_eq!(out.context.lookup("a.summary"), Some(&json!("alpha")));
    assert_eq!(out.context.lookup("b.summary"), Some(&json!("beta")));
    assert_eq!(out.result, json!("beta"));
}

#[test]
fn exhausted_iteration_keeps_partial_draft_and_flags_review() {
    let calls = Arc::new(AtomicU32::new(0));
    let graph = StageGraph::builder().require_var("category")
                                     .stage(StageDescriptor::iteration("title", IterationSpec::new(writer(calls.clone()), critic(vec!["too long"]), 2)))
                                     .result("title.draft_text")
                                     .build()
                                     .unwrap();
    let exec = StageExecutor::new();
    let out = exec.run(&graph, seeded("Fashion"), &CancellationToken::new()).unwrap();
    assert!(out.needs_review());
    assert_eq!(out.result_text(), "Fashion guide v2");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(matches!(&out.reviews[0].reason, ReviewReason::Exhausted { producer_calls: 2, last_critique } if last_critique == &vec!["too long".to_string()]));

    let events = exec.events_for(out.run_id);
    assert_eq!(variant_letters(&events), "ISDQDQTFC");
    let snap = RunSnapshot::replay(out.run_id, &events, &graph);
    assert!(snap.completed);
    assert!(snap.needs_review());
    assert_eq!(snap.stages[0].producer_calls, 2);
    assert_eq!(snap.cursor(), 1);
}

#[test]
fn iteration_stage_reads_upstream_and_feeds_downstream() {
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let log = seen.clone();
    let briefed = FnWorker::new(move |_, input: &Payload| {
        let summary = input.get("brief")
                           .and_then(|b| b.get("summary"))
                           .and_then(Value::as_str)
                           .unwrap_or_default()
                           .to_string();
        log.lock().unwrap().push(summary.clone());
        Ok(json!({ "draft_text": format!("Title: {summary}") }).to_string())
    });
    let producer = WorkerInvoker::new(Role::new("writer",
                                                Schema::open("WriterInput").field("brief", FieldKind::Object),
                                                Schema::new("Draft").field("draft_text", FieldKind::Text)),
                                      Arc::new(briefed));
    let echo = FnWorker::new(|_, input: &Payload| {
        let draft = input.get("title")
                         .and_then(|t| t.get("draft_text"))
                         .and_then(Value::as_str)
                         .unwrap_or_default();
        Ok(json!({ "headline": draft.to_uppercase() }).to_string())
    });
    let publish = StageDescriptor::worker("publish",
                                          WorkerInvoker::new(Role::new("publish",
                                                                       Schema::open("PublishInput").field("title", FieldKind::Object),
                                                                       Schema::new("Headline").field("headline", FieldKind::Text)),
                                                             Arc::new(echo)));

    let graph = StageGraph::builder().stage(fixed("brief", "summary", "lead with fabric"))
                                     .stage(StageDescriptor::iteration("title", IterationSpec::new(producer, critic(vec![]), 2)).after(["brief"]))
                                     .stage(publish.after(["title"]))
                                     .result("publish.headline")
                                     .build()
                                     .unwrap();
    let exec = StageExecutor::new();
    let out = exec.run(&graph, seeded("Fashion"), &CancellationToken::new()).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["lead with fabric".to_string()]);
    assert_eq!(out.context.lookup("title.draft_text"), Some(&json!("Title: lead with fabric")));
    assert_eq!(out.result, json!("TITLE: LEAD WITH FABRIC"));
    assert!(!out.needs_review());

    let snap = RunSnapshot::replay(out.run_id, &exec.events_for(out.run_id), &graph);
    assert!(snap.completed);
    assert!(snap.stages.iter().all(|s| s.status == StageStatus::FinishedOk));
    assert_eq!(snap.stages[1].producer_calls, 1);
}

struct RejectAll;

impl ApprovalGate for RejectAll {
    fn decide(&self, pending: &PendingApproval) -> Decision {
        Decision::Rejected { reason: format!("{} needs a human look", pending.stage_id) }
    }
}

#[test]
fn approval_gate_rejection_marks_run_for_review() {
    let calls = Arc::new(AtomicU32::new(0));
    let graph = StageGraph::builder().stage(StageDescriptor::iteration("title", IterationSpec::new(writer(calls), critic(vec![]), 3)))
                                     .result("title.draft_text")
                                     .build()
                                     .unwrap();
    let exec = StageExecutor::new().approval_gate(Arc::new(RejectAll));
    let out = exec.run(&graph, seeded("Home"), &CancellationToken::new()).unwrap();
    assert_eq!(out.result_text(), "Home guide v1");
    assert!(matches!(&out.reviews[0].reason, ReviewReason::Rejected { reason } if reason == "title needs a human look"));
    assert_eq!(variant_letters(&exec.events_for(out.run_id)), "ISDQTAFC");
}

#[test]
fn failed_run_replays_to_failed_stage() {
    let broken = StageDescriptor::worker("b",
                                         WorkerInvoker::new(Role::new("b", Schema::open("In"), Schema::new("B").field("x", FieldKind::Text)),
                                                            Arc::new(FnWorker::new(|_, _| Ok("{\"y\": 1}".to_string())))));
    let graph = StageGraph::builder().stage(fixed("a", "x", "ok"))
                                     .stage(broken)
                                     .result("b.x")
                                     .build()
                                     .unwrap();
    let exec = StageExecutor::new();
    let fail = exec.run(&graph, seeded("Fashion"), &CancellationToken::new()).unwrap_err();
    let snap = RunSnapshot::replay(fail.run_id, &exec.events_for(fail.run_id), &graph);
    assert_eq!(snap.stages[0].status, StageStatus::FinishedOk);
    assert_eq!(snap.failed_stage().map(|s| s.stage_id.as_str()), Some("b"));
    assert!(!snap.completed);
}

#[test]
fn concurrent_runs_do_not_share_context() {
    let calls = Arc::new(AtomicU32::new(0));
    let graph = Arc::new(StageGraph::builder().require_var("category")
                                              .stage(StageDescriptor::iteration("title", IterationSpec::new(writer(calls), critic(vec![]), 1)))
                                              .result("title.draft_text")
                                              .build()
                                              .unwrap());
    let exec = Arc::new(StageExecutor::new());
    let handles: Vec<_> = ["Fashion", "Home", "Garden", "Toys"].iter()
                                                                .map(|cat| {
                                                                    let (graph, exec) = (graph.clone(), exec.clone());
                                                                    let cat = cat.to_string();
                                                                    thread::spawn(move || {
                                                                        let out = exec.run(&graph, seeded(&cat), &CancellationToken::new()).unwrap();
                                                                        (cat, out.result_text())
                                                                    })
                                                                })
                                                                .collect();
    for h in handles {
        let (cat, text) = h.join().unwrap();
        assert!(text.starts_with(&format!("{cat} guide v")), "{text}");
    }
}
