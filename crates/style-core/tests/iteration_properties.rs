use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;
use style_core::{CancellationToken, FieldKind, FnWorker, IterationController, IterationPhase, IterationSpec, Payload, Role,
                 Schema, WorkerInvoker};

/// Spec cuyo crítico devuelve `script[i]` ítems de crítica en la llamada i
/// (0 = aprobado); más allá del guion critica siempre.
fn scripted(script: Vec<usize>, cap: u32, producer_calls: Arc<AtomicU32>) -> IterationSpec {
    let producer = FnWorker::new(move |_, _| {
        let n = producer_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(json!({ "text": format!("draft {n}") }).to_string())
    });
    let cursor = AtomicUsize::new(0);
    let critic = FnWorker::new(move |_, _| {
        let i = cursor.fetch_add(1, Ordering::SeqCst);
        let n = script.get(i).copied().unwrap_or(1);
        let items: Vec<String> = (0..n).map(|k| format!("issue {k}")).collect();
        Ok(json!({ "feedback": items }).to_string())
    });
    IterationSpec::new(WorkerInvoker::new(Role::new("writer",
                                                    Schema::open("WriterInput"),
                                                    Schema::new("Draft").field("text", FieldKind::Text)),
                                          Arc::new(producer)),
                       WorkerInvoker::new(Role::new("validator",
                                                    Schema::open("ValidatorInput"),
                                                    Schema::new("Verdict").field("feedback", FieldKind::TextList)),
                                          Arc::new(critic)),
                       cap)
}

proptest! {
    #[test]
    fn terminates_within_cap_in_exactly_one_terminal_state(cap in 1u32..8, script in prop::collection::vec(0usize..3, 0..10)) {
        let calls = Arc::new(AtomicU32::new(0));
        let spec = scripted(script.clone(), cap, calls.clone());
        let token = CancellationToken::new();
        let report = IterationController::new(&spec, &token).run(&Payload::new()).unwrap();

        let made = calls.load(Ordering::SeqCst);
        prop_assert!(made >= 1 && made <= cap);
        prop_assert_eq!(made, report.state.producer_calls);
        prop_assert!(report.state.iteration <= cap);

        let terminal = *report.trace.last().unwrap();
        prop_assert!(terminal == IterationPhase::Approved || terminal == IterationPhase::Exhausted);
        prop_assert_eq!(report.trace.iter().filter(|p| p.is_terminal()).count(), 1);

        // crítica vacía ⇔ aprobado
        let approved = report.outcome.is_approved();
        prop_assert_eq!(approved, report.state.critique.is_empty());
        let first_accept = script.iter().position(|n| *n == 0);
        match first_accept {
            Some(i) if (i as u32) < cap => {
                prop_assert!(approved);
                prop_assert_eq!(made, i as u32 + 1);
            }
            _ => {
                prop_assert!(!approved);
                prop_assert_eq!(made, cap);
            }
        }
    }
}

#[test]
fn approved_after_exactly_two_calls_with_cap_two() {
    let calls = Arc::new(AtomicU32::new(0));
    let spec = scripted(vec![1, 0], 2, calls.clone());
    let token = CancellationToken::new();
    let report = IterationController::new(&spec, &token).run(&Payload::new()).unwrap();
    assert!(report.outcome.is_approved());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn exhausted_after_exactly_one_call_with_cap_one() {
    let calls = Arc::new(AtomicU32::new(0));
    let spec = scripted(vec![2, 2, 2], 1, calls.clone());
    let token = CancellationToken::new();
    let report = IterationController::new(&spec, &token).run(&Payload::new()).unwrap();
    assert!(!report.outcome.is_approved());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.outcome.draft().get("text"), Some(&json!("draft 1")));
}
