//! Tests for diagnostic sinks

use prometheus_throttle::core::{
    build_diagnostic_event, DiagnosticKind, DiagnosticSink, InMemoryDiagnosticSink, WorkId,
};

fn id(seq: u64) -> WorkId {
    WorkId {
        created_at_ms: 1,
        seq,
    }
}

#[test]
fn test_in_memory_sink_records() {
    let sink = InMemoryDiagnosticSink::new(10);
    sink.record(build_diagnostic_event("s1", id(1), DiagnosticKind::Dispatched));
    sink.record(build_diagnostic_event("s1", id(1), DiagnosticKind::Completed));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].scheduler, "s1");
    assert_eq!(events[0].kind, DiagnosticKind::Dispatched);
    assert_eq!(events[1].kind, DiagnosticKind::Completed);
}

#[test]
fn test_clones_share_buffer() {
    let sink = InMemoryDiagnosticSink::new(10);
    let handle = sink.clone();
    handle.record(build_diagnostic_event("s1", id(4), DiagnosticKind::Dispatched));
    assert_eq!(sink.ids(DiagnosticKind::Dispatched), vec![id(4)]);
}

#[test]
fn test_build_diagnostic_event() {
    let event = build_diagnostic_event("uploads", id(9), DiagnosticKind::Completed);
    assert_eq!(event.scheduler, "uploads");
    assert_eq!(event.task, id(9));
    assert!(event.at_ms > 0);
}

#[test]
fn test_event_serializes_snake_case_kind() {
    let event = build_diagnostic_event("uploads", id(2), DiagnosticKind::Dispatched);
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["kind"], "dispatched");
    assert_eq!(json["task"]["seq"], 2);
}
