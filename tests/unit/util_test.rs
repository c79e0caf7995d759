//! Tests for utility functions

use prometheus_throttle::core::WorkId;
use prometheus_throttle::util::{init_tracing, now_ms};

#[test]
fn test_now_ms_advances() {
    let first = now_ms();
    std::thread::sleep(std::time::Duration::from_millis(2));
    assert!(now_ms() > first);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}

#[test]
fn test_work_id_display() {
    let id = WorkId {
        created_at_ms: 1_700_000_000_000,
        seq: 42,
    };
    assert_eq!(id.to_string(), "1700000000000-42");
}
