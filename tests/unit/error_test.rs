//! Tests for error types

use prometheus_throttle::core::SchedulerError;

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("limit must be greater than 0".to_string());
    assert_eq!(format!("{}", err), "invalid config: limit must be greater than 0");
}

#[test]
fn test_queue_full_error() {
    let err = SchedulerError::QueueFull("max queue depth 8 reached".to_string());
    assert_eq!(format!("{}", err), "queue full: max queue depth 8 reached");
}

#[test]
fn test_runtime_error() {
    let err = SchedulerError::Runtime("no reactor running".to_string());
    assert_eq!(format!("{}", err), "runtime unavailable: no reactor running");
}

#[test]
fn test_converts_into_app_result() {
    fn fails() -> prometheus_throttle::core::AppResult<()> {
        Err::<(), _>(SchedulerError::QueueFull("x".into()))?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert!(err.downcast_ref::<SchedulerError>().is_some());
}
