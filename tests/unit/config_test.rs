//! Tests for configuration validation

use prometheus_throttle::config::{SchedulerConfig, ThrottleConfig};

#[test]
fn test_scheduler_config_defaults() {
    let config = SchedulerConfig::default();
    assert_eq!(config.name, "default");
    assert_eq!(config.limit, 3);
    assert_eq!(config.max_queue_depth, None);
    assert!(!config.diagnostics);
    assert!(!config.autostart);
    assert!(config.validate().is_ok());
}

#[test]
fn test_scheduler_config_invalid_limit() {
    let invalid = SchedulerConfig {
        limit: 0,
        ..SchedulerConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_queue_depth() {
    let invalid = SchedulerConfig {
        max_queue_depth: Some(0),
        ..SchedulerConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_invalid_name() {
    let invalid = SchedulerConfig {
        name: "  ".into(),
        ..SchedulerConfig::default()
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_scheduler_config_from_json_fills_defaults() {
    let config = SchedulerConfig::from_json_str(r#"{ "limit": 1, "diagnostics": true }"#).unwrap();
    assert_eq!(config.limit, 1);
    assert!(config.diagnostics);
    assert_eq!(config.name, "default");
}

#[test]
fn test_scheduler_config_from_json_rejects_zero_limit() {
    let err = SchedulerConfig::from_json_str(r#"{ "limit": 0 }"#).unwrap_err();
    assert!(err.contains("limit"));
}

#[test]
fn test_scheduler_config_from_json_rejects_negative_limit() {
    let err = SchedulerConfig::from_json_str(r#"{ "limit": -1 }"#).unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_throttle_config_empty() {
    let config = ThrottleConfig {
        schedulers: std::collections::HashMap::new(),
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_throttle_config_from_json() {
    let json = r#"{
        "schedulers": {
            "uploads": { "limit": 2, "max_queue_depth": 100 },
            "thumbnails": { "limit": 1, "autostart": true }
        }
    }"#;

    let config = ThrottleConfig::from_json_str(json).unwrap();
    assert_eq!(config.schedulers.len(), 2);
    assert_eq!(config.schedulers["uploads"].max_queue_depth, Some(100));
    assert!(config.schedulers["thumbnails"].autostart);
}

#[test]
fn test_throttle_config_names_invalid_entry() {
    let json = r#"{ "schedulers": { "broken": { "limit": 0 } } }"#;
    let err = ThrottleConfig::from_json_str(json).unwrap_err();
    assert!(err.contains("broken"));
}
