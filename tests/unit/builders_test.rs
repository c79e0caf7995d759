//! Tests for builder modules

use std::sync::Arc;

use prometheus_throttle::builders::{build_schedulers, SchedulerBuilder};
use prometheus_throttle::config::{SchedulerConfig, ThrottleConfig};
use prometheus_throttle::core::{
    DiagnosticSink, InMemoryDiagnosticSink, SchedulerError, Status,
};
use prometheus_throttle::infra::queue::InMemoryQueue;
use prometheus_throttle::runtime::TokioSpawner;

#[test]
fn test_scheduler_builder_defaults() {
    let builder = SchedulerBuilder::named("uploads").limit(2).diagnostics(true);
    assert_eq!(builder.name(), "uploads");
    assert_eq!(builder.config().limit, 2);
    assert!(builder.config().diagnostics);
    assert_eq!(builder.config().max_queue_depth, None);
}

#[test]
fn test_scheduler_builder_default_limit() {
    assert_eq!(SchedulerBuilder::default_limit(), 3);
}

#[tokio::test]
async fn test_builder_rejects_zero_limit() {
    let result = SchedulerBuilder::named("bad")
        .limit(0)
        .build(TokioSpawner::current().unwrap());
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_builder_autostart() {
    let scheduler = SchedulerBuilder::new(SchedulerConfig::default())
        .autostart(true)
        .max_queue_depth(Some(4))
        .build(TokioSpawner::current().unwrap())
        .unwrap();
    assert_eq!(scheduler.status(), Status::Running);
    assert_eq!(scheduler.limit(), 3);
}

#[tokio::test]
async fn test_build_with_queue_checks_configured_depth() {
    let mismatched = SchedulerBuilder::named("uploads")
        .max_queue_depth(Some(4))
        .build_with_queue(InMemoryQueue::bounded(2), TokioSpawner::current().unwrap());
    assert!(matches!(mismatched, Err(SchedulerError::InvalidConfig(_))));

    let matching = SchedulerBuilder::named("uploads")
        .max_queue_depth(Some(2))
        .build_with_queue(InMemoryQueue::bounded(2), TokioSpawner::current().unwrap())
        .unwrap();
    assert_eq!(matching.stats().max_queue_depth, Some(2));

    let queue_bound_wins = SchedulerBuilder::named("uploads")
        .build_with_queue(InMemoryQueue::bounded(3), TokioSpawner::current().unwrap())
        .unwrap();
    assert_eq!(queue_bound_wins.stats().max_queue_depth, Some(3));
}

#[tokio::test]
async fn test_build_schedulers_names_from_keys() {
    let config = ThrottleConfig::from_json_str(
        r#"{ "schedulers": {
            "uploads": { "name": "ignored", "limit": 2 },
            "thumbnails": { "limit": 1, "diagnostics": true }
        } }"#,
    )
    .unwrap();
    let sink = InMemoryDiagnosticSink::new(16);

    let schedulers = build_schedulers(&config, TokioSpawner::current().unwrap(), |_, cfg| {
        cfg.diagnostics
            .then(|| Arc::new(sink.clone()) as Arc<dyn DiagnosticSink>)
    })
    .unwrap();

    assert_eq!(schedulers.len(), 2);
    assert_eq!(schedulers["uploads"].name(), "uploads");
    assert_eq!(schedulers["uploads"].limit(), 2);
    assert!(schedulers["thumbnails"].diagnostics_enabled());
    assert!(!schedulers["uploads"].diagnostics_enabled());
}
