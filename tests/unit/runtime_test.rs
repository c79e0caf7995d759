//! Tests for tokio spawner utilities

use prometheus_throttle::core::Spawn;
use prometheus_throttle::runtime::tokio_spawner::TokioSpawner;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::current().unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[test]
fn test_tokio_spawner_from_explicit_handle() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let spawner = TokioSpawner::new(runtime.handle().clone());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send("done").unwrap();
    });
    assert_eq!(runtime.block_on(rx).unwrap(), "done");
}

#[test]
fn test_tokio_spawner_current_outside_runtime() {
    assert!(TokioSpawner::current().is_err());
}
