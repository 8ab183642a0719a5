//! Pending registry behavior.

use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;
use vmp_commands::{CommandKind, CommandOutcome, CorrelationKey, PendingRegistry, ProtocolFailure};

fn key(device_id: &str) -> CorrelationKey {
    CorrelationKey::for_command(CommandKind::DeviceStatus, device_id, None)
}

#[tokio::test(start_paused = true)]
async fn test_first_completion_wins() {
    let registry = PendingRegistry::new();
    let k = key("dev1");
    let handle = registry.register(k.clone(), Duration::from_secs(2));
    assert!(registry.is_pending(&k));

    assert!(registry.complete(&k, CommandOutcome::Success(json!({"online": true}))));
    assert!(!registry.complete(&k, CommandOutcome::Failure(ProtocolFailure::new(500, "late"))));
    assert!(!registry.expire(&k));
    assert!(registry.is_empty());

    assert_eq!(handle.wait().await, CommandOutcome::Success(json!({"online": true})));

    let stats = registry.stats();
    assert_eq!(stats.registered, 1);
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.unmatched, 2);
}

#[tokio::test(start_paused = true)]
async fn test_completion_before_deadline_wins_over_timer() {
    let registry = PendingRegistry::new();
    let k = key("dev1");
    let handle = registry.register(k.clone(), Duration::from_secs(2));
    let start = Instant::now();

    let completer = registry.clone();
    let pushed = k.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        completer.complete(&pushed, CommandOutcome::Success(json!("p")));
    });

    assert_eq!(handle.wait().await, CommandOutcome::Success(json!("p")));
    assert_eq!(start.elapsed(), Duration::from_millis(300));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(registry.stats().timed_out, 0);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_never_early() {
    let registry = PendingRegistry::new();
    let k = key("dev1");
    let handle = registry.register(k.clone(), Duration::from_millis(2000));
    let start = Instant::now();

    assert_eq!(handle.wait().await, CommandOutcome::TimedOut);
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(2000));
    assert!(elapsed < Duration::from_millis(2100));

    assert!(!registry.is_pending(&k));
    assert!(!registry.complete(&k, CommandOutcome::Success(json!(null))));
    assert_eq!(registry.stats().timed_out, 1);
}

#[tokio::test(start_paused = true)]
async fn test_reregister_orphans_previous() {
    let registry = PendingRegistry::new();
    let k = key("dev1");
    let start = Instant::now();

    let first = registry.register(k.clone(), Duration::from_secs(3));
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = registry.register(k.clone(), Duration::from_secs(3));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.stats().orphaned, 1);

    assert!(registry.complete(&k, CommandOutcome::Success(json!("p"))));
    assert_eq!(second.wait().await, CommandOutcome::Success(json!("p")));

    assert_eq!(first.wait().await, CommandOutcome::TimedOut);
    assert_eq!(start.elapsed(), Duration::from_secs(3));
    assert!(registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_orphan_timeout_leaves_newer_slot_mapped() {
    let registry = PendingRegistry::new();
    let k = key("dev1");

    let first = registry.register(k.clone(), Duration::from_secs(1));
    let _second = registry.register(k.clone(), Duration::from_secs(10));

    assert_eq!(first.wait().await, CommandOutcome::TimedOut);
    assert!(registry.is_pending(&k));
}

#[tokio::test]
async fn test_dropped_handle_withdraws_slot() {
    let registry = PendingRegistry::new();
    let k = key("dev1");

    let handle = registry.register(k.clone(), Duration::from_secs(2));
    drop(handle);

    assert!(registry.is_empty());
    assert!(!registry.complete(&k, CommandOutcome::Success(json!(1))));
    assert_eq!(registry.stats().abandoned, 1);
}

#[tokio::test]
async fn test_dropping_orphan_keeps_newer_slot() {
    let registry = PendingRegistry::new();
    let k = key("dev1");

    let first = registry.register(k.clone(), Duration::from_secs(2));
    let second = registry.register(k.clone(), Duration::from_secs(2));
    drop(first);

    assert!(registry.is_pending(&k));
    assert!(registry.complete(&k, CommandOutcome::Success(json!(2))));
    assert_eq!(second.wait().await, CommandOutcome::Success(json!(2)));
}

#[tokio::test(start_paused = true)]
async fn test_wait_dropped_mid_flight_withdraws_slot() {
    let registry = PendingRegistry::new();
    let k = key("dev1");

    let handle = registry.register(k.clone(), Duration::from_secs(2));
    let cut_short = tokio::time::timeout(Duration::from_millis(100), handle.wait()).await;
    assert!(cut_short.is_err());
    assert!(!registry.is_pending(&k));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_distinct_keys() {
    let registry = PendingRegistry::new();

    let waiters: Vec<_> = (0..200)
        .map(|i| {
            let handle = registry.register(key(&format!("dev{i}")), Duration::from_secs(30));
            tokio::spawn(handle.wait())
        })
        .collect();

    let completers: Vec<_> = (0..200)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry.complete(&key(&format!("dev{i}")), CommandOutcome::Success(json!(i)))
            })
        })
        .collect();

    for done in futures::future::join_all(completers).await {
        assert!(done.unwrap());
    }
    for (i, waiter) in futures::future::join_all(waiters).await.into_iter().enumerate() {
        assert_eq!(waiter.unwrap(), CommandOutcome::Success(json!(i)));
    }
    assert!(registry.is_empty());
    assert_eq!(registry.stats().succeeded, 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_completions_resolve_once() {
    let registry = PendingRegistry::new();
    let k = key("dev1");
    let handle = registry.register(k.clone(), Duration::from_secs(30));

    let racers: Vec<_> = (0..16)
        .map(|i| {
            let registry = registry.clone();
            let k = k.clone();
            tokio::spawn(async move { registry.complete(&k, CommandOutcome::Success(json!(i))) })
        })
        .collect();

    let wins = futures::future::join_all(racers)
        .await
        .into_iter()
        .filter(|r| *r.as_ref().unwrap())
        .count();
    assert_eq!(wins, 1);
    assert!(handle.wait().await.is_success());
}
