//! Integration tests for the public launch API
//!
//! These tests drive the crate the way an embedder would: through
//! `Launcher`, `LaunchRegistry` and `run_sync` only.

#![cfg(unix)]

use altair_core::{LaunchRegistry, Launcher};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| (*s).to_string()).collect()
}

#[tokio::test]
async fn test_many_launches_drain_registry() {
    let registry = Arc::new(LaunchRegistry::new());
    let launcher = Launcher::unix(Arc::clone(&registry));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut tags = Vec::new();
    for i in 0..10u32 {
        let tx = tx.clone();
        let script = format!("exit {}", i % 3);
        let tag = launcher
            .launch(&argv(&["/bin/sh", "-c", &script]), move |exit| {
                let _ = tx.send((i, exit));
            })
            .await
            .expect("launch should succeed");
        tags.push(tag);
    }
    drop(tx);

    let mut seen = 0;
    while let Some((i, exit)) = timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("timed out draining notifications")
    {
        assert_eq!(exit.exit_code, Some((i % 3) as i32));
        seen += 1;
    }
    assert_eq!(seen, 10);
    assert!(registry.is_empty());

    // Every tag is stale now; cancels are silent no-ops
    for tag in tags {
        launcher.cancel(tag);
    }
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_two_launchers_share_one_registry() {
    let registry = Arc::new(LaunchRegistry::new());
    let first = Launcher::unix(Arc::clone(&registry));
    let second = Launcher::unix(Arc::clone(&registry));

    let (tx_a, rx_a) = oneshot::channel();
    let (tx_b, rx_b) = oneshot::channel();
    let tag_a = first
        .launch(&argv(&["/bin/sleep", "0.2"]), move |exit| {
            let _ = tx_a.send(exit);
        })
        .await
        .expect("first launch should succeed");
    let tag_b = second
        .launch(&argv(&["/bin/sleep", "0.2"]), move |exit| {
            let _ = tx_b.send(exit);
        })
        .await
        .expect("second launch should succeed");

    assert_ne!(tag_a, tag_b);
    assert_eq!(registry.len(), 2);

    // Either launcher can cancel through the shared registry
    second.cancel(tag_a);

    let exit_b = timeout(Duration::from_secs(10), rx_b)
        .await
        .expect("timed out on second launch")
        .expect("second callback never sent");
    assert!(exit_b.is_success());

    // The suppressed callback is dropped unfired, so the sender side of
    // the channel goes away without sending.
    let res_a = timeout(Duration::from_secs(10), rx_a)
        .await
        .expect("timed out waiting for suppressed callback drop");
    assert!(res_a.is_err(), "suppressed callback must not send");
}

#[tokio::test]
async fn test_live_tags_reflect_in_flight_launches() {
    let registry = Arc::new(LaunchRegistry::new());
    let launcher = Launcher::unix(Arc::clone(&registry));

    let tag = launcher
        .launch(&argv(&["/bin/sleep", "0.5"]), |_| {})
        .await
        .expect("launch should succeed");
    assert!(registry.contains(tag));
    assert_eq!(registry.live_tags(), vec![tag]);

    timeout(Duration::from_secs(10), async {
        while registry.contains(tag) {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("record was never removed");
    assert!(registry.live_tags().is_empty());
}
