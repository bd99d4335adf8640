//! Tests for tokio integration.
#![allow(unused_imports, dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use waiter::{Context, WaitGroup, Waiter};
use waiter_tokio::{AsyncWait, CancellationTokenSourceExt, TokenSource};

#[tokio::test]
async fn token_races_timer() {
    let token = CancellationToken::new();
    let waiter = Waiter::new()
        .with(TokenSource::new(token.clone()))
        .with(waiter::timeout(Duration::from_secs(10)));

    let start = Instant::now();
    let cancel_task = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    waiter.one_of().await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(20));
    assert!(start.elapsed() < Duration::from_secs(5));

    cancel_task.await.unwrap();
}

#[tokio::test]
async fn child_token_fires_with_parent() {
    let parent = CancellationToken::new();
    let waiter = Waiter::new().with(parent.child_token().as_source());

    parent.cancel();
    waiter.one_of().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn runtime_stays_responsive_while_waiting() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&ticks);
    let ticker = tokio::spawn(async move {
        for _ in 0..5 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            counted.fetch_add(1, Ordering::SeqCst);
        }
    });

    let waiter = Waiter::new().with(waiter::timeout(Duration::from_millis(100)));
    waiter.everyone().await.unwrap();

    ticker.await.unwrap();
    assert_eq!(ticks.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn mixed_sources_from_async() {
    let start = Instant::now();
    let token = CancellationToken::new();
    let group = WaitGroup::new();
    group.add(1);
    let ctx = Context::with_timeout(Duration::from_millis(15));

    let waiter = Waiter::new()
        .with(token.as_source())
        .with(waiter::group(group.clone()))
        .with(waiter::context(ctx));

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        group.done();
        tokio::time::sleep(Duration::from_millis(5)).await;
        token.cancel();
    });

    waiter.everyone().await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(15));
}

#[tokio::test]
async fn select_between_wait_and_shutdown() {
    let shutdown = CancellationToken::new();
    // Short enough that runtime shutdown does not stall on the blocking wait.
    let waiter = Waiter::new().with(waiter::timeout(Duration::from_millis(200)));

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        trigger.cancel();
    });

    let result = tokio::select! {
        _ = waiter.one_of() => "waited",
        _ = shutdown.cancelled() => "shutdown",
    };
    assert_eq!(result, "shutdown");
}

#[tokio::test]
async fn token_source_debug() {
    let token = CancellationToken::new();
    let source = TokenSource::new(token.clone());

    assert!(format!("{:?}", source).contains("TokenSource"));
    token.cancel();
    assert!(format!("{:?}", source).contains("true"));
}
