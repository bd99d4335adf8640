//! Tests for racing sources with `wait_one_of`.
#![allow(unused_imports, dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use waiter::{
    Abandon, Context, Fired, Source, TimerSource, WaitError, WaitGroup, Waiter,
};

/// Upper bound slack for scheduling noise.
const SLACK: Duration = Duration::from_millis(250);

fn timed(waiter: &Waiter) -> Duration {
    timed_since(Instant::now(), waiter)
}

/// Measures from `start`, taken before any deadline or trigger was armed.
fn timed_since(start: Instant, waiter: &Waiter) -> Duration {
    waiter.wait_one_of().unwrap();
    start.elapsed()
}

fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}

#[test]
fn race_picks_the_shortest_timer() {
    let waiter = Waiter::new()
        .with(waiter::timeout(Duration::from_secs(5)))
        .with(waiter::timeout(Duration::from_millis(10)))
        .with(waiter::timeout(Duration::from_secs(2)));

    let elapsed = timed(&waiter);
    assert!(elapsed >= Duration::from_millis(10), "returned early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(10) + SLACK, "returned late: {elapsed:?}");
}

#[test]
fn race_is_independent_of_source_count() {
    let mut waiter = Waiter::new().with(waiter::timeout(Duration::from_millis(20)));
    for _ in 0..32 {
        waiter = waiter.with(waiter::timeout(Duration::from_secs(10)));
    }

    let elapsed = timed(&waiter);
    assert!(elapsed >= Duration::from_millis(20));
    assert!(elapsed < Duration::from_millis(20) + SLACK);
}

#[test]
fn single_source_race_matches_its_latency() {
    let waiter = Waiter::new().with(waiter::timeout(Duration::from_millis(30)));

    let elapsed = timed(&waiter);
    assert!(elapsed >= Duration::from_millis(30));
    assert!(elapsed < Duration::from_millis(30) + SLACK);
}

#[test]
fn context_deadline_alone() {
    let start = Instant::now();
    let ctx = Context::with_timeout(Duration::from_millis(10));
    let waiter = Waiter::new().with(waiter::context(ctx));

    let elapsed = timed_since(start, &waiter);
    assert!(elapsed >= Duration::from_millis(10));
    assert!(elapsed < Duration::from_millis(10) + SLACK);
}

#[test]
fn context_cancel_beats_its_deadline() {
    let ctx = Context::with_timeout(Duration::from_secs(2));
    let waiter = Waiter::new().with(waiter::context(ctx.clone()));

    let start = Instant::now();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        ctx.cancel();
    });

    let elapsed = timed_since(start, &waiter);
    assert!(elapsed >= Duration::from_millis(20));
    assert!(elapsed < Duration::from_millis(20) + SLACK);
}

#[test]
fn timer_beats_context_deadline() {
    let waiter = Waiter::new()
        .with(waiter::context(Context::with_timeout(Duration::from_secs(2))))
        .with(waiter::timeout(Duration::from_millis(20)));

    let elapsed = timed(&waiter);
    assert!(elapsed >= Duration::from_millis(20));
    assert!(elapsed < Duration::from_millis(20) + SLACK);
}

#[test]
fn timer_beats_late_signal() {
    let (tx, rx) = waiter::flume::bounded::<i8>(0);
    let waiter = Waiter::new()
        .with(waiter::signal(rx))
        .with(waiter::timeout(Duration::from_millis(20)));

    thread::spawn(move || {
        thread::sleep(Duration::from_secs(2));
        let _ = tx.send(8);
    });

    let elapsed = timed(&waiter);
    assert!(elapsed >= Duration::from_millis(20));
    assert!(elapsed < Duration::from_millis(20) + SLACK);
}

#[test]
fn early_signal_beats_timer() {
    let (tx, rx) = waiter::flume::bounded::<i8>(0);
    let waiter = Waiter::new()
        .with(waiter::signal(rx))
        .with(waiter::timeout(Duration::from_secs(2)));

    let start = Instant::now();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        let _ = tx.send(8);
    });

    let elapsed = timed_since(start, &waiter);
    assert!(elapsed >= Duration::from_millis(20));
    assert!(elapsed < Duration::from_millis(20) + SLACK);
}

#[test]
fn group_release_wins() {
    let group = WaitGroup::new();
    group.add(1);
    let waiter = Waiter::new().with(waiter::group(group.clone()));

    let start = Instant::now();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        group.done();
    });

    let elapsed = timed_since(start, &waiter);
    assert!(elapsed >= Duration::from_millis(20));
    assert!(elapsed < Duration::from_millis(20) + SLACK);
}

#[test]
fn abandoned_signal_keeps_later_messages() {
    let (tx, rx) = waiter::flume::unbounded::<u32>();
    let waiter = Waiter::new()
        .with(waiter::signal(rx.clone()))
        .with(waiter::timeout(Duration::from_millis(1)));

    waiter.wait_one_of().unwrap();

    // Give the abandoned racer time to exit, then deliver.
    thread::sleep(Duration::from_millis(50));
    tx.send(7).unwrap();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(rx.try_recv(), Ok(7));
}

#[test]
fn message_behind_abandonment_stays_queued() {
    let ctx = Context::new();
    ctx.cancel();
    for _ in 0..50 {
        let (tx, rx) = waiter::flume::unbounded::<u32>();
        let waiter = Waiter::new()
            .with(waiter::context(ctx.clone()))
            .with(waiter::signal(rx.clone()));

        // The signal racer may not have polled yet: its abandonment token and
        // this message are then both pending when it does.
        waiter.wait_one_of().unwrap();
        tx.send(7).unwrap();

        thread::sleep(Duration::from_millis(5));
        assert_eq!(rx.try_recv(), Ok(7));
    }
}

#[test]
fn late_firing_losers_are_silent() {
    // Every source fires at about the same time; only one token is needed.
    let mut waiter = Waiter::new();
    for _ in 0..8 {
        waiter = waiter.with(waiter::timeout(Duration::from_millis(5)));
    }
    for _ in 0..10 {
        waiter.wait_one_of().unwrap();
    }
}

#[test]
fn every_loser_is_abandoned() {
    #[derive(Debug)]
    struct Parked(Arc<AtomicUsize>);

    impl Source for Parked {
        fn race_until_fired(&self, _fired: Fired, abandon: Abandon) {
            abandon.wait();
            self.0.fetch_add(1, Ordering::SeqCst);
        }

        fn wait_until_fired(&self) {}
    }

    let exited = Arc::new(AtomicUsize::new(0));
    let mut waiter = Waiter::new().with(waiter::timeout(Duration::from_millis(5)));
    for _ in 0..5 {
        waiter = waiter.with(Parked(Arc::clone(&exited)));
    }

    waiter.wait_one_of().unwrap();
    assert!(eventually(|| exited.load(Ordering::SeqCst) == 5));
}

#[test]
fn run_to_completion_source_outlives_race() {
    let finished = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&finished);
    let waiter = Waiter::new()
        .with(waiter::from_fn(move || {
            thread::sleep(Duration::from_millis(100));
            flag.store(true, Ordering::SeqCst);
        }))
        .with(waiter::timeout(Duration::from_millis(1)));

    assert!(!waiter.is_cancellable());

    let elapsed = timed(&waiter);
    assert!(elapsed < Duration::from_millis(100));
    assert!(!finished.load(Ordering::SeqCst));

    // The closure keeps running after the race settled.
    assert!(eventually(|| finished.load(Ordering::SeqCst)));
}

#[test]
fn empty_race_reports_no_sources() {
    let err = Waiter::new().wait_one_of().unwrap_err();
    assert!(matches!(err, WaitError::NoSources));
}

#[test]
fn reusing_a_waiter() {
    let waiter = Waiter::new()
        .with(TimerSource::new(Duration::from_millis(5)))
        .with(TimerSource::new(Duration::from_secs(10)));

    for _ in 0..5 {
        let elapsed = timed(&waiter);
        assert!(elapsed >= Duration::from_millis(5));
        assert!(elapsed < Duration::from_secs(5));
    }
}

#[test]
fn signal_fires_once_per_message() {
    let (tx, rx) = waiter::flume::unbounded::<()>();
    let waiter = Waiter::new()
        .with(waiter::signal(rx))
        .with(waiter::timeout(Duration::from_millis(100)));

    tx.send(()).unwrap();
    assert!(timed(&waiter) < Duration::from_millis(100));

    // The message was consumed; the timer wins the second race.
    assert!(timed(&waiter) >= Duration::from_millis(100));
    drop(tx);
}
