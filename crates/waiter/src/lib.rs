//! # waiter
//!
//! Wait for the first of, or all of, a set of heterogeneous event sources.
//!
//! A [`Waiter`] holds any mix of [`Source`]s (timers, cancellable contexts,
//! caller-owned channels, wait groups, blocking closures) and offers two
//! ways to wait on them:
//!
//! - [`Waiter::wait_one_of`] - race: return as soon as one source fires and
//!   tell the others to abandon.
//! - [`Waiter::wait_everyone`] - barrier: return once every source fired.
//!
//! Neither reports *which* source fired; callers learn only that something,
//! or everything, happened.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use waiter::{Context, WaitGroup, Waiter};
//!
//! let (tx, rx) = waiter::flume::bounded::<()>(1);
//! let group = WaitGroup::new();
//! group.add(1);
//!
//! let waiter = Waiter::new()
//!     .with(waiter::timeout(Duration::from_secs(5)))
//!     .with(waiter::context(Context::with_timeout(Duration::from_secs(2))))
//!     .with(waiter::signal(rx))
//!     .with(waiter::group(group.clone()));
//!
//! std::thread::spawn(move || tx.send(()).unwrap());
//!
//! let start = Instant::now();
//! waiter.wait_one_of().unwrap();
//! assert!(start.elapsed() < Duration::from_secs(2));
//! # group.done();
//! ```
//!
//! ## Built-in Sources
//!
//! | Source | Wraps | Fires when | Abandonable |
//! |--------|-------|------------|-------------|
//! | [`TimerSource`] | `Duration` | the duration elapsed | yes |
//! | [`ContextSource`] | [`Context`] | cancelled or deadline passed | yes |
//! | [`SignalSource`] | `flume::Receiver<T>` | a message arrives or senders are gone | yes |
//! | [`GroupSource`] | [`WaitGroup`] | no member is pending | yes |
//! | [`FnSource`] | blocking closure | the closure returned | **no** |
//!
//! ## Abandonment Is Cooperative
//!
//! A race never kills a thread. Losing racers receive an abandonment token
//! and are expected to return; a source reporting
//! [`Abandonment::RunsToCompletion`] keeps its thread alive after the race
//! until it fires. [`Waiter::is_cancellable`] tells whether a waiter holds
//! any such source.
//!
//! ## Unbounded Barriers
//!
//! `wait_everyone` has no early exit. A timer source in a barrier adds one
//! more member to wait for; it does not cut the others short. Bound a barrier
//! from the outside, for example with `waiter-tokio` and a runtime timeout.
//!
//! ## Logging
//!
//! Race and barrier lifecycle events are emitted through [`tracing`] at
//! `debug` and `trace` level. The crate never installs a subscriber.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod cancel;
mod context;
mod counter;
mod error;
mod func;
mod group;
mod reason;
mod signal;
mod source;
mod timer;
mod wait;

use std::time::Duration;

pub use cancel::ContextSource;
pub use context::Context;
pub use counter::GroupSource;
pub use error::WaitError;
pub use func::FnSource;
pub use group::WaitGroup;
pub use reason::DoneReason;
pub use signal::SignalSource;
pub use source::{Abandon, Abandonment, Fired, Source};
pub use timer::TimerSource;
pub use wait::Waiter;

// Re-exported so custom sources and signal channels use the same version.
pub use flume;

/// A source that fires `duration` after each wait starts.
#[inline]
pub fn timeout(duration: Duration) -> TimerSource {
    TimerSource::new(duration)
}

/// A source that fires when `ctx` is done.
#[inline]
pub fn context(ctx: Context) -> ContextSource {
    ContextSource::new(ctx)
}

/// A source that fires when `rx` yields a message or disconnects.
#[inline]
pub fn signal<T: Send + 'static>(rx: flume::Receiver<T>) -> SignalSource<T> {
    SignalSource::new(rx)
}

/// A source that fires when `group` has no pending members.
#[inline]
pub fn group(group: WaitGroup) -> GroupSource {
    GroupSource::new(group)
}

/// A source that fires when the blocking closure `f` returns.
#[inline]
pub fn from_fn<F>(f: F) -> FnSource<F>
where
    F: Fn() + Send + Sync + 'static,
{
    FnSource::new(f)
}
