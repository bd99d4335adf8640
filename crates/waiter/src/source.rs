//! The [`Source`] trait and the handles a racer is given.
//!
//! Every event mechanism the [`Waiter`](crate::Waiter) can wait on is wrapped
//! behind [`Source`]. The trait has two participation modes:
//!
//! - **race** - [`race_until_fired`](Source::race_until_fired) parks until the
//!   source fires (and reports it through [`Fired`]) or until the race is
//!   over (signaled through [`Abandon`]).
//! - **join** - [`join_until_fired`](Source::join_until_fired) registers one
//!   pending member on a [`WaitGroup`] and releases it once the source fires.
//!
//! # Implementing a Source
//!
//! ```rust
//! use std::time::Duration;
//! use waiter::{Abandon, Fired, Source, Waiter};
//!
//! /// Fires once a file exists.
//! #[derive(Debug)]
//! struct FileAppears(std::path::PathBuf);
//!
//! impl Source for FileAppears {
//!     fn race_until_fired(&self, fired: Fired, abandon: Abandon) {
//!         while !self.0.exists() {
//!             // Poll every 10ms, bail out as soon as the race is over.
//!             if abandon.wait_timeout(Duration::from_millis(10)) {
//!                 return;
//!             }
//!         }
//!         fired.fire();
//!     }
//!
//!     fn wait_until_fired(&self) {
//!         while !self.0.exists() {
//!             std::thread::sleep(Duration::from_millis(10));
//!         }
//!     }
//! }
//!
//! let waiter = Waiter::new()
//!     .with(FileAppears("/definitely/not/here".into()))
//!     .with(waiter::timeout(Duration::from_millis(20)));
//! waiter.wait_one_of().unwrap();
//! ```

use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::warn;

use crate::WaitGroup;

/// Whether a source stops racing once it is told to abandon.
///
/// Abandonment is cooperative. A source reporting
/// [`RunsToCompletion`](Abandonment::RunsToCompletion) keeps its racer thread
/// alive after [`Waiter::wait_one_of`](crate::Waiter::wait_one_of) returns,
/// until its own condition fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Abandonment {
    /// The racer returns promptly once abandoned.
    Honored,
    /// The racer ignores abandonment and blocks until its condition fires.
    RunsToCompletion,
}

impl Abandonment {
    /// Returns `true` if the racer stops when abandoned.
    #[inline]
    pub fn is_honored(self) -> bool {
        matches!(self, Self::Honored)
    }
}

/// Sink through which a racer reports that its source fired.
///
/// [`fire`](Self::fire) consumes the sink, so a racer delivers at most one
/// token.
pub struct Fired {
    tx: Sender<()>,
}

impl Fired {
    #[inline]
    pub(crate) fn new(tx: Sender<()>) -> Self {
        Self { tx }
    }

    /// Deliver the token.
    ///
    /// Never blocks: the result channel has one slot per racer. A token
    /// delivered after the race settled is dropped silently.
    #[inline]
    pub fn fire(self) {
        let _ = self.tx.try_send(());
    }
}

impl fmt::Debug for Fired {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fired")
            .field("settled", &self.tx.is_disconnected())
            .finish()
    }
}

/// Abandonment signal handed to a racer.
///
/// Receiving a token or observing the channel disconnect both mean the race
/// is over and the racer must return without firing.
#[derive(Debug, Clone)]
pub struct Abandon {
    rx: Receiver<()>,
}

impl Abandon {
    #[inline]
    pub(crate) fn new(rx: Receiver<()>) -> Self {
        Self { rx }
    }

    /// The underlying channel, for sources that select over several channels.
    ///
    /// Any wake-up from this receiver, message or disconnection, means
    /// abandoned.
    #[inline]
    pub fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }

    /// Non-blocking check. Consumes a pending abandonment token.
    pub fn is_abandoned(&self) -> bool {
        match self.rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => true,
            Err(TryRecvError::Empty) => false,
        }
    }

    /// Block until abandoned.
    pub fn wait(&self) {
        let _ = self.rx.recv();
    }

    /// Block until abandoned or until `timeout` elapses.
    ///
    /// Returns `true` if abandoned.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.wait_deadline(deadline),
            None => {
                self.wait();
                true
            }
        }
    }

    /// Block until abandoned or until `deadline` passes.
    ///
    /// Returns `true` if abandoned. When it returns `false`, `deadline` has
    /// passed.
    pub fn wait_deadline(&self, deadline: Instant) -> bool {
        match self.rx.recv_deadline(deadline) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
            Err(RecvTimeoutError::Timeout) => {
                sleep_until(deadline);
                false
            }
        }
    }
}

/// Sleep until `deadline` has passed. Returns immediately if it already has.
pub(crate) fn sleep_until(deadline: Instant) {
    let now = Instant::now();
    if now < deadline {
        thread::sleep(deadline - now);
    }
}

/// One event mechanism, normalized for racing and joining.
///
/// Implementations hold only their wrapped mechanism and are immutable after
/// construction, so one source can serve many waits.
///
/// # Contract
///
/// - [`race_until_fired`](Self::race_until_fired) either fires exactly once
///   or returns silently after being abandoned. It never fires after it has
///   observed abandonment.
/// - [`wait_until_fired`](Self::wait_until_fired) blocks until the condition
///   is true. It has no abandonment path.
/// - [`abandonment`](Self::abandonment) reports honestly whether the race
///   path returns when abandoned.
pub trait Source: Send + Sync + fmt::Debug + 'static {
    /// Park until the source fires or the race is abandoned.
    fn race_until_fired(&self, fired: Fired, abandon: Abandon);

    /// Park until the source fires.
    fn wait_until_fired(&self);

    /// Register one pending member with `group` and release it from a
    /// background thread once the source fires.
    ///
    /// The member is released however the thread ends, including when
    /// [`wait_until_fired`](Self::wait_until_fired) panics. If the thread
    /// cannot be spawned the member is released before the error is
    /// returned, so `group` is left balanced.
    fn join_until_fired(self: Arc<Self>, group: &WaitGroup) -> io::Result<()> {
        group.add(1);
        let member = Release(group.clone());
        // On failure the unspawned closure is dropped, and `member` with it.
        thread::Builder::new()
            .name("waiter-join".into())
            .spawn(move || {
                let _member = member;
                self.wait_until_fired();
            })
            .map(drop)
    }

    /// Whether [`race_until_fired`](Self::race_until_fired) returns when
    /// abandoned.
    #[inline]
    fn abandonment(&self) -> Abandonment {
        Abandonment::Honored
    }
}

/// Releases one pending [`WaitGroup`] member when dropped.
struct Release(WaitGroup);

impl Drop for Release {
    fn drop(&mut self) {
        if thread::panicking() {
            warn!("source panicked while joining, releasing its member");
        }
        self.0.done();
    }
}
