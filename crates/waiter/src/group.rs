//! N-of-N completion counter.
//!
//! [`WaitGroup`] counts pending members. Members are added with
//! [`add`](WaitGroup::add), released with [`done`](WaitGroup::done), and
//! [`wait`](WaitGroup::wait) blocks until none are pending.
//!
//! # Example
//!
//! ```rust
//! use waiter::WaitGroup;
//!
//! let group = WaitGroup::new();
//! for _ in 0..4 {
//!     group.add(1);
//!     let member = group.clone();
//!     std::thread::spawn(move || {
//!         // ... work ...
//!         member.done();
//!     });
//! }
//! group.wait();
//! assert_eq!(group.pending(), 0);
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use flume::{Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use smallvec::SmallVec;

#[derive(Default)]
struct State {
    pending: usize,
    /// Disconnected (dropped) when `pending` reaches zero.
    watchers: SmallVec<[Sender<()>; 2]>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    released: Condvar,
}

/// A shared counter of pending members.
///
/// Clones share the same counter. Zero pending is the released state; a
/// group can be re-armed by adding members again.
#[derive(Clone, Default)]
pub struct WaitGroup {
    inner: Arc<Inner>,
}

impl WaitGroup {
    /// Create a group with no pending members.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `n` more pending members.
    pub fn add(&self, n: usize) {
        let mut state = self.inner.state.lock();
        state.pending += n;
    }

    /// Release one pending member.
    ///
    /// # Panics
    ///
    /// Panics if no member is pending.
    pub fn done(&self) {
        let mut state = self.inner.state.lock();
        assert!(state.pending > 0, "WaitGroup::done called with no pending members");
        state.pending -= 1;
        if state.pending == 0 {
            state.watchers.clear();
            self.inner.released.notify_all();
        }
    }

    /// Number of members still pending.
    #[inline]
    pub fn pending(&self) -> usize {
        self.inner.state.lock().pending
    }

    /// Block until no member is pending.
    pub fn wait(&self) {
        let mut state = self.inner.state.lock();
        while state.pending > 0 {
            self.inner.released.wait(&mut state);
        }
    }

    /// Block until no member is pending or `timeout` elapses.
    ///
    /// Returns `true` if the group was released.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait();
            return true;
        };

        let mut state = self.inner.state.lock();
        while state.pending > 0 {
            if self
                .inner
                .released
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return state.pending == 0;
            }
        }
        true
    }

    /// A receiver that disconnects once no member is pending.
    ///
    /// Already disconnected if nothing is pending now. Lets a caller select
    /// on the release alongside other channels; dropping the receiver early
    /// abandons the watch.
    pub fn watch(&self) -> Receiver<()> {
        let (tx, rx) = flume::bounded(0);
        let mut state = self.inner.state.lock();
        if state.pending > 0 {
            state.watchers.retain(|w| !w.is_disconnected());
            state.watchers.push(tx);
        }
        rx
    }
}

impl fmt::Debug for WaitGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitGroup")
            .field("pending", &self.pending())
            .finish()
    }
}
