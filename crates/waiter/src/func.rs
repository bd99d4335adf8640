//! Closure-backed source.
//!
//! [`FnSource`] wraps any blocking closure: the source fires when the closure
//! returns. Useful for bridging mechanisms that only offer a blocking wait,
//! such as joining a thread or reading a pipe.
//!
//! # Run to Completion
//!
//! A blocking closure cannot be interrupted, so `FnSource` reports
//! [`Abandonment::RunsToCompletion`]. When it loses a race its racer thread
//! keeps running until the closure returns, after the race has settled.
//!
//! ```rust
//! use std::time::Duration;
//! use waiter::{FnSource, Source, Waiter};
//!
//! let slow = FnSource::new(|| std::thread::sleep(Duration::from_millis(50)));
//! assert!(!slow.abandonment().is_honored());
//!
//! let waiter = Waiter::new()
//!     .with(slow)
//!     .with(waiter::timeout(Duration::from_millis(1)));
//! assert!(!waiter.is_cancellable());
//!
//! // Returns after ~1ms; the closure keeps sleeping in the background.
//! waiter.wait_one_of().unwrap();
//! ```

use std::fmt;

use crate::{Abandon, Abandonment, Fired, Source};

/// A [`Source`] backed by a blocking closure.
///
/// The closure is called once per race or join and the source fires when it
/// returns.
pub struct FnSource<F> {
    f: F,
}

impl<F> FnSource<F>
where
    F: Fn() + Send + Sync + 'static,
{
    /// Create a source that fires when `f` returns.
    #[inline]
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Source for FnSource<F>
where
    F: Fn() + Send + Sync + 'static,
{
    fn race_until_fired(&self, fired: Fired, _abandon: Abandon) {
        (self.f)();
        fired.fire();
    }

    fn wait_until_fired(&self) {
        (self.f)();
    }

    #[inline]
    fn abandonment(&self) -> Abandonment {
        Abandonment::RunsToCompletion
    }
}

impl<F> fmt::Debug for FnSource<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSource").finish_non_exhaustive()
    }
}
