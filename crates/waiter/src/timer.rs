//! Fires once a fixed duration has elapsed.

use std::thread;
use std::time::{Duration, Instant};

use crate::{Abandon, Fired, Source};

/// A [`Source`] that fires `duration` after each wait starts.
///
/// The clock starts when the race or join starts, not when the source is
/// constructed, so the same timer can be reused across waits.
///
/// # Example
///
/// ```rust
/// use std::time::{Duration, Instant};
/// use waiter::{TimerSource, Waiter};
///
/// let waiter = Waiter::new()
///     .with(TimerSource::new(Duration::from_millis(10)))
///     .with(TimerSource::new(Duration::from_secs(60)));
///
/// let start = Instant::now();
/// waiter.wait_one_of().unwrap();
/// assert!(start.elapsed() < Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerSource {
    duration: Duration,
}

impl TimerSource {
    /// Create a timer that fires after `duration`.
    #[inline]
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// The configured duration.
    #[inline]
    pub const fn duration(&self) -> Duration {
        self.duration
    }
}

impl From<Duration> for TimerSource {
    fn from(duration: Duration) -> Self {
        Self::new(duration)
    }
}

impl Source for TimerSource {
    fn race_until_fired(&self, fired: Fired, abandon: Abandon) {
        let Some(deadline) = Instant::now().checked_add(self.duration) else {
            // Unrepresentable deadline: it can never elapse.
            abandon.wait();
            return;
        };
        if !abandon.wait_deadline(deadline) {
            fired.fire();
        }
    }

    fn wait_until_fired(&self) {
        thread::sleep(self.duration);
    }
}
