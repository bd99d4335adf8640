//! The aggregator: race or join a fixed set of sources.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use flume::Sender;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::{Abandon, Fired, Source, WaitError, WaitGroup};

/// An ordered, fixed set of [`Source`]s with two ways to wait on them.
///
/// - [`wait_one_of`](Self::wait_one_of) returns once the first source fires.
/// - [`wait_everyone`](Self::wait_everyone) returns once every source fired.
///
/// Sources are added while building and never change afterwards. Both waits
/// take `&self`, so a waiter can be reused, and cloning shares the sources.
///
/// # Example
///
/// ```rust
/// use std::time::{Duration, Instant};
/// use waiter::Waiter;
///
/// let waiter = Waiter::new()
///     .with(waiter::timeout(Duration::from_millis(15)))
///     .with(waiter::timeout(Duration::from_millis(1)))
///     .with(waiter::timeout(Duration::from_millis(10)));
///
/// let start = Instant::now();
/// waiter.wait_everyone().unwrap();
/// assert!(start.elapsed() >= Duration::from_millis(15));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Waiter {
    sources: SmallVec<[Arc<dyn Source>; 4]>,
}

impl Waiter {
    /// A waiter with no sources.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source.
    #[inline]
    pub fn with<S: Source>(mut self, source: S) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    /// Append a source that is shared with other waiters.
    #[inline]
    pub fn with_shared(mut self, source: Arc<dyn Source>) -> Self {
        self.sources.push(source);
        self
    }

    /// Number of sources.
    #[inline]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if there are no sources.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// The sources, in insertion order.
    #[inline]
    pub fn sources(&self) -> &[Arc<dyn Source>] {
        &self.sources
    }

    /// Returns `true` if every source honors abandonment, so that no racer
    /// outlives [`wait_one_of`](Self::wait_one_of) for long.
    pub fn is_cancellable(&self) -> bool {
        self.sources.iter().all(|s| s.abandonment().is_honored())
    }

    /// Block until the first source fires.
    ///
    /// Spawns one racer thread per source. Once a token arrives, each of the
    /// N-1 remaining racers is sent an abandonment token and the call
    /// returns without joining them. Sources that
    /// [run to completion](crate::Abandonment::RunsToCompletion) keep their
    /// racer alive in the background until they fire; their late token is
    /// absorbed by the result channel.
    ///
    /// When several sources fire at about the same time, whichever token is
    /// received first wins.
    ///
    /// # Errors
    ///
    /// - [`WaitError::NoSources`] if the waiter is empty.
    /// - [`WaitError::Spawn`] if a racer thread could not be spawned. Racers
    ///   already started are abandoned.
    /// - [`WaitError::NoneFired`] if every racer ended without firing.
    pub fn wait_one_of(&self) -> Result<(), WaitError> {
        let n = self.sources.len();
        if n == 0 {
            return Err(WaitError::NoSources);
        }

        let started = Instant::now();
        // One slot per racer: a loser that fires before it sees abandonment
        // never blocks.
        let (fired_tx, fired_rx) = flume::bounded(n);
        let (abandon_tx, abandon_rx) = flume::bounded(n - 1);
        let _abandoner = Abandoner {
            tx: abandon_tx,
            losers: n - 1,
        };

        debug!(sources = n, "race started");
        for (index, source) in self.sources.iter().enumerate() {
            let source = Arc::clone(source);
            let fired = Fired::new(fired_tx.clone());
            let abandon = Abandon::new(abandon_rx.clone());
            thread::Builder::new()
                .name(format!("waiter-race-{index}"))
                .spawn(move || {
                    source.race_until_fired(fired, abandon);
                    trace!(index, "racer exited");
                })
                .map_err(|err| {
                    warn!(index, error = %err, "failed to spawn racer");
                    WaitError::Spawn(err)
                })?;
        }
        drop(fired_tx);
        drop(abandon_rx);

        fired_rx.recv().map_err(|_| WaitError::NoneFired)?;
        debug!(sources = n, elapsed = ?started.elapsed(), "race settled");
        Ok(())
    }

    /// Block until every source has fired.
    ///
    /// Each source joins a fresh [`WaitGroup`] from its own thread. There is
    /// no early exit: a source that never fires blocks this call forever. To
    /// bound the total wait, wrap the call at a higher layer; adding a timer
    /// source only adds one more member to wait for.
    ///
    /// Returns immediately when the waiter is empty.
    ///
    /// # Errors
    ///
    /// [`WaitError::Spawn`] if a joiner thread could not be spawned. The call
    /// still waits for the joiners that did start before returning it.
    pub fn wait_everyone(&self) -> Result<(), WaitError> {
        let started = Instant::now();
        let group = WaitGroup::new();

        debug!(sources = self.sources.len(), "barrier started");
        let mut spawn_error = None;
        for (index, source) in self.sources.iter().enumerate() {
            if let Err(err) = Arc::clone(source).join_until_fired(&group) {
                warn!(index, error = %err, "failed to spawn joiner");
                spawn_error = Some(err);
                break;
            }
        }

        group.wait();
        if let Some(err) = spawn_error {
            return Err(WaitError::Spawn(err));
        }

        debug!(
            sources = self.sources.len(),
            elapsed = ?started.elapsed(),
            "barrier released"
        );
        Ok(())
    }
}

impl FromIterator<Arc<dyn Source>> for Waiter {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Source>>>(iter: I) -> Self {
        Self {
            sources: iter.into_iter().collect(),
        }
    }
}

impl Extend<Arc<dyn Source>> for Waiter {
    fn extend<I: IntoIterator<Item = Arc<dyn Source>>>(&mut self, iter: I) {
        self.sources.extend(iter);
    }
}

/// Sends one abandonment token per losing racer when the race ends, however
/// it ends, then disconnects the channel.
struct Abandoner {
    tx: Sender<()>,
    losers: usize,
}

impl Drop for Abandoner {
    fn drop(&mut self) {
        let mut sent = 0;
        while sent < self.losers && self.tx.try_send(()).is_ok() {
            sent += 1;
        }
        trace!(losers = self.losers, sent, "abandonment signaled");
    }
}
