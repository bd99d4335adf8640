//! Fires when a caller-owned channel delivers.

use std::fmt;

use flume::{Receiver, Selector};

use crate::{Abandon, Fired, Source};

/// A [`Source`] that fires when its channel yields a message, or when every
/// sender has been dropped.
///
/// The channel belongs to the caller. Each firing consumes one message, so
/// a channel that is written once fires once: reusing the source in a later
/// wait needs another message. An abandoned racer never consumes a message.
///
/// # Example
///
/// ```rust
/// use waiter::{SignalSource, Waiter};
///
/// let (tx, rx) = waiter::flume::bounded::<u8>(1);
/// let waiter = Waiter::new().with(SignalSource::new(rx));
///
/// std::thread::spawn(move || tx.send(8).unwrap());
/// waiter.wait_one_of().unwrap();
/// ```
pub struct SignalSource<T> {
    rx: Receiver<T>,
}

impl<T> SignalSource<T> {
    /// Wrap the receiving end of a caller-owned channel.
    #[inline]
    pub fn new(rx: Receiver<T>) -> Self {
        Self { rx }
    }

    /// The wrapped receiver.
    #[inline]
    pub fn receiver(&self) -> &Receiver<T> {
        &self.rx
    }
}

impl<T> Clone for SignalSource<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<T> From<Receiver<T>> for SignalSource<T> {
    fn from(rx: Receiver<T>) -> Self {
        Self::new(rx)
    }
}

impl<T> fmt::Debug for SignalSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalSource")
            .field("queued", &self.rx.len())
            .field("disconnected", &self.rx.is_disconnected())
            .finish()
    }
}

impl<T: Send + 'static> Source for SignalSource<T> {
    fn race_until_fired(&self, fired: Fired, abandon: Abandon) {
        // Abandonment is polled first so a loser never takes a queued message.
        let signaled = Selector::new()
            .recv(abandon.receiver(), |_| false)
            .recv(&self.rx, |_| true)
            .wait();
        if signaled {
            fired.fire();
        }
    }

    fn wait_until_fired(&self) {
        let _ = self.rx.recv();
    }
}
