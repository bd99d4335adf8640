//! Cancellable context with an optional deadline.
//!
//! A [`Context`] is done once it is cancelled, once its deadline passes, or
//! once any ancestor is done. It is the mechanism behind
//! [`ContextSource`](crate::ContextSource).
//!
//! # Overview
//!
//! - [`Context::new()`] - cancel-only root
//! - [`Context::with_timeout()`] / [`Context::with_deadline()`] - root with a deadline
//! - [`ctx.child()`](Context::child) - inherits cancellation and deadline
//! - [`ctx.child_with_timeout()`](Context::child_with_timeout) - child with a tighter deadline
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use waiter::{Context, DoneReason};
//!
//! let parent = Context::with_timeout(Duration::from_secs(60));
//! let child = parent.child_with_timeout(Duration::from_secs(1));
//!
//! // Deadlines only tighten.
//! assert!(child.remaining().unwrap() <= Duration::from_secs(1));
//!
//! // Cancellation flows from parent to child, never the other way.
//! parent.cancel();
//! assert_eq!(child.check(), Err(DoneReason::Cancelled));
//! ```

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError, Selector, Sender};
use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::DoneReason;
use crate::source::sleep_until;

struct State {
    /// Dropped on cancel, which disconnects `Inner::done`.
    done_tx: Option<Sender<()>>,
    children: SmallVec<[Weak<Inner>; 2]>,
}

struct Inner {
    deadline: Option<Instant>,
    /// Never receives a message; only disconnects.
    done: Receiver<()>,
    state: Mutex<State>,
}

/// A cancellable context with an optional deadline.
///
/// Clones share the same state: cancelling any clone cancels them all.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    fn build(deadline: Option<Instant>) -> Self {
        let (done_tx, done) = flume::bounded(0);
        Self {
            inner: Arc::new(Inner {
                deadline,
                done,
                state: Mutex::new(State {
                    done_tx: Some(done_tx),
                    children: SmallVec::new(),
                }),
            }),
        }
    }

    /// A root context that is done only when cancelled.
    #[inline]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A root context that is done `timeout` from now, or when cancelled.
    ///
    /// A timeout too large to represent as an [`Instant`] means no deadline.
    #[inline]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Instant::now().checked_add(timeout))
    }

    /// A root context that is done at `deadline`, or when cancelled.
    #[inline]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::build(Some(deadline))
    }

    /// A child that is done when this context is done, or when the child
    /// itself is cancelled.
    ///
    /// Cancelling the child does not affect this context or its siblings.
    #[inline]
    pub fn child(&self) -> Context {
        self.attach(None)
    }

    /// A child with its own timeout. The effective deadline is the earlier
    /// of the child's and this context's.
    #[inline]
    pub fn child_with_timeout(&self, timeout: Duration) -> Context {
        self.attach(Instant::now().checked_add(timeout))
    }

    /// A child with its own deadline. The effective deadline is the earlier
    /// of `deadline` and this context's.
    #[inline]
    pub fn child_with_deadline(&self, deadline: Instant) -> Context {
        self.attach(Some(deadline))
    }

    fn attach(&self, deadline: Option<Instant>) -> Context {
        let deadline = match (self.inner.deadline, deadline) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (parent, own) => parent.or(own),
        };
        let child = Self::build(deadline);

        let mut state = self.inner.state.lock();
        if state.done_tx.is_none() {
            drop(state);
            child.cancel();
        } else {
            state.children.retain(|c| c.strong_count() > 0);
            state.children.push(Arc::downgrade(&child.inner));
        }
        child
    }

    /// Cancel this context and every live descendant.
    ///
    /// Idempotent.
    pub fn cancel(&self) {
        let children = {
            let mut state = self.inner.state.lock();
            if state.done_tx.take().is_none() {
                return;
            }
            std::mem::take(&mut state.children)
        };

        for child in children.iter().filter_map(Weak::upgrade) {
            Context { inner: child }.cancel();
        }
    }

    /// Returns `true` if [`cancel`](Self::cancel) was called on this context
    /// or an ancestor.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.state.lock().done_tx.is_none()
    }

    /// Returns `true` if the context is done for any reason.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.check().is_err()
    }

    /// `Ok(())` while the context is live, otherwise why it is done.
    ///
    /// Cancellation takes precedence over an expired deadline.
    pub fn check(&self) -> Result<(), DoneReason> {
        if self.is_cancelled() {
            return Err(DoneReason::Cancelled);
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(DoneReason::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// The effective deadline, if any.
    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Time left until the deadline, if any. Zero once it has passed.
    #[inline]
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Block until the context is done.
    pub fn wait(&self) {
        match self.inner.deadline {
            Some(deadline) => {
                if let Err(RecvTimeoutError::Timeout) = self.inner.done.recv_deadline(deadline) {
                    sleep_until(deadline);
                }
            }
            None => {
                let _ = self.inner.done.recv();
            }
        }
    }

    /// Block until the context is done or `other` wakes (message or
    /// disconnection).
    ///
    /// Returns `true` if the context is done.
    pub(crate) fn wait_or(&self, other: &Receiver<()>) -> bool {
        let selector = Selector::new()
            .recv(other, |_| false)
            .recv(&self.inner.done, |_| true);

        match self.inner.deadline {
            Some(deadline) => match selector.wait_deadline(deadline) {
                Ok(done) => done,
                Err(_) => {
                    sleep_until(deadline);
                    true
                }
            },
            None => selector.wait(),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.inner.deadline)
            .finish()
    }
}
