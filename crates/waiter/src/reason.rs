//! Why a [`Context`](crate::Context) is done.

use core::fmt;

/// Why a context is done.
///
/// Returned from [`Context::check()`](crate::Context::check). Only the
/// context itself reports a reason; a [`Waiter`](crate::Waiter) never tells
/// the caller which source fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DoneReason {
    /// The context, or one of its ancestors, was cancelled.
    Cancelled,

    /// The context's deadline passed.
    ///
    /// A child inherits its parent's deadline when that one is earlier, so
    /// this is also reported when an ancestor's deadline is the one that
    /// passed.
    DeadlineExceeded,
}

impl DoneReason {
    /// Returns `true` if this was an explicit cancellation.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if the deadline passed.
    #[inline]
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded)
    }
}

impl fmt::Display for DoneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "context cancelled"),
            Self::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

impl std::error::Error for DoneReason {}
