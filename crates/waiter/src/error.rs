//! Errors returned by the wait algorithms.

use std::fmt;
use std::io;

/// Why a wait could not complete normally.
///
/// The wait algorithms have no "timed out" outcome: bounding a wait is done
/// by composing a timer or context source into the waiter.
#[derive(Debug)]
#[non_exhaustive]
pub enum WaitError {
    /// [`Waiter::wait_one_of`](crate::Waiter::wait_one_of) was called on a
    /// waiter with no sources. Nothing could ever fire.
    NoSources,

    /// A racer or joiner thread could not be spawned.
    Spawn(io::Error),

    /// Every racer ended without firing. Only reachable when a source panics
    /// or breaks the [`Source`](crate::Source) contract.
    NoneFired,
}

impl fmt::Display for WaitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSources => write!(f, "cannot wait for one of zero sources"),
            Self::Spawn(err) => write!(f, "failed to spawn wait thread: {err}"),
            Self::NoneFired => write!(f, "every source ended without firing"),
        }
    }
}

impl std::error::Error for WaitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for WaitError {
    fn from(err: io::Error) -> Self {
        Self::Spawn(err)
    }
}
