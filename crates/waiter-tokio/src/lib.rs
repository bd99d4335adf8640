//! # waiter-tokio
//!
//! Tokio integration for [`waiter`].
//!
//! - [`TokenSource`] - a [`Source`] over tokio's [`CancellationToken`].
//! - [`AsyncWait`] - `await` a [`Waiter`] from async code without blocking a
//!   runtime worker.
//!
//! ## Complete Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use waiter::Waiter;
//! use waiter_tokio::{AsyncWait, TokenSource};
//!
//! #[tokio::main]
//! async fn main() {
//!     let shutdown = CancellationToken::new();
//!     let waiter = Waiter::new()
//!         .with(TokenSource::new(shutdown.clone()))
//!         .with(waiter::timeout(Duration::from_secs(30)));
//!
//!     tokio::spawn(async move {
//!         tokio::time::sleep(Duration::from_millis(10)).await;
//!         shutdown.cancel();
//!     });
//!
//!     waiter.one_of().await.unwrap();
//! }
//! ```
//!
//! ## Bounding a Barrier
//!
//! [`Waiter::wait_everyone`] has no early exit. From async code it can be
//! bounded with a runtime timeout; the timeout only stops *awaiting*, the
//! joiner threads still run until their sources fire.
//!
//! ```rust,no_run
//! # use std::time::Duration;
//! # use waiter::Waiter;
//! # use waiter_tokio::AsyncWait;
//! # async fn demo(waiter: Waiter) {
//! match tokio::time::timeout(Duration::from_secs(1), waiter.everyone()).await {
//!     Ok(result) => result.unwrap(),
//!     Err(_) => println!("still waiting on someone"),
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::fmt;
use std::future::Future;
use std::pin::pin;

use futures::executor::block_on;
use futures::future::{self, Either};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use waiter::{Abandon, Fired, Source, WaitError, Waiter};

/// A [`Source`] that fires when a tokio [`CancellationToken`] is cancelled.
///
/// The token is runtime-agnostic, so racers wait on it from plain threads.
/// Abandonment is honored.
///
/// # Example
///
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use waiter::Waiter;
/// use waiter_tokio::TokenSource;
///
/// let token = CancellationToken::new();
/// let waiter = Waiter::new().with(TokenSource::new(token.clone()));
///
/// token.cancel();
/// waiter.wait_one_of().unwrap();
/// ```
#[derive(Clone, Default)]
pub struct TokenSource {
    token: CancellationToken,
}

impl TokenSource {
    /// Wrap `token`.
    #[inline]
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// The wrapped token.
    #[inline]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Unwrap the token.
    #[inline]
    pub fn into_token(self) -> CancellationToken {
        self.token
    }
}

impl Source for TokenSource {
    fn race_until_fired(&self, fired: Fired, abandon: Abandon) {
        // `select` polls its first future first; abandonment must win a tie.
        let abandoned = pin!(abandon.receiver().recv_async());
        let cancelled = pin!(self.token.cancelled());
        if let Either::Right(_) = block_on(future::select(abandoned, cancelled)) {
            fired.fire();
        }
    }

    fn wait_until_fired(&self) {
        block_on(self.token.cancelled());
    }
}

impl From<CancellationToken> for TokenSource {
    fn from(token: CancellationToken) -> Self {
        Self::new(token)
    }
}

impl From<TokenSource> for CancellationToken {
    fn from(source: TokenSource) -> Self {
        source.token
    }
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSource")
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

/// Extension trait for [`CancellationToken`] to easily convert to a source.
///
/// Named `CancellationTokenSourceExt` to avoid potential conflicts if
/// `tokio_util` ever adds a `CancellationTokenExt` trait.
pub trait CancellationTokenSourceExt {
    /// Convert to a [`TokenSource`] sharing the same cancellation state.
    fn as_source(&self) -> TokenSource;
}

impl CancellationTokenSourceExt for CancellationToken {
    fn as_source(&self) -> TokenSource {
        TokenSource::new(self.clone())
    }
}

/// Why an async wait failed.
#[derive(Debug)]
#[non_exhaustive]
pub enum AsyncWaitError {
    /// The blocking wait itself failed.
    Wait(WaitError),
    /// The blocking task panicked or the runtime shut down under it.
    Join(JoinError),
}

impl fmt::Display for AsyncWaitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wait(err) => write!(f, "{err}"),
            Self::Join(err) => write!(f, "wait task failed: {err}"),
        }
    }
}

impl std::error::Error for AsyncWaitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Wait(err) => Some(err),
            Self::Join(err) => Some(err),
        }
    }
}

impl From<WaitError> for AsyncWaitError {
    fn from(err: WaitError) -> Self {
        Self::Wait(err)
    }
}

impl From<JoinError> for AsyncWaitError {
    fn from(err: JoinError) -> Self {
        Self::Join(err)
    }
}

/// Await a [`Waiter`] from async code.
///
/// Both methods move the blocking algorithm onto tokio's blocking pool via
/// [`tokio::task::spawn_blocking`]. Dropping the returned future stops
/// awaiting but does not abandon the wait already in progress.
pub trait AsyncWait {
    /// Async [`Waiter::wait_one_of`].
    fn one_of(&self) -> impl Future<Output = Result<(), AsyncWaitError>> + Send;

    /// Async [`Waiter::wait_everyone`].
    fn everyone(&self) -> impl Future<Output = Result<(), AsyncWaitError>> + Send;
}

impl AsyncWait for Waiter {
    async fn one_of(&self) -> Result<(), AsyncWaitError> {
        let waiter = self.clone();
        tokio::task::spawn_blocking(move || waiter.wait_one_of()).await??;
        Ok(())
    }

    async fn everyone(&self) -> Result<(), AsyncWaitError> {
        let waiter = self.clone();
        tokio::task::spawn_blocking(move || waiter.wait_everyone()).await??;
        Ok(())
    }
}
