//! Fires when a [`Context`] is done.

use crate::{Abandon, Context, Fired, Source};

/// A [`Source`] that fires when its [`Context`] is cancelled or its deadline
/// passes.
///
/// The source never cancels the context; that stays with whoever owns it.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use waiter::{Context, ContextSource, Waiter};
///
/// let ctx = Context::new();
/// let waiter = Waiter::new().with(ContextSource::new(ctx.clone()));
///
/// let canceller = std::thread::spawn(move || ctx.cancel());
/// waiter.wait_one_of().unwrap();
/// canceller.join().unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContextSource {
    ctx: Context,
}

impl ContextSource {
    /// Wrap `ctx`.
    #[inline]
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// The wrapped context.
    #[inline]
    pub fn context(&self) -> &Context {
        &self.ctx
    }
}

impl From<Context> for ContextSource {
    fn from(ctx: Context) -> Self {
        Self::new(ctx)
    }
}

impl Source for ContextSource {
    fn race_until_fired(&self, fired: Fired, abandon: Abandon) {
        if self.ctx.wait_or(abandon.receiver()) {
            fired.fire();
        }
    }

    fn wait_until_fired(&self) {
        self.ctx.wait();
    }
}
