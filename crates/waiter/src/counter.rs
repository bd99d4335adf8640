//! Fires when a caller-owned [`WaitGroup`] is released.

use flume::Selector;

use crate::{Abandon, Fired, Source, WaitGroup};

/// A [`Source`] that fires once its [`WaitGroup`] has no pending members.
///
/// The race path watches the group instead of blocking in
/// [`WaitGroup::wait`], so it honors abandonment like every other built-in
/// source.
///
/// # Example
///
/// ```rust
/// use waiter::{GroupSource, WaitGroup, Waiter};
///
/// let group = WaitGroup::new();
/// group.add(1);
///
/// let waiter = Waiter::new().with(GroupSource::new(group.clone()));
/// std::thread::spawn(move || group.done());
/// waiter.wait_one_of().unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct GroupSource {
    group: WaitGroup,
}

impl GroupSource {
    /// Wrap a caller-owned group.
    #[inline]
    pub fn new(group: WaitGroup) -> Self {
        Self { group }
    }

    /// The wrapped group.
    #[inline]
    pub fn group(&self) -> &WaitGroup {
        &self.group
    }
}

impl From<WaitGroup> for GroupSource {
    fn from(group: WaitGroup) -> Self {
        Self::new(group)
    }
}

impl Source for GroupSource {
    fn race_until_fired(&self, fired: Fired, abandon: Abandon) {
        let released = self.group.watch();
        let done = Selector::new()
            .recv(abandon.receiver(), |_| false)
            .recv(&released, |_| true)
            .wait();
        if done {
            fired.fire();
        }
    }

    fn wait_until_fired(&self) {
        self.group.wait();
    }
}
