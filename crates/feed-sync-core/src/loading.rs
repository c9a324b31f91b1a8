//! Drop guard for a published loading flag.

use tokio::sync::watch;

/// Observable state carrying a loading flag.
pub trait Loading {
    fn set_loading(&mut self, loading: bool);
}

/// Raises the loading flag on entry and lowers it when dropped, including
/// when the awaiting future is cancelled.
pub struct LoadingGuard<'a, S: Loading> {
    state: &'a watch::Sender<S>,
    armed: bool,
}

impl<'a, S: Loading> LoadingGuard<'a, S> {
    /// Mark `state` as loading.
    pub fn enter(state: &'a watch::Sender<S>) -> Self {
        Self::enter_with(state, |_| {})
    }

    /// Apply `prepare` and mark `state` as loading in one transition.
    pub fn enter_with(state: &'a watch::Sender<S>, prepare: impl FnOnce(&mut S)) -> Self {
        state.send_modify(|s| {
            prepare(s);
            s.set_loading(true);
        });
        Self { state, armed: true }
    }

    /// Publish `next` in place of the current state. `next` carries its own
    /// loading flag, so nothing else is sent on drop.
    pub fn finish(mut self, next: S) {
        self.armed = false;
        self.state.send_replace(next);
    }
}

impl<S: Loading> Drop for LoadingGuard<'_, S> {
    fn drop(&mut self) {
        if self.armed {
            self.state.send_modify(|s| s.set_loading(false));
        }
    }
}
