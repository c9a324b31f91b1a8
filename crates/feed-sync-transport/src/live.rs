//! Live feed context wiring session, feed and stream together.

use std::sync::Arc;

use feed_sync_core::{ApiError, FeedStore, Navigator, types::FeedItemId};
use feed_sync_session::{RouteGuard, SessionGate, Verdict};

use crate::stream::{StreamClient, StreamSignal, StreamTransport};

/// What a dispatch step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A pushed item was offered to the feed.
    Item { id: FeedItemId, accepted: bool },
    /// The server expired the session; the route was re-checked as
    /// unauthenticated.
    SessionExpired(Verdict),
    /// The stream reconnected and the current page was re-fetched.
    Reconnected,
}

/// Live feed for one authenticated page view.
///
/// Owns the stream; shares the session gate and feed store with whoever
/// renders them. Dropping it disconnects the stream.
pub struct LiveFeed<T>
where
    T: StreamTransport,
{
    guard: RouteGuard,
    feed: Arc<FeedStore>,
    stream: StreamClient<T>,
}

impl<T> LiveFeed<T>
where
    T: StreamTransport,
{
    /// Create a live feed. Nothing is fetched or connected until `start`.
    #[must_use]
    pub fn new(
        session: Arc<SessionGate>,
        navigator: Arc<dyn Navigator>,
        feed: Arc<FeedStore>,
        stream: StreamClient<T>,
    ) -> Self {
        Self {
            guard: RouteGuard::new(session, navigator),
            feed,
            stream,
        }
    }

    /// Guard the current route, then load the first page and go live.
    ///
    /// The stream is only connected for an allowed route with an
    /// authenticated session.
    pub async fn start(&mut self) -> Verdict {
        let verdict = self.guard.enforce_current().await;
        if verdict == Verdict::Allow && self.session().is_authenticated() {
            self.feed.fetch_feed().await;
            self.stream.connect();
        }
        verdict
    }

    /// Wait for the next stream signal and apply it.
    ///
    /// Returns `None` once the stream is down for good.
    pub async fn step(&mut self) -> Option<Dispatch> {
        let dispatch = match self.stream.next_signal().await? {
            StreamSignal::Item(item) => {
                let id = item.id;
                let accepted = self.feed.prepend_event(*item);
                Dispatch::Item { id, accepted }
            }
            StreamSignal::SessionExpired => {
                self.session().expire();
                Dispatch::SessionExpired(self.guard.recheck_current())
            }
            StreamSignal::Reconnecting => {
                self.feed.fetch_feed().await;
                Dispatch::Reconnected
            }
        };
        tracing::debug!(?dispatch, "Stream signal applied");
        Some(dispatch)
    }

    /// Run the dispatch loop until the stream stops.
    pub async fn run(&mut self) {
        while self.step().await.is_some() {}
    }

    /// Disconnect the stream, then log out.
    ///
    /// Returns the swallowed terminate-session failure, if any.
    pub async fn logout(&mut self) -> Option<ApiError> {
        self.stream.disconnect();
        self.session().logout().await
    }

    /// Tear down the stream.
    pub fn shutdown(&mut self) {
        self.stream.disconnect();
    }

    /// The session gate.
    #[must_use]
    pub const fn session(&self) -> &Arc<SessionGate> {
        self.guard.gate()
    }

    /// The feed store.
    #[must_use]
    pub const fn feed(&self) -> &Arc<FeedStore> {
        &self.feed
    }

    /// The stream client.
    #[must_use]
    pub const fn stream(&self) -> &StreamClient<T> {
        &self.stream
    }

    /// The route guard.
    #[must_use]
    pub const fn guard(&self) -> &RouteGuard {
        &self.guard
    }
}
