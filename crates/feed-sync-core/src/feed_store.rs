//! Paginated, filtered feed state with live merging.

use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    loading::{Loading, LoadingGuard},
    traits::FeedApi,
    types::{FeedItem, FeedItemId, FeedPage, FeedQuery, FilterState},
};

/// Observable feed state.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    /// Last committed page plus accepted pushed items.
    pub page: FeedPage,
    pub filter: FilterState,
    pub loading: bool,
    /// Human-readable message of the last failed fetch.
    pub error: Option<String>,
    /// Item loaded by `fetch_by_id`, independent of the page.
    pub selected: Option<FeedItem>,
}

impl FeedState {
    fn new(per_page: u32) -> Self {
        Self {
            page: FeedPage::empty(per_page),
            filter: FilterState::default(),
            loading: false,
            error: None,
            selected: None,
        }
    }

    /// Listing request for the current page and filter.
    #[must_use]
    pub fn query(&self) -> FeedQuery {
        FeedQuery {
            page: self.page.pagination.page,
            per_page: self.page.pagination.per_page,
            event_type: self.filter.event_type.clone(),
        }
    }
}

impl Loading for FeedState {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

/// Feed store.
///
/// Owns the feed page, filter and selection. Fetches go through the
/// `FeedApi` collaborator; pushed items are merged with `prepend_event`.
pub struct FeedStore {
    api: Arc<dyn FeedApi>,
    state: watch::Sender<FeedState>,
}

impl FeedStore {
    /// Create an empty store.
    #[must_use]
    pub fn new(api: Arc<dyn FeedApi>, per_page: u32) -> Self {
        let (state, _) = watch::channel(FeedState::new(per_page));
        Self { api, state }
    }

    /// Fetch the current page with the active filter.
    ///
    /// On failure the previous page is kept and `error` is set.
    pub async fn fetch_feed(&self) {
        let _loading = LoadingGuard::enter_with(&self.state, |s| s.error = None);
        let query = self.state.borrow().query();

        match self.api.list_events(&query).await {
            Ok(page) => {
                tracing::debug!(
                    page = page.pagination.page,
                    items = page.items.len(),
                    total = page.pagination.total,
                    "Feed page fetched"
                );
                self.state.send_modify(|s| s.page = page);
            }
            Err(e) => {
                tracing::warn!(error = %e, page = query.page, "Failed to fetch feed");
                self.state.send_modify(|s| s.error = Some(e.to_string()));
            }
        }
    }

    /// Fetch a single item into the `selected` slot.
    pub async fn fetch_by_id(&self, id: FeedItemId) {
        let _loading = LoadingGuard::enter_with(&self.state, |s| s.error = None);

        match self.api.get_event(id).await {
            Ok(item) => self.state.send_modify(|s| s.selected = Some(item)),
            Err(e) => {
                tracing::warn!(error = %e, id, "Failed to fetch feed item");
                self.state.send_modify(|s| s.error = Some(e.to_string()));
            }
        }
    }

    /// Move to another page and fetch it.
    ///
    /// The page is not checked against `total_pages`; the server answers
    /// out of range pages with an empty listing.
    pub async fn set_page(&self, page: u32) {
        self.state.send_modify(|s| s.page.pagination.page = page);
        self.fetch_feed().await;
    }

    /// Change the event type filter, reset to the first page and fetch.
    ///
    /// `None` or an empty string clears the filter.
    pub async fn set_filter(&self, event_type: Option<&str>) {
        let filter = FilterState::new(event_type);
        self.state.send_modify(|s| {
            s.filter = filter;
            s.page.pagination.page = 1;
        });
        self.fetch_feed().await;
    }

    /// Merge a pushed item at the front of the page.
    ///
    /// Items that do not match the active filter, or whose delivery is
    /// already on the page, are dropped. Returns whether the item was added.
    pub fn prepend_event(&self, item: FeedItem) -> bool {
        self.state.send_if_modified(|s| {
            if !s.filter.matches(&item) {
                tracing::trace!(id = item.id, event_type = %item.event_type, "Pushed item filtered out");
                return false;
            }
            if s.page.contains_delivery(&item.delivery_id) {
                tracing::debug!(id = item.id, delivery_id = %item.delivery_id, "Duplicate pushed item");
                return false;
            }
            s.page.items.insert(0, item);
            s.page.pagination.total = s.page.pagination.total.saturating_add(1);
            true
        })
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn snapshot(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }
}
