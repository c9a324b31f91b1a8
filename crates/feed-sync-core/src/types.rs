//! Feed and identity data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier assigned to a feed item by the server.
pub type FeedItemId = i64;

/// The authenticated user, as returned by `GET /api/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: i64,
    pub login: String,
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// A single activity feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    /// Server-assigned identity.
    pub id: FeedItemId,
    /// Idempotency token of the upstream delivery.
    pub delivery_id: String,
    pub event_type: String,
    pub action: String,
    pub repo_name: String,
    pub sender_login: String,
    #[serde(default)]
    pub sender_avatar_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    pub html_url: String,
    /// Opaque structured payload.
    #[serde(default)]
    pub event_data: Option<Value>,
    pub occurred_at: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
}

/// Pagination metadata of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    /// Pagination of an empty, not yet fetched first page.
    #[must_use]
    pub const fn first(per_page: u32) -> Self {
        Self {
            page: 1,
            per_page,
            total: 0,
            total_pages: 0,
        }
    }
}

/// One page of the feed, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPage {
    #[serde(rename = "events")]
    pub items: Vec<FeedItem>,
    pub pagination: Pagination,
}

impl FeedPage {
    /// An empty page with the given page size.
    #[must_use]
    pub const fn empty(per_page: u32) -> Self {
        Self {
            items: Vec::new(),
            pagination: Pagination::first(per_page),
        }
    }

    /// Whether an item with this delivery id is already on the page.
    #[must_use]
    pub fn contains_delivery(&self, delivery_id: &str) -> bool {
        self.items.iter().any(|i| i.delivery_id == delivery_id)
    }
}

/// Active server-side filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub event_type: Option<String>,
}

impl FilterState {
    /// Build a filter; an empty event type means "no filter".
    #[must_use]
    pub fn new(event_type: Option<&str>) -> Self {
        Self {
            event_type: event_type
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(ToOwned::to_owned),
        }
    }

    /// Whether the filter is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.event_type.is_some()
    }

    /// Whether an item is consistent with this filter.
    #[must_use]
    pub fn matches(&self, item: &FeedItem) -> bool {
        self.event_type
            .as_deref()
            .is_none_or(|t| t == item.event_type)
    }
}

/// Parameters of a listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub page: u32,
    pub per_page: u32,
    pub event_type: Option<String>,
}

impl FeedQuery {
    /// Query string pairs; `event_type` is only present when filtering.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        if let Some(ref event_type) = self.event_type {
            pairs.push(("event_type", event_type.clone()));
        }
        pairs
    }
}
