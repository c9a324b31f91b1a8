//! Collaborator traits for the backend API and navigation.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{FeedItem, FeedItemId, FeedPage, FeedQuery, UserIdentity};

/// Backend request failure.
///
/// The core only distinguishes success from failure; the variants exist so
/// the rendered message is useful to a person.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Server responded with status {status}")]
    Status { status: u16 },
    #[error("Malformed response: {0}")]
    Decode(String),
}

/// Authentication endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `GET /api/auth/me` with ambient credentials.
    async fn current_user(&self) -> Result<UserIdentity, ApiError>;

    /// `POST /api/auth/logout`.
    async fn terminate_session(&self) -> Result<(), ApiError>;

    /// Absolute URL of the backend login entry point (`/api/auth/login`).
    fn login_url(&self) -> String;
}

/// Feed listing endpoints.
#[async_trait]
pub trait FeedApi: Send + Sync {
    /// `GET /api/events?page&per_page&event_type`.
    async fn list_events(&self, query: &FeedQuery) -> Result<FeedPage, ApiError>;

    /// `GET /api/events/{id}`.
    async fn get_event(&self, id: FeedItemId) -> Result<FeedItem, ApiError>;
}

/// Routing primitives of the host application.
pub trait Navigator: Send + Sync {
    /// Navigate to a path (or an absolute URL for external redirects).
    fn redirect_to(&self, path: &str);

    /// Path currently displayed.
    fn current_path(&self) -> String;
}
