//! Core abstractions for live feed synchronization.
//!
//! This crate provides the fundamental building blocks:
//! - `FeedStore` - Paginated, filtered feed state with push merging
//! - `FeedItem`, `FeedPage`, `UserIdentity` - Wire-compatible data model
//! - `ClientConfig` - Backend origin, page size and reconnection bounds
//! - `AuthApi`, `FeedApi`, `Navigator` - Collaborator traits
//! - `LoadingGuard` - Cancellation-safe loading flag
//! - `LogIgnore` - Explicit "log and swallow" for best-effort calls

pub mod config;
pub mod feed_store;
pub mod ignore;
pub mod loading;
pub mod traits;
pub mod types;

pub use config::{ClientConfig, ConfigError};
pub use feed_store::{FeedState, FeedStore};
pub use ignore::LogIgnore;
pub use loading::{Loading, LoadingGuard};
pub use traits::{ApiError, AuthApi, FeedApi, Navigator};
pub use types::{FeedItem, FeedPage, FeedQuery, FilterState, Pagination, UserIdentity};
