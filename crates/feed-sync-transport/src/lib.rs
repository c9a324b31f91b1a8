//! Live transport for feed clients.
//!
//! Provides:
//! - Push-stream protocol (named SSE messages)
//! - `StreamClient` - Reconnecting stream state machine
//! - `LiveFeed` - Session, feed and stream wired together
//! - HTTP and SSE collaborators (feature: http)

pub mod backoff;
pub mod live;
pub mod protocol;
pub mod stream;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub mod sse;

#[cfg(test)]
mod testing;

pub use backoff::Backoff;
pub use live::{Dispatch, LiveFeed};
pub use protocol::{StreamEvent, TransportEvent};
pub use stream::{Connection, ConnectionStatus, StreamClient, StreamSignal, StreamTransport};

#[cfg(feature = "http")]
pub use http::HttpApi;

#[cfg(feature = "http")]
pub use sse::SseTransport;
