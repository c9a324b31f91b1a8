//! Server-sent events transport for the push stream.

use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, StatusCode, header::ACCEPT};
use tokio::sync::mpsc;

use crate::{
    http::HttpApi,
    protocol::{STREAM_PATH, TransportEvent},
    stream::{Connection, StreamTransport},
};

const EVENT_BUFFER: usize = 64;

/// Why a stream connection ended.
#[derive(Debug, thiserror::Error)]
enum StreamError {
    #[error("Stream request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Stream request rejected with status {0}")]
    Status(StatusCode),
    #[error("Stream decode error: {0}")]
    Decode(String),
    #[error("Stream closed by server")]
    Closed,
}

/// SSE transport over reqwest.
#[derive(Clone)]
pub struct SseTransport {
    client: Client,
    url: String,
}

impl SseTransport {
    /// Create a transport for a stream URL.
    #[must_use]
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Transport sharing the API client's cookies, at the standard path.
    #[must_use]
    pub fn from_api(api: &HttpApi) -> Self {
        Self::new(api.client().clone(), api.config().url(STREAM_PATH))
    }
}

impl StreamTransport for SseTransport {
    fn open(&self) -> Connection {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let request = self
            .client
            .get(&self.url)
            .header(ACCEPT, "text/event-stream");

        let reader = tokio::spawn(async move {
            let err = read_stream(request, &tx)
                .await
                .err()
                .unwrap_or(StreamError::Closed);
            if tx.send(TransportEvent::Error(err.to_string())).await.is_err() {
                tracing::debug!(error = %err, "Stream ended after its receiver was dropped");
            }
        });

        Connection::new(rx, Some(reader))
    }
}

/// Forward SSE messages until the stream ends. `Ok` means the receiver
/// went away.
async fn read_stream(
    request: RequestBuilder,
    tx: &mpsc::Sender<TransportEvent>,
) -> Result<(), StreamError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(StreamError::Status(status));
    }

    if tx.send(TransportEvent::Open).await.is_err() {
        return Ok(());
    }

    let mut events = response.bytes_stream().eventsource();
    while let Some(next) = events.next().await {
        let event = next.map_err(|e| StreamError::Decode(e.to_string()))?;
        let message = TransportEvent::Message {
            event: event.event,
            data: event.data,
        };
        if tx.send(message).await.is_err() {
            return Ok(());
        }
    }

    Err(StreamError::Closed)
}
