//! Reconnecting push-stream client.

use std::future;

use feed_sync_core::{ClientConfig, FeedItem, LogIgnore};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Duration, Instant, sleep_until},
};
use uuid::Uuid;

use crate::{
    backoff::Backoff,
    protocol::{StreamEvent, TransportEvent},
};

/// Connection status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// Something the owner of the stream has to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamSignal {
    /// A pushed feed item.
    Item(Box<FeedItem>),
    /// The server ended the session; the stream is already torn down.
    SessionExpired,
    /// A scheduled reconnect just fired and a new connection is opening.
    Reconnecting,
}

/// One open push connection.
///
/// Dropping it closes the connection.
pub struct Connection {
    id: Uuid,
    events: mpsc::Receiver<TransportEvent>,
    reader: Option<JoinHandle<()>>,
}

impl Connection {
    /// Wrap an event receiver and the task feeding it.
    #[must_use]
    pub fn new(events: mpsc::Receiver<TransportEvent>, reader: Option<JoinHandle<()>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            events,
            reader,
        }
    }

    /// A connection fed by hand through the returned sender.
    #[must_use]
    pub fn channel(buffer: usize) -> (mpsc::Sender<TransportEvent>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self::new(rx, None))
    }

    /// Identifier used in logs.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// Opens push connections to the stream endpoint.
pub trait StreamTransport: Send + Sync {
    /// Start a new connection. Must be called within a tokio runtime.
    fn open(&self) -> Connection;
}

enum Wake {
    Transport(Option<TransportEvent>),
    Reconnect,
}

/// Push-stream client.
///
/// `Disconnected -> Connecting -> Connected -> (Disconnected | Connecting)`.
/// At most one connection is open and at most one reconnect is pending;
/// both live in a single `Option` each, so duplicates cannot exist.
/// Drive it with `next_signal`.
pub struct StreamClient<T>
where
    T: StreamTransport,
{
    transport: T,
    status: ConnectionStatus,
    backoff: Backoff,
    connection: Option<Connection>,
    reconnect_at: Option<Instant>,
    dropped: u64,
}

impl<T> StreamClient<T>
where
    T: StreamTransport,
{
    /// Create a disconnected client.
    #[must_use]
    pub const fn new(transport: T, backoff: Backoff) -> Self {
        Self {
            transport,
            status: ConnectionStatus::Disconnected,
            backoff,
            connection: None,
            reconnect_at: None,
            dropped: 0,
        }
    }

    /// Create a client with backoff bounds from configuration.
    #[must_use]
    pub fn with_config(transport: T, config: &ClientConfig) -> Self {
        Self::new(transport, Backoff::from_config(config))
    }

    /// Open a fresh connection, closing any previous one first.
    ///
    /// A reconnect pending at this point is superseded.
    pub fn connect(&mut self) {
        if let Some(previous) = self.connection.take() {
            tracing::debug!(connection = %previous.id(), "Closing previous stream connection");
        }
        self.reconnect_at = None;

        let connection = self.transport.open();
        tracing::info!(connection = %connection.id(), "Connecting to event stream");
        self.connection = Some(connection);
        self.status = ConnectionStatus::Connecting;
    }

    /// Cancel any pending reconnect and close the connection.
    ///
    /// Safe to call any number of times from any state.
    pub fn disconnect(&mut self) {
        if self.reconnect_at.take().is_some() {
            tracing::debug!("Cancelled pending reconnect");
        }
        if let Some(connection) = self.connection.take() {
            tracing::info!(connection = %connection.id(), "Disconnected from event stream");
        }
        self.status = ConnectionStatus::Disconnected;
    }

    /// Wait for the next signal.
    ///
    /// Processes transport events and the reconnect timer in arrival order.
    /// Returns `None` once there is neither a connection nor a pending
    /// reconnect, i.e. after `disconnect` or session expiry.
    pub async fn next_signal(&mut self) -> Option<StreamSignal> {
        loop {
            if self.connection.is_none() && self.reconnect_at.is_none() {
                return None;
            }

            let wake = tokio::select! {
                event = next_event(self.connection.as_mut()) => Wake::Transport(event),
                () = reconnect_due(self.reconnect_at) => Wake::Reconnect,
            };

            match wake {
                Wake::Transport(Some(event)) => {
                    if let Some(signal) = self.on_transport_event(event) {
                        return Some(signal);
                    }
                }
                Wake::Transport(None) => {
                    self.handle(StreamEvent::Failed("event channel closed".to_string()));
                }
                Wake::Reconnect => return Some(self.fire_reconnect()),
            }
        }
    }

    /// Decode and apply one transport event.
    ///
    /// Undecodable messages are logged and dropped without touching the
    /// connection state.
    pub fn on_transport_event(&mut self, event: TransportEvent) -> Option<StreamSignal> {
        match StreamEvent::decode(event).ok_or_log("Decoding stream message") {
            Some(Some(event)) => self.handle(event),
            Some(None) => None,
            None => {
                self.dropped += 1;
                None
            }
        }
    }

    /// Apply a decoded event to the state machine.
    pub fn handle(&mut self, event: StreamEvent) -> Option<StreamSignal> {
        match event {
            StreamEvent::Opened => {
                let Some(ref connection) = self.connection else {
                    tracing::debug!("Open without a connection, ignoring");
                    return None;
                };
                tracing::info!(connection = %connection.id(), "Event stream open");
                self.status = ConnectionStatus::Connected;
                self.backoff.reset();
                None
            }
            StreamEvent::Item(item) => Some(StreamSignal::Item(item)),
            StreamEvent::Expired => {
                tracing::info!("Session expired, closing event stream");
                self.disconnect();
                Some(StreamSignal::SessionExpired)
            }
            StreamEvent::Failed(reason) => {
                self.status = ConnectionStatus::Disconnected;
                if let Some(connection) = self.connection.take() {
                    tracing::warn!(connection = %connection.id(), %reason, "Event stream failed");
                }
                self.schedule_reconnect();
                None
            }
        }
    }

    fn schedule_reconnect(&mut self) {
        if self.reconnect_at.is_some() {
            tracing::trace!("Reconnect already pending");
            return;
        }
        let delay = self.backoff.current();
        tracing::info!(?delay, "Scheduling reconnect");
        self.reconnect_at = Some(Instant::now() + delay);
    }

    fn fire_reconnect(&mut self) -> StreamSignal {
        self.reconnect_at = None;
        self.connect();
        self.backoff.advance();
        StreamSignal::Reconnecting
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Delay the next reconnect would use.
    #[must_use]
    pub const fn backoff(&self) -> Duration {
        self.backoff.current()
    }

    /// Whether a reconnect is scheduled.
    #[must_use]
    pub const fn reconnect_pending(&self) -> bool {
        self.reconnect_at.is_some()
    }

    /// Number of messages dropped because they could not be decoded.
    #[must_use]
    pub const fn dropped_messages(&self) -> u64 {
        self.dropped
    }
}

impl<T> Drop for StreamClient<T>
where
    T: StreamTransport,
{
    fn drop(&mut self) {
        self.disconnect();
    }
}

async fn next_event(connection: Option<&mut Connection>) -> Option<TransportEvent> {
    match connection {
        Some(connection) => connection.events.recv().await,
        None => future::pending().await,
    }
}

async fn reconnect_due(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        protocol::{NEW_EVENT, SESSION_EXPIRED},
        testing::{FakeTransport, item_json},
    };

    fn client(transport: &FakeTransport) -> StreamClient<FakeTransport> {
        StreamClient::new(transport.clone(), Backoff::default())
    }

    fn message(event: &str, data: &str) -> TransportEvent {
        TransportEvent::Message {
            event: event.to_string(),
            data: data.to_string(),
        }
    }

    #[tokio::test]
    async fn test_connect_twice_keeps_one_connection() {
        let transport = FakeTransport::default();
        let mut client = client(&transport);

        client.connect();
        client.connect();

        assert_eq!(transport.opened(), 2);
        assert!(transport.sender(0).is_closed());
        assert!(!transport.sender(1).is_closed());
        assert_eq!(client.status(), ConnectionStatus::Connecting);
    }

    #[tokio::test]
    async fn test_open_marks_connected() {
        let transport = FakeTransport::default();
        let mut client = client(&transport);
        client.connect();

        assert!(client.on_transport_event(TransportEvent::Open).is_none());
        assert_eq!(client.status(), ConnectionStatus::Connected);
        assert_eq!(client.backoff(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_grows_until_open() {
        let transport = FakeTransport::default();
        let mut client = client(&transport);
        client.connect();

        for n in 1..=6u32 {
            let expected_delay = client.backoff();
            transport.latest().send(TransportEvent::Error("refused".into())).await.unwrap();

            let before = Instant::now();
            assert_eq!(client.next_signal().await, Some(StreamSignal::Reconnecting));
            assert!(before.elapsed() >= expected_delay);

            let expected = (3000u64 << n).min(30_000);
            assert_eq!(client.backoff(), Duration::from_millis(expected));
            assert_eq!(client.status(), ConnectionStatus::Connecting);
        }
        assert_eq!(transport.opened(), 7);

        let latest = transport.latest();
        latest.send(TransportEvent::Open).await.unwrap();
        latest.send(message(NEW_EVENT, &item_json(1, "push"))).await.unwrap();
        assert!(matches!(client.next_signal().await, Some(StreamSignal::Item(_))));
        assert_eq!(client.status(), ConnectionStatus::Connected);
        assert_eq!(client.backoff(), Duration::from_millis(3000));
    }

    #[tokio::test]
    async fn test_open_after_disconnect_is_ignored() {
        let transport = FakeTransport::default();
        let mut client = client(&transport);
        client.connect();
        client.handle(StreamEvent::Failed("reset".into()));
        client.disconnect();

        assert!(client.handle(StreamEvent::Opened).is_none());
        assert_eq!(client.status(), ConnectionStatus::Disconnected);
        assert_eq!(client.next_signal().await, None);
    }

    #[tokio::test]
    async fn test_idle_connection_stays_pending() {
        let transport = FakeTransport::default();
        let mut client = client(&transport);
        client.connect();

        {
            let mut next = tokio_test::task::spawn(client.next_signal());
            tokio_test::assert_pending!(next.poll());
        }
        assert!(!client.reconnect_pending());
        assert_eq!(client.status(), ConnectionStatus::Connecting);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_pending_reconnect() {
        let transport = FakeTransport::default();
        let mut client = client(&transport);
        client.connect();

        client.handle(StreamEvent::Failed("reset".into()));
        let deadline = client.reconnect_at;
        tokio::time::advance(Duration::from_millis(1000)).await;
        client.handle(StreamEvent::Failed("reset again".into()));

        assert!(client.reconnect_pending());
        assert_eq!(client.reconnect_at, deadline);
        assert_eq!(client.status(), ConnectionStatus::Disconnected);

        assert_eq!(client.next_signal().await, Some(StreamSignal::Reconnecting));
        assert!(!client.reconnect_pending());
        assert_eq!(transport.opened(), 2);
    }

    #[tokio::test]
    async fn test_session_expired_tears_down_once() {
        let transport = FakeTransport::default();
        let mut client = client(&transport);
        client.connect();
        let tx = transport.latest();
        tx.send(TransportEvent::Open).await.unwrap();
        tx.send(message(SESSION_EXPIRED, "")).await.unwrap();

        assert_eq!(client.next_signal().await, Some(StreamSignal::SessionExpired));
        assert_eq!(client.status(), ConnectionStatus::Disconnected);
        assert!(!client.reconnect_pending());
        assert!(tx.is_closed());

        assert_eq!(client.next_signal().await, None);
    }

    #[tokio::test]
    async fn test_session_expired_cancels_pending_reconnect() {
        let transport = FakeTransport::default();
        let mut client = client(&transport);
        client.connect();
        client.handle(StreamEvent::Failed("reset".into()));
        assert!(client.reconnect_pending());

        assert_eq!(
            client.handle(StreamEvent::Expired),
            Some(StreamSignal::SessionExpired)
        );
        assert!(!client.reconnect_pending());
        assert_eq!(client.next_signal().await, None);
    }

    #[tokio::test]
    async fn test_malformed_message_is_dropped() {
        let transport = FakeTransport::default();
        let mut client = client(&transport);
        client.connect();
        let tx = transport.latest();
        tx.send(TransportEvent::Open).await.unwrap();
        tx.send(message(NEW_EVENT, "not json")).await.unwrap();
        tx.send(message("heartbeat", "")).await.unwrap();
        tx.send(message(NEW_EVENT, &item_json(4, "push"))).await.unwrap();

        let Some(StreamSignal::Item(item)) = client.next_signal().await else {
            panic!("Wrong signal");
        };
        assert_eq!(item.id, 4);
        assert_eq!(client.dropped_messages(), 1);
        assert_eq!(client.status(), ConnectionStatus::Connected);
        assert!(!client.reconnect_pending());
        assert_eq!(transport.opened(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_channel_counts_as_failure() {
        let transport = FakeTransport::default();
        let mut client = client(&transport);
        client.connect();
        transport.close_all();

        assert_eq!(client.next_signal().await, Some(StreamSignal::Reconnecting));
        assert_eq!(transport.opened(), 2);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let transport = FakeTransport::default();
        let mut client = client(&transport);
        client.disconnect();
        client.disconnect();
        assert_eq!(client.status(), ConnectionStatus::Disconnected);

        client.connect();
        client.handle(StreamEvent::Failed("reset".into()));
        client.disconnect();
        client.disconnect();

        assert_eq!(client.status(), ConnectionStatus::Disconnected);
        assert!(!client.reconnect_pending());
        assert_eq!(client.next_signal().await, None);
    }

    #[tokio::test]
    async fn test_drop_closes_connection() {
        let transport = FakeTransport::default();
        let mut client = client(&transport);
        client.connect();
        let tx = transport.latest();

        drop(client);
        assert!(tx.is_closed());
    }
}
