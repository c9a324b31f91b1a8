//! Push-stream wire protocol.

use feed_sync_core::FeedItem;

/// Stream endpoint, relative to the API base.
pub const STREAM_PATH: &str = "/api/events/stream";
/// Message carrying a JSON `FeedItem`.
pub const NEW_EVENT: &str = "new_event";
/// Message telling the client its session is gone.
pub const SESSION_EXPIRED: &str = "session_expired";

/// Raw signal from a push connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The server accepted the stream.
    Open,
    /// A named message.
    Message { event: String, data: String },
    /// The connection failed or ended.
    Error(String),
}

/// Decoded stream event consumed by the dispatch loop.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Opened,
    Item(Box<FeedItem>),
    Expired,
    Failed(String),
}

/// Protocol error.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed {event} payload: {source}")]
    Payload {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl StreamEvent {
    /// Decode a transport event.
    ///
    /// Unknown message names decode to `None`.
    ///
    /// # Errors
    /// Returns error if a `new_event` body is not a valid feed item.
    pub fn decode(event: TransportEvent) -> Result<Option<Self>, ProtocolError> {
        match event {
            TransportEvent::Open => Ok(Some(Self::Opened)),
            TransportEvent::Error(reason) => Ok(Some(Self::Failed(reason))),
            TransportEvent::Message { event, data } => match event.as_str() {
                NEW_EVENT => serde_json::from_str(&data)
                    .map(|item| Some(Self::Item(Box::new(item))))
                    .map_err(|source| ProtocolError::Payload {
                        event: NEW_EVENT,
                        source,
                    }),
                SESSION_EXPIRED => Ok(Some(Self::Expired)),
                other => {
                    tracing::debug!(event = other, "Ignoring unknown stream message");
                    Ok(None)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(event: &str, data: &str) -> TransportEvent {
        TransportEvent::Message {
            event: event.to_string(),
            data: data.to_string(),
        }
    }

    #[test]
    fn test_new_event_decodes_item() {
        let data = r#"{"id":5,"delivery_id":"d-5","event_type":"push","action":"",
            "repo_name":"octo/widgets","sender_login":"bob","sender_avatar_url":null,
            "title":null,"body":null,"html_url":"https://github.com/octo/widgets",
            "event_data":null,"occurred_at":"2024-05-01T10:00:00Z",
            "received_at":"2024-05-01T10:00:01Z"}"#;
        let Some(StreamEvent::Item(item)) = StreamEvent::decode(message(NEW_EVENT, data)).unwrap()
        else {
            panic!("Wrong event type");
        };
        assert_eq!(item.id, 5);
        assert_eq!(item.delivery_id, "d-5");
    }

    #[test]
    fn test_malformed_payload() {
        let err = StreamEvent::decode(message(NEW_EVENT, "not json")).unwrap_err();
        assert!(err.to_string().starts_with("Malformed new_event payload"));
    }

    #[test]
    fn test_session_expired_has_no_body() {
        assert_eq!(
            StreamEvent::decode(message(SESSION_EXPIRED, "")).unwrap(),
            Some(StreamEvent::Expired)
        );
    }

    #[test]
    fn test_unknown_message_ignored() {
        assert_eq!(
            StreamEvent::decode(message("heartbeat", "{}")).unwrap(),
            None
        );
    }

    #[test]
    fn test_transport_signals() {
        assert_eq!(
            StreamEvent::decode(TransportEvent::Open).unwrap(),
            Some(StreamEvent::Opened)
        );
        assert_eq!(
            StreamEvent::decode(TransportEvent::Error("reset".into())).unwrap(),
            Some(StreamEvent::Failed("reset".into()))
        );
    }
}
