//! Fakes shared by the unit tests.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::DateTime;
use feed_sync_core::{
    ApiError, AuthApi, FeedApi, FeedItem, FeedPage, FeedQuery, Pagination, UserIdentity,
    types::FeedItemId,
};
use tokio::sync::mpsc;

use crate::{
    protocol::TransportEvent,
    stream::{Connection, StreamTransport},
};

/// Transport whose connections are fed by the test.
#[derive(Clone, Default)]
pub struct FakeTransport {
    senders: Arc<Mutex<Vec<mpsc::Sender<TransportEvent>>>>,
}

impl FakeTransport {
    pub fn opened(&self) -> usize {
        self.senders.lock().unwrap().len()
    }

    pub fn sender(&self, index: usize) -> mpsc::Sender<TransportEvent> {
        self.senders.lock().unwrap()[index].clone()
    }

    pub fn latest(&self) -> mpsc::Sender<TransportEvent> {
        self.senders.lock().unwrap().last().cloned().unwrap()
    }

    /// Drop every sender so open connections see their channel close.
    pub fn close_all(&self) {
        self.senders.lock().unwrap().clear();
    }
}

impl StreamTransport for FakeTransport {
    fn open(&self) -> Connection {
        let (tx, connection) = Connection::channel(16);
        self.senders.lock().unwrap().push(tx);
        connection
    }
}

pub fn item(id: FeedItemId, event_type: &str) -> FeedItem {
    FeedItem {
        id,
        delivery_id: format!("delivery-{id}"),
        event_type: event_type.to_string(),
        action: "created".to_string(),
        repo_name: "octo/widgets".to_string(),
        sender_login: "bob".to_string(),
        sender_avatar_url: None,
        title: None,
        body: None,
        html_url: "https://github.com/octo/widgets".to_string(),
        event_data: None,
        occurred_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        received_at: DateTime::from_timestamp(1_700_000_002, 0).unwrap(),
    }
}

pub fn item_json(id: FeedItemId, event_type: &str) -> String {
    serde_json::to_string(&item(id, event_type)).unwrap()
}

pub fn alice() -> UserIdentity {
    UserIdentity {
        id: 1,
        login: "alice".to_string(),
        display_name: "Alice".to_string(),
        avatar_url: None,
    }
}

/// Backend fake answering both auth and feed requests.
#[derive(Default)]
pub struct FakeApi {
    pub users: Mutex<VecDeque<Result<UserIdentity, ApiError>>>,
    pub pages: Mutex<VecDeque<FeedPage>>,
    pub queries: Mutex<Vec<FeedQuery>>,
    pub logout_calls: AtomicUsize,
}

impl FakeApi {
    pub fn answering(users: Vec<Result<UserIdentity, ApiError>>) -> Self {
        Self {
            users: Mutex::new(users.into()),
            ..Self::default()
        }
    }

    pub fn list_calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl AuthApi for FakeApi {
    async fn current_user(&self) -> Result<UserIdentity, ApiError> {
        let next = self.users.lock().unwrap().pop_front();
        next.unwrap_or(Err(ApiError::Status { status: 401 }))
    }

    async fn terminate_session(&self) -> Result<(), ApiError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn login_url(&self) -> String {
        "http://backend.test/api/auth/login".to_string()
    }
}

#[async_trait]
impl FeedApi for FakeApi {
    async fn list_events(&self, query: &FeedQuery) -> Result<FeedPage, ApiError> {
        self.queries.lock().unwrap().push(query.clone());
        let next = self.pages.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| FeedPage {
            items: Vec::new(),
            pagination: Pagination {
                page: query.page,
                per_page: query.per_page,
                total: 0,
                total_pages: 0,
            },
        }))
    }

    async fn get_event(&self, id: FeedItemId) -> Result<FeedItem, ApiError> {
        Ok(item(id, "push"))
    }
}
