//! HTTP collaborator backed by reqwest.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use feed_sync_core::{
    ApiError, AuthApi, ClientConfig, FeedApi, FeedItem, FeedPage, FeedQuery, UserIdentity,
    types::FeedItemId,
};
use reqwest::{Client, Response, Url, cookie::Jar};
use serde::de::DeserializeOwned;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// REST client for the feed backend.
///
/// Session cookies are kept in a shared jar, so every request and the push
/// stream carry the same ambient credentials.
#[derive(Clone)]
pub struct HttpApi {
    client: Client,
    config: ClientConfig,
}

impl HttpApi {
    /// Build a client for the configured backend.
    ///
    /// # Errors
    /// Returns error if the API base is not a valid URL or the client
    /// cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let base: Url = config
            .api_base
            .parse()
            .map_err(|e| ApiError::Transport(format!("invalid api base: {e}")))?;

        let jar = Arc::new(Jar::default());
        if let Some(ref cookie) = config.session_cookie {
            jar.add_cookie_str(cookie, &base);
        }

        let client = Client::builder()
            .cookie_provider(jar)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(request_error)?;

        Ok(Self { client, config })
    }

    /// Underlying client, shared with the stream transport.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .get(self.config.url(path))
            .query(query)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(request_error)?;

        ensure_success(response)?
            .json()
            .await
            .map_err(request_error)
    }
}

fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Status {
            status: status.as_u16(),
        })
    }
}

fn request_error(e: reqwest::Error) -> ApiError {
    if e.is_decode() {
        ApiError::Decode(e.to_string())
    } else if let Some(status) = e.status() {
        ApiError::Status {
            status: status.as_u16(),
        }
    } else {
        ApiError::Transport(e.to_string())
    }
}

#[async_trait]
impl AuthApi for HttpApi {
    async fn current_user(&self) -> Result<UserIdentity, ApiError> {
        self.get_json("/api/auth/me", &[]).await
    }

    async fn terminate_session(&self) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.config.url("/api/auth/logout"))
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(request_error)?;
        ensure_success(response).map(drop)
    }

    fn login_url(&self) -> String {
        self.config.url("/api/auth/login")
    }
}

#[async_trait]
impl FeedApi for HttpApi {
    async fn list_events(&self, query: &FeedQuery) -> Result<FeedPage, ApiError> {
        tracing::debug!(?query, "Listing events");
        self.get_json("/api/events", &query.query_pairs()).await
    }

    async fn get_event(&self, id: FeedItemId) -> Result<FeedItem, ApiError> {
        self.get_json(&format!("/api/events/{id}"), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_base() {
        let result = HttpApi::new(ClientConfig::new("not a url"));
        assert!(matches!(result, Err(ApiError::Transport(_))));
    }

    #[test]
    fn test_login_url() {
        let api = HttpApi::new(ClientConfig::new("http://localhost:8080/")).unwrap();
        assert_eq!(api.login_url(), "http://localhost:8080/api/auth/login");
    }
}
