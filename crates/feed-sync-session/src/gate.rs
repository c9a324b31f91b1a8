//! Session gate tracking the authenticated user.

use std::sync::Arc;

use feed_sync_core::{
    ApiError, AuthApi, Loading, LoadingGuard, LogIgnore, Navigator, UserIdentity,
};
use tokio::sync::watch;

use crate::guard::LOGIN_PATH;

/// Authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: Option<UserIdentity>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl Session {
    /// State before the first "who am I" request has completed.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
        }
    }

    /// Settled state for a known (or absent) user.
    #[must_use]
    pub const fn settled(user: Option<UserIdentity>) -> Self {
        Self {
            is_authenticated: user.is_some(),
            user,
            is_loading: false,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::initial()
    }
}

impl Loading for Session {
    fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }
}

/// Session gate.
///
/// Owns the `Session` and is the only writer of it. Routing and the live
/// feed read it through `is_authenticated` or a `subscribe` receiver.
pub struct SessionGate {
    api: Arc<dyn AuthApi>,
    navigator: Arc<dyn Navigator>,
    session: watch::Sender<Session>,
}

impl SessionGate {
    /// Create a gate with an unauthenticated session.
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, navigator: Arc<dyn Navigator>) -> Self {
        let (session, _) = watch::channel(Session::initial());
        Self {
            api,
            navigator,
            session,
        }
    }

    /// Refresh the session from the backend.
    ///
    /// Any failure means "not authenticated"; nothing is propagated.
    pub async fn fetch_current_session(&self) {
        let loading = LoadingGuard::enter(&self.session);

        let user = match self.api.current_user().await {
            Ok(user) => {
                tracing::debug!(login = %user.login, "Session active");
                Some(user)
            }
            Err(e) => {
                tracing::debug!(error = %e, "No active session");
                None
            }
        };

        loading.finish(Session::settled(user));
    }

    /// Send the browser to the backend login entry point.
    pub fn login(&self) {
        let url = self.api.login_url();
        tracing::info!(%url, "Redirecting to login");
        self.navigator.redirect_to(&url);
    }

    /// Terminate the session and go to the login view.
    ///
    /// The terminate request is best effort: local state is cleared either
    /// way. Its failure, if any, is returned for inspection. The live stream
    /// must be disconnected by the caller.
    pub async fn logout(&self) -> Option<ApiError> {
        let ignored = self
            .api
            .terminate_session()
            .await
            .log_ignore("Terminate session request");

        self.session.send_replace(Session::settled(None));
        tracing::info!("Logged out");
        self.navigator.redirect_to(LOGIN_PATH);

        ignored
    }

    /// Drop the session after the server declared it expired.
    ///
    /// Unlike a refresh this does not ask the backend: the expiry is taken
    /// as final until the user logs in again.
    pub fn expire(&self) {
        self.session.send_replace(Session::settled(None));
        tracing::info!("Session expired by server");
    }

    /// Whether the last refresh found an active session.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.borrow().is_authenticated
    }

    /// Whether a refresh is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.session.borrow().is_loading
    }

    /// The authenticated user, if any.
    #[must_use]
    pub fn user(&self) -> Option<UserIdentity> {
        self.session.borrow().user.clone()
    }

    /// Snapshot of the session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.session.borrow().clone()
    }

    /// Receiver notified on every session transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }
}
