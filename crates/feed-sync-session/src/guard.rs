//! Navigation guard.

use std::sync::Arc;

use feed_sync_core::Navigator;

use crate::gate::SessionGate;

/// Login view.
pub const LOGIN_PATH: &str = "/login";
/// Landing view for authenticated users.
pub const HOME_PATH: &str = "/";
/// Backend login entry point; never triggers a session refresh.
pub const LOGIN_ENTRY_PATH: &str = "/api/auth/login";

/// Outcome of a navigation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Redirect(String),
}

impl Verdict {
    fn redirect(path: &str) -> Self {
        Self::Redirect(path.to_string())
    }
}

/// Decide whether `path` may be shown for the given authentication state.
///
/// The backend login entry point is always allowed; it owns the redirect
/// back.
#[must_use]
pub fn decide(path: &str, authenticated: bool) -> Verdict {
    let target = route(path);
    if target == LOGIN_ENTRY_PATH {
        return Verdict::Allow;
    }
    match (target == LOGIN_PATH, authenticated) {
        (true, true) => Verdict::redirect(HOME_PATH),
        (true, false) | (false, true) => Verdict::Allow,
        (false, false) => Verdict::redirect(LOGIN_PATH),
    }
}

/// Path without query string or fragment.
fn route(path: &str) -> &str {
    path.split(['?', '#']).next().unwrap_or(path)
}

/// Route guard.
///
/// Refreshes the session before every decision so no navigation is judged
/// on stale authentication state.
pub struct RouteGuard {
    gate: Arc<SessionGate>,
    navigator: Arc<dyn Navigator>,
}

impl RouteGuard {
    /// Create a guard over a session gate.
    #[must_use]
    pub fn new(gate: Arc<SessionGate>, navigator: Arc<dyn Navigator>) -> Self {
        Self { gate, navigator }
    }

    /// The session gate consulted by this guard.
    #[must_use]
    pub const fn gate(&self) -> &Arc<SessionGate> {
        &self.gate
    }

    /// Check a requested path.
    pub async fn authorize(&self, path: &str) -> Verdict {
        if route(path) != LOGIN_ENTRY_PATH {
            self.gate.fetch_current_session().await;
        }
        let verdict = decide(path, self.gate.is_authenticated());
        tracing::debug!(path, ?verdict, "Route checked");
        verdict
    }

    /// Re-check the path currently shown against the session as it stands,
    /// without refreshing it, and redirect away if needed.
    pub fn recheck_current(&self) -> Verdict {
        let path = self.navigator.current_path();
        let verdict = decide(&path, self.gate.is_authenticated());
        self.leave_if_redirected(&path, &verdict);
        verdict
    }

    /// Navigate to `path`, or wherever the verdict redirects.
    pub async fn navigate(&self, path: &str) -> Verdict {
        let verdict = self.authorize(path).await;
        match verdict {
            Verdict::Allow => self.navigator.redirect_to(path),
            Verdict::Redirect(ref to) => self.navigator.redirect_to(to),
        }
        verdict
    }

    /// Re-check the path currently shown and redirect away if needed.
    pub async fn enforce_current(&self) -> Verdict {
        let path = self.navigator.current_path();
        let verdict = self.authorize(&path).await;
        self.leave_if_redirected(&path, &verdict);
        verdict
    }

    fn leave_if_redirected(&self, path: &str, verdict: &Verdict) {
        if let Verdict::Redirect(to) = verdict {
            tracing::info!(from = %path, to = %to, "Leaving route");
            self.navigator.redirect_to(to);
        }
    }
}
