//! In-memory navigator.

use std::sync::RwLock;

use feed_sync_core::Navigator;

/// In-memory navigator implementation.
///
/// Useful for tests and headless hosts.
/// Keeps the current path and every redirect in order.
pub struct MemoryNavigator {
    current: RwLock<String>,
    history: RwLock<Vec<String>>,
}

impl MemoryNavigator {
    /// Create a navigator positioned at `path`.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            current: RwLock::new(path.into()),
            history: RwLock::new(Vec::new()),
        }
    }

    /// Every redirect issued so far, oldest first.
    #[must_use]
    pub fn redirects(&self) -> Vec<String> {
        self.history
            .read()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    /// Most recent redirect, if any.
    #[must_use]
    pub fn last_redirect(&self) -> Option<String> {
        self.history.read().ok().and_then(|h| h.last().cloned())
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryNavigator {
    fn redirect_to(&self, path: &str) {
        tracing::debug!(path, "Redirecting");
        if let Ok(mut current) = self.current.write() {
            path.clone_into(&mut *current);
        }
        if let Ok(mut history) = self.history.write() {
            history.push(path.to_string());
        }
    }

    fn current_path(&self) -> String {
        self.current
            .read()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}
