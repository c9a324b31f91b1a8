//! Explicit handling for best-effort results.

use std::fmt::Display;

/// Log a failure and carry on.
///
/// Used where a failure is expected and must not propagate, e.g. a logout
/// request against an already dead session or a garbled push message.
pub trait LogIgnore<T, E> {
    /// Log the error at `warn` with `what` as context and hand it back.
    fn log_ignore(self, what: &str) -> Option<E>;

    /// Keep the value; log the error at `warn` and drop it.
    fn ok_or_log(self, what: &str) -> Option<T>;
}

impl<T, E: Display> LogIgnore<T, E> for Result<T, E> {
    fn log_ignore(self, what: &str) -> Option<E> {
        match self {
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "{what} failed, ignoring");
                Some(e)
            }
        }
    }

    fn ok_or_log(self, what: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "{what} failed, dropping");
                None
            }
        }
    }
}
