//! Session gating for live feed clients.
//!
//! Provides:
//! - `SessionGate` - Authentication state with login/logout/refresh
//! - `RouteGuard` - Allow/redirect decisions per navigation
//! - Navigator implementations (memory)

pub mod gate;
pub mod guard;
pub mod navigation;

pub use gate::{Session, SessionGate};
pub use guard::{HOME_PATH, LOGIN_PATH, RouteGuard, Verdict, decide};
