//! Leadline Session Management
//!
//! - The session is restored once per process, gated by the remember-device flag
//! - A device that opted out never exposes a restored session
//! - Auth-state notifications replace the held session, last writer wins
//! - Teardown stops all further updates
//! - Sign-in, sign-up and sign-out report their own error message and never fail the app

mod actions;
mod manager;
mod state;

#[cfg(test)]
mod testing;

pub use actions::{AuthActions, MISSING_CONFIG_MESSAGE};
pub use manager::SessionManager;
pub use state::{SessionPhase, SessionState};
