//! Session state as seen by views
//!
//! ```text
//! Uninitialized
//!   ↓ start
//! Checking
//!   ↓ restore finished
//! Authenticated ⇄ Anonymous
//! ```

use serde::{Deserialize, Serialize};

use leadline_backend::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Uninitialized,
    Checking,
    Authenticated,
    Anonymous,
}

impl SessionPhase {
    pub fn can_transition_to(&self, target: SessionPhase) -> bool {
        match (self, target) {
            (SessionPhase::Uninitialized, SessionPhase::Checking) => true,
            (SessionPhase::Checking, SessionPhase::Authenticated) => true,
            (SessionPhase::Checking, SessionPhase::Anonymous) => true,
            (SessionPhase::Authenticated, SessionPhase::Anonymous) => true,
            (SessionPhase::Anonymous, SessionPhase::Authenticated) => true,
            (a, b) if *a == b => true,
            _ => false,
        }
    }

    /// Phase a finished restore settles in
    pub fn settled(session: Option<&Session>) -> Self {
        if session.is_some() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Uninitialized => "uninitialized",
            SessionPhase::Checking => "checking",
            SessionPhase::Authenticated => "authenticated",
            SessionPhase::Anonymous => "anonymous",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What views read: the held session and whether start-up is still running
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub session: Option<Session>,
    pub loading: bool,
}

impl SessionState {
    pub fn initial() -> Self {
        Self {
            session: None,
            loading: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Start-up is over and nobody is signed in
    pub fn needs_sign_in(&self) -> bool {
        self.session.is_none() && !self.loading
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(SessionPhase::Uninitialized.can_transition_to(SessionPhase::Checking));
        assert!(SessionPhase::Checking.can_transition_to(SessionPhase::Authenticated));
        assert!(SessionPhase::Checking.can_transition_to(SessionPhase::Anonymous));
        assert!(SessionPhase::Authenticated.can_transition_to(SessionPhase::Anonymous));
        assert!(SessionPhase::Anonymous.can_transition_to(SessionPhase::Authenticated));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!SessionPhase::Uninitialized.can_transition_to(SessionPhase::Authenticated));
        assert!(!SessionPhase::Authenticated.can_transition_to(SessionPhase::Checking));
        assert!(!SessionPhase::Anonymous.can_transition_to(SessionPhase::Uninitialized));
    }

    #[test]
    fn test_needs_sign_in() {
        let mut state = SessionState::initial();
        assert!(!state.needs_sign_in());

        state.loading = false;
        assert!(state.needs_sign_in());
        assert!(!state.is_authenticated());
    }
}
