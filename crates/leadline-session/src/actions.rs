//! Sign-in, sign-up and sign-out as triggered from the profile screen
//!
//! Each call returns the error message for that call only, or `None` on
//! success. The new session itself arrives through the session manager's
//! auth-state subscription.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use leadline_backend::{Backend, BackendError};
use leadline_storage::RememberDevice;

pub const MISSING_CONFIG_MESSAGE: &str = "Missing backend configuration.";

#[derive(Clone)]
pub struct AuthActions {
    backend: Arc<dyn Backend>,
    remember: RememberDevice,
    busy: Arc<AtomicBool>,
}

/// Marks an action as running until dropped
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl AuthActions {
    pub fn new(backend: Arc<dyn Backend>, remember: RememberDevice) -> Self {
        Self {
            backend,
            remember,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Persist the remember-device choice, then sign in
    pub async fn sign_in(&self, email: &str, password: &str, remember: bool) -> Option<String> {
        if !self.backend.is_configured() {
            return Some(MISSING_CONFIG_MESSAGE.to_string());
        }

        let _busy = BusyGuard::enter(&self.busy);
        self.remember.set_remember_device(remember);

        let result = self.backend.sign_in_with_password(email, password).await;
        report("sign-in", result.map(|_| ()))
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Option<String> {
        if !self.backend.is_configured() {
            return Some(MISSING_CONFIG_MESSAGE.to_string());
        }

        let _busy = BusyGuard::enter(&self.busy);
        let result = self.backend.sign_up(email, password).await;
        report("sign-up", result.map(|_| ()))
    }

    pub async fn sign_out(&self) -> Option<String> {
        if !self.backend.is_configured() {
            return Some(MISSING_CONFIG_MESSAGE.to_string());
        }

        let _busy = BusyGuard::enter(&self.busy);
        let result = self.backend.sign_out().await;
        report("sign-out", result)
    }

    /// Toggle from the account card; takes effect at the next start-up
    pub fn set_remember_device(&self, value: bool) {
        self.remember.set_remember_device(value);
    }

    pub fn remember_device(&self) -> bool {
        self.remember.get_remember_device()
    }

    /// An action is in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

fn report(action: &str, result: leadline_backend::Result<()>) -> Option<String> {
    match result {
        Ok(()) => None,
        Err(e) => {
            if matches!(e, BackendError::Network(_)) {
                tracing::error!(action, error = %e, "Auth request could not reach the backend");
            } else {
                tracing::warn!(action, error = %e, "Auth request rejected");
            }
            Some(e.user_message())
        }
    }
}
