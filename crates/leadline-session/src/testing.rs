//! Scripted backend for session tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use leadline_backend::{
    AuthEvent, AuthEvents, AuthSubscription, Backend, BackendError, IdentityApi, QueryApi,
    QueryRequest, Session, User,
};

pub(crate) fn sample_session(user_id: &str) -> Session {
    Session {
        access_token: format!("{user_id}-access"),
        refresh_token: format!("{user_id}-refresh"),
        token_type: "bearer".to_string(),
        expires_in: Some(3600),
        expires_at: None,
        user: User {
            id: user_id.to_string(),
            email: Some(format!("{user_id}@example.com")),
        },
    }
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    pub events: AuthEvents,
    stored: Mutex<Option<Session>>,
    calls: Mutex<Vec<&'static str>>,
    restore_gate: Mutex<Option<Arc<Notify>>>,
    restore_fails: AtomicBool,
    sign_out_fails: AtomicBool,
    sign_in_error: Mutex<Option<String>>,
}

impl FakeBackend {
    pub fn with_stored(session: Session) -> Self {
        let backend = Self::default();
        *backend.stored.lock() = Some(session);
        backend
    }

    /// Hold `get_session` until the gate is notified
    pub fn gate_restore(&self, gate: Arc<Notify>) {
        *self.restore_gate.lock() = Some(gate);
    }

    pub fn fail_restore(&self) {
        self.restore_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_sign_out(&self) {
        self.sign_out_fails.store(true, Ordering::SeqCst);
    }

    pub fn reject_sign_in(&self, message: &str) {
        *self.sign_in_error.lock() = Some(message.to_string());
    }

    pub fn called(&self, name: &str) -> bool {
        self.call_count(name) > 0
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == name).count()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().push(name);
    }
}

#[async_trait]
impl IdentityApi for FakeBackend {
    async fn get_session(&self) -> leadline_backend::Result<Option<Session>> {
        self.record("get_session");

        let gate = self.restore_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.restore_fails.load(Ordering::SeqCst) {
            return Err(BackendError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(self.stored.lock().clone())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        _password: &str,
    ) -> leadline_backend::Result<Option<Session>> {
        self.record("sign_in");

        let rejection = self.sign_in_error.lock().clone();
        if let Some(message) = rejection {
            return Err(BackendError::Api {
                status: 400,
                message,
            });
        }

        let session = sample_session(email);
        *self.stored.lock() = Some(session.clone());
        self.events.publish(AuthEvent::signed_in(session.clone()));
        Ok(Some(session))
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> leadline_backend::Result<Option<Session>> {
        self.record("sign_up");
        Ok(None)
    }

    async fn sign_out(&self) -> leadline_backend::Result<()> {
        self.record("sign_out");
        *self.stored.lock() = None;
        self.events.publish(AuthEvent::signed_out());

        if self.sign_out_fails.load(Ordering::SeqCst) {
            return Err(BackendError::Api {
                status: 500,
                message: "logout failed".to_string(),
            });
        }
        Ok(())
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        self.events.subscribe()
    }
}

#[async_trait]
impl QueryApi for FakeBackend {
    async fn select(&self, _request: &QueryRequest) -> leadline_backend::Result<Vec<serde_json::Value>> {
        self.record("select");
        Ok(Vec::new())
    }
}

impl Backend for FakeBackend {
    fn is_configured(&self) -> bool {
        true
    }
}
