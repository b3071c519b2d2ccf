//! Stub backend used when endpoint or key is missing

use async_trait::async_trait;

use crate::client::{Backend, IdentityApi, QueryApi};
use crate::error::BackendError;
use crate::events::{AuthEvents, AuthSubscription};
use crate::types::{QueryRequest, Session};
use crate::Result;

/// Answers every call with [`BackendError::ConfigMissing`]
///
/// Calls resolve immediately; subscriptions stay open but never deliver.
#[derive(Debug, Default)]
pub struct UnconfiguredBackend {
    events: AuthEvents,
}

impl UnconfiguredBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityApi for UnconfiguredBackend {
    async fn get_session(&self) -> Result<Option<Session>> {
        Err(BackendError::ConfigMissing)
    }

    async fn sign_in_with_password(&self, _email: &str, _password: &str) -> Result<Option<Session>> {
        Err(BackendError::ConfigMissing)
    }

    async fn sign_up(&self, _email: &str, _password: &str) -> Result<Option<Session>> {
        Err(BackendError::ConfigMissing)
    }

    async fn sign_out(&self) -> Result<()> {
        Err(BackendError::ConfigMissing)
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        self.events.subscribe()
    }
}

#[async_trait]
impl QueryApi for UnconfiguredBackend {
    async fn select(&self, _request: &QueryRequest) -> Result<Vec<serde_json::Value>> {
        Err(BackendError::ConfigMissing)
    }
}

impl Backend for UnconfiguredBackend {
    fn is_configured(&self) -> bool {
        false
    }
}
