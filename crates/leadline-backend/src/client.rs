//! Backend capability traits
//!
//! The session manager and the list views depend on these traits only, so
//! any backend offering the same surface can be swapped in, including test
//! doubles.

use async_trait::async_trait;

use crate::events::AuthSubscription;
use crate::types::{QueryRequest, Session};
use crate::Result;

#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Last known session, restoring and refreshing it if needed
    async fn get_session(&self) -> Result<Option<Session>>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Option<Session>>;

    /// Register a new account. Resolves to `None` while the email awaits
    /// confirmation.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>>;

    async fn sign_out(&self) -> Result<()>;

    /// Subscribe to auth-state changes published from now on
    fn on_auth_state_change(&self) -> AuthSubscription;
}

#[async_trait]
pub trait QueryApi: Send + Sync {
    /// Rows of `request.table`, as returned by the backend
    async fn select(&self, request: &QueryRequest) -> Result<Vec<serde_json::Value>>;
}

pub trait Backend: IdentityApi + QueryApi {
    /// False for the stub selected when configuration is missing
    fn is_configured(&self) -> bool;
}
