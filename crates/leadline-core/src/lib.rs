//! Leadline Core
//!
//! Wires configuration, storage, the backend and the session manager into
//! one [`Crm`] instance, and hosts the lead/task list views and calling.

mod config;
mod crm;
mod dial;
mod error;
mod views;

pub use config::Config;
pub use crm::Crm;
pub use dial::{dial_uri, place_call, DialError, Dialer, SystemDialer};
pub use error::CoreError;
pub use views::{
    format_timestamp, leads_query, tasks_query, Lead, LeadRef, ListView, Task, ViewState,
    MISSING_CONFIG_VIEW_MESSAGE,
};

// Re-export core components
pub use leadline_backend::{
    AppExtras, AuthEvent, AuthEventKind, Backend, BackendConfig, BackendError, QueryRequest,
    Session, UnconfiguredBackend, User,
};
pub use leadline_session::{AuthActions, SessionManager, SessionPhase, SessionState};
pub use leadline_storage::{Database, MemorySecureStore, RememberDevice, SecureStore, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
