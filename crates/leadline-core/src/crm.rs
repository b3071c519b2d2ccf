//! Main CRM state container

use std::sync::Arc;

use leadline_backend::{AppExtras, Backend, BackendConfig};
use leadline_session::{AuthActions, SessionManager, SessionState};
use leadline_storage::{Database, RememberDevice, SecureStore, SqliteSecureStore};

use crate::config::Config;
use crate::dial::{place_call, DialError, Dialer};
use crate::views::{leads_query, tasks_query, Lead, ListView, Task, ViewState};
use crate::Result;

/// One instance per process. Owns the backend client and hands the same
/// instance to the session manager and every view.
pub struct Crm {
    config: Config,
    backend: Arc<dyn Backend>,
    session_manager: SessionManager,
    auth: AuthActions,
    leads: ListView<Lead>,
    tasks: ListView<Task>,
}

impl Crm {
    /// Open local storage and connect to the configured backend
    pub fn new(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let db = Database::open(&config.database_path)?;
        let store: Arc<dyn SecureStore> = Arc::new(SqliteSecureStore::new(db));

        let extras = AppExtras::load(&config.app_config_path);
        let backend = BackendConfig::resolve(&extras).connect(Arc::clone(&store));

        Ok(Self::with_backend(config, backend, store))
    }

    pub fn with_backend(
        config: Config,
        backend: Arc<dyn Backend>,
        store: Arc<dyn SecureStore>,
    ) -> Self {
        let remember = RememberDevice::new(store);
        let session_manager = SessionManager::new(Arc::clone(&backend), remember.clone());
        let auth = AuthActions::new(Arc::clone(&backend), remember);
        let leads = ListView::new(Arc::clone(&backend), leads_query(config.page_size));
        let tasks = ListView::new(Arc::clone(&backend), tasks_query(config.page_size));

        Self {
            config,
            backend,
            session_manager,
            auth,
            leads,
            tasks,
        }
    }

    /// Restore the session; resolves once `loading` is cleared
    pub async fn initialize(&self) -> SessionState {
        let state = self.session_manager.start().await;
        tracing::info!(
            configured = self.has_config(),
            signed_in = state.is_authenticated(),
            "CRM initialized"
        );
        state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn has_config(&self) -> bool {
        self.backend.is_configured()
    }

    pub fn session_manager(&self) -> &SessionManager {
        &self.session_manager
    }

    pub fn session_state(&self) -> SessionState {
        self.session_manager.state()
    }

    pub fn auth(&self) -> &AuthActions {
        &self.auth
    }

    pub async fn leads(&self) -> ViewState<Lead> {
        let session = self.session_manager.session();
        self.leads.load(session.as_ref()).await
    }

    pub async fn tasks(&self) -> ViewState<Task> {
        let session = self.session_manager.session();
        self.tasks.load(session.as_ref()).await
    }

    pub fn call(&self, phone: Option<&str>, dialer: &dyn Dialer) -> std::result::Result<String, DialError> {
        place_call(phone, dialer)
    }

    pub fn shutdown(&self) {
        self.session_manager.teardown();
        tracing::info!("CRM shut down");
    }
}
