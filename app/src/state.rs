//! Application state management
use leadline_core::{Config, CoreError, Crm, Result};
use parking_lot::RwLock;
use std::sync::Arc;

/// Thread-safe application state wrapper
pub struct AppState {
    crm: RwLock<Option<Arc<Crm>>>,
}

impl AppState {
    pub fn new() -> Result<Self> {
        let config = Config::default();
        let crm = Crm::new(config)?;
        Ok(Self::from_crm(crm))
    }

    pub fn from_crm(crm: Crm) -> Self {
        Self {
            crm: RwLock::new(Some(Arc::new(crm))),
        }
    }

    pub async fn initialize(&self) -> Result<()> {
        self.crm()?.initialize().await;
        Ok(())
    }

    pub fn crm(&self) -> Result<Arc<Crm>> {
        self.crm.read().clone().ok_or(CoreError::NotInitialized)
    }

    /// Tear the CRM down; later commands fail with `NotInitialized`
    pub fn shutdown(&self) {
        if let Some(crm) = self.crm.write().take() {
            crm.shutdown();
        }
    }
}
