//! Remember-device flag
//!
//! A single boolean deciding whether a restored session may be kept after
//! the app restarts. Persistence is best-effort: a failed write is dropped
//! and a failed read answers `true`, so a fresh install stays signed in.

use std::sync::Arc;

use crate::secure::SecureStore;

/// Key under which the flag is stored
pub const REMEMBER_DEVICE_KEY: &str = "remember_me";

#[derive(Clone)]
pub struct RememberDevice {
    store: Arc<dyn SecureStore>,
}

impl RememberDevice {
    pub fn new(store: Arc<dyn SecureStore>) -> Self {
        Self { store }
    }

    pub fn set_remember_device(&self, value: bool) {
        let raw = if value { "true" } else { "false" };
        if let Err(e) = self.store.set_item(REMEMBER_DEVICE_KEY, raw) {
            tracing::debug!(error = %e, "Dropped remember-device write");
        }
    }

    pub fn get_remember_device(&self) -> bool {
        match self.store.get_item(REMEMBER_DEVICE_KEY) {
            Ok(Some(raw)) => raw != "false",
            Ok(None) => true,
            Err(e) => {
                tracing::debug!(error = %e, "Remember-device read failed, assuming true");
                true
            }
        }
    }
}
