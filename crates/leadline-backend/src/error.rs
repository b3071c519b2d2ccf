//! Backend error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Missing backend configuration")]
    ConfigMissing,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Backend error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] leadline_storage::StorageError),
}

impl BackendError {
    /// Text suitable for showing next to the control that triggered the call
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
