//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] leadline_storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Call error: {0}")]
    Dial(#[from] crate::dial::DialError),

    #[error("CRM not initialized")]
    NotInitialized,
}
