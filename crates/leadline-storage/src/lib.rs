//! Leadline Storage Layer
//!
//! On-device persistence for the CRM client:
//! - SQLite database with versioned migrations
//! - Secure key-value items (auth tokens, device preferences)
//! - The remember-device flag consulted at session start-up

mod database;
mod error;
mod migrations;
mod remember;
mod secure;

pub use database::Database;
pub use error::StorageError;
pub use remember::{RememberDevice, REMEMBER_DEVICE_KEY};
pub use secure::{MemorySecureStore, SecureStore, SqliteSecureStore};

pub type Result<T> = std::result::Result<T, StorageError>;
