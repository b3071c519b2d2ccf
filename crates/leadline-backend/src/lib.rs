//! Leadline Backend
//!
//! The hosted backend as seen by the app: an identity API (password
//! sign-in, sign-up, sign-out, session restore, auth-state notifications)
//! and a table query API. Two implementations share the [`Backend`] trait:
//! the live Supabase client and an unconfigured stub that answers every
//! call with [`BackendError::ConfigMissing`]. [`BackendConfig`] decides
//! which one the app gets.

mod client;
mod config;
mod error;
mod events;
mod supabase;
mod types;
mod unconfigured;

pub use client::{Backend, IdentityApi, QueryApi};
pub use config::{AnonKey, AppExtras, BackendConfig, ANON_KEY_ENV, URL_ENV};
pub use error::BackendError;
pub use events::{AuthEvents, AuthSubscription};
pub use supabase::SupabaseClient;
pub use types::{AuthEvent, AuthEventKind, QueryOrder, QueryRequest, Session, User};
pub use unconfigured::UnconfiguredBackend;

pub type Result<T> = std::result::Result<T, BackendError>;
