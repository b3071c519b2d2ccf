//! Backend configuration resolver
//!
//! Endpoint and anon key come from the process environment first, then from
//! the `extra` object of the bundled app configuration. The first non-empty
//! value wins. With either one missing the app runs against
//! [`UnconfiguredBackend`] instead of failing.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use leadline_storage::SecureStore;

use crate::client::Backend;
use crate::supabase::SupabaseClient;
use crate::unconfigured::UnconfiguredBackend;

pub const URL_ENV: &str = "SUPABASE_URL";
pub const ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";

const URL_EXTRA: &str = "supabaseUrl";
const ANON_KEY_EXTRA: &str = "supabaseAnonKey";

/// Values bundled with the app build
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppExtras {
    #[serde(default)]
    extra: HashMap<String, serde_json::Value>,
}

impl AppExtras {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load extras from a JSON file. A missing or malformed file yields no
    /// extras.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not read app config");
                return Self::default();
            }
        };

        Self::from_json(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed app config");
            Self::default()
        })
    }

    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.extra
            .insert(key.to_string(), serde_json::Value::String(value.to_string()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }
}

/// API key that never shows up in logs
#[derive(Clone, PartialEq, Eq)]
pub struct AnonKey(String);

impl AnonKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AnonKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AnonKey(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: Option<String>,
    pub anon_key: Option<AnonKey>,
}

impl BackendConfig {
    /// Resolve from the process environment and bundled extras
    pub fn resolve(extras: &AppExtras) -> Self {
        Self::resolve_with(|name| std::env::var(name).ok(), extras)
    }

    pub fn resolve_with<F>(env: F, extras: &AppExtras) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = first_non_empty(env(URL_ENV), extras.get(URL_EXTRA)).filter(|raw| {
            let valid = is_http_url(raw);
            if !valid {
                tracing::warn!(url = %raw, "Ignoring backend URL that is not an http(s) URL");
            }
            valid
        });
        let anon_key = first_non_empty(env(ANON_KEY_ENV), extras.get(ANON_KEY_EXTRA)).map(AnonKey);

        let config = Self { url, anon_key };

        if config.has_config() {
            tracing::info!(url = ?config.url, "Backend configuration found");
        } else {
            tracing::warn!(
                url_present = config.url.is_some(),
                key_present = config.anon_key.is_some(),
                "Backend configuration missing, running unconfigured"
            );
        }

        config
    }

    pub fn has_config(&self) -> bool {
        self.url.is_some() && self.anon_key.is_some()
    }

    /// Build the backend this configuration selects
    pub fn connect(&self, store: Arc<dyn SecureStore>) -> Arc<dyn Backend> {
        match (&self.url, &self.anon_key) {
            (Some(url), Some(key)) => Arc::new(SupabaseClient::new(url, key.clone(), store)),
            _ => Arc::new(UnconfiguredBackend::new()),
        }
    }
}

fn first_non_empty(env_value: Option<String>, extra_value: Option<&str>) -> Option<String> {
    env_value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            extra_value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
}

fn is_http_url(raw: &str) -> bool {
    url::Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}
