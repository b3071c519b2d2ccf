//! Application configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "LEADLINE_DATA_DIR";
pub const APP_CONFIG_ENV: &str = "LEADLINE_APP_CONFIG";

/// Rows fetched per list view
pub const DEFAULT_PAGE_SIZE: usize = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the database
    pub data_dir: PathBuf,
    /// Path to the database file
    pub database_path: PathBuf,
    /// Bundled app configuration carrying backend extras
    pub app_config_path: PathBuf,
    pub page_size: usize,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        let app_config_path = std::env::var(APP_CONFIG_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("app.json"));

        Self {
            database_path: data_dir.join("leadline.db"),
            app_config_path,
            data_dir,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// `LEADLINE_DATA_DIR`, else the platform local data directory
    pub fn data_dir() -> PathBuf {
        Self::data_dir_from(std::env::var(DATA_DIR_ENV).ok())
    }

    fn data_dir_from(override_dir: Option<String>) -> PathBuf {
        if let Some(dir) = override_dir.filter(|d| !d.trim().is_empty()) {
            return PathBuf::from(dir);
        }

        dirs::data_local_dir()
            .map(|d| d.join("Leadline"))
            .unwrap_or_else(|| PathBuf::from(".leadline"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}
