//! Configuration management for ottod.
//!
//! Loads settings from /etc/otto/config.toml (or the path in OTTO_CONFIG)
//! and falls back to defaults when the file is absent or malformed.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Config file path.
pub const CONFIG_PATH: &str = "/etc/otto/config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OttodConfig {
    /// Address the HTTP API binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// SQLite database location.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_listen_addr() -> String {
    "127.0.0.1:7433".to_string()
}

fn default_db_path() -> PathBuf {
    // XDG data dir first, then ~/.local/share, then the system location.
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data).join("otto").join("cases.db")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home)
            .join(".local/share")
            .join("otto")
            .join("cases.db")
    } else {
        PathBuf::from("/var/lib/otto/cases.db")
    }
}

impl Default for OttodConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            db_path: default_db_path(),
        }
    }
}

impl OttodConfig {
    /// Load from disk, warning and falling back to defaults on any problem.
    pub fn load() -> Self {
        let path = std::env::var("OTTO_CONFIG").unwrap_or_else(|_| CONFIG_PATH.to_string());
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", path);
                    config
                }
                Err(e) => {
                    warn!("Invalid config at {}: {} - using defaults", path, e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}
