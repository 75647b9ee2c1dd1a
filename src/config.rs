//! Server configuration stored in ~/.dailyops/config.json
//!
//! CLI flags and `DAILYOPS_*` environment variables override the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

const DEFAULT_DATABASE_URL: &str = "sqlite://./dailyops.db?mode=rwc";

/// Persistent server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// sea-orm connection string (sqlite or postgres)
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub enable_cors: bool,
    /// Allowed CORS origins; `None` allows any localhost port
    pub cors_origins: Option<Vec<String>>,
    /// Detail rows per rollup category
    pub rollup_detail_limit: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            enable_cors: true,
            cors_origins: None,
            rollup_detail_limit: dailyops_api::DEFAULT_DETAIL_LIMIT,
        }
    }
}

/// Mask the password in a database URL so it can be logged
pub fn redacted_database_url(database_url: &str) -> String {
    match url::Url::parse(database_url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            if parsed.set_password(Some("****")).is_err() {
                return "<redacted>".to_string();
            }
            parsed.to_string()
        }
        _ => database_url.to_string(),
    }
}

/// Configuration manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Failed to get home directory")?;
        Ok(home.join(".dailyops").join("config.json"))
    }

    /// Load the configuration from the default location
    pub fn load() -> Result<ServerConfig> {
        Self::load_from(&Self::config_path()?)
    }

    /// Save the configuration to the default location
    pub fn save(config: &ServerConfig) -> Result<()> {
        Self::save_to(config, &Self::config_path()?)
    }

    /// Load a config file, falling back to defaults when it is missing
    pub fn load_from(path: &Path) -> Result<ServerConfig> {
        if !path.exists() {
            return Ok(ServerConfig::default());
        }

        let json =
            fs::read_to_string(path).context(format!("Failed to read config file: {:?}", path))?;

        let config: ServerConfig = serde_json::from_str(&json)
            .context(format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    pub fn save_to(config: &ServerConfig, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create config directory: {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(path, json).context(format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }
}
