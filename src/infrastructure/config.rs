//! Configuration management

use crate::error::{Result, VaultError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const VAULT_DIR: &str = ".studyvault";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    /// Quiet period after the last answer change before a save
    pub debounce_ms: u64,
    /// Forced save period while changes are pending
    pub interval_secs: u64,
    /// Emit a progress notice every this many answered questions
    pub notify_every: usize,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        AutosaveConfig {
            debounce_ms: 2000,
            interval_secs: 30,
            notify_every: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub default_ttl_minutes: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            default_ttl_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub user_id: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub autosave: AutosaveConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Create a new config with default values
    pub fn new(user_id: Option<String>) -> Self {
        Config {
            user_id: user_id.unwrap_or_else(Self::detect_default_user),
            created: Utc::now(),
            autosave: AutosaveConfig::default(),
            cache: CacheConfig::default(),
        }
    }

    /// Load config from .studyvault/config.toml in the given directory
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let config_path = path.join(VAULT_DIR).join("config.toml");

        let contents = fs::read_to_string(&config_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                VaultError::NotVaultDirectory(path.to_path_buf())
            } else {
                VaultError::Io(e)
            }
        })?;

        toml::from_str(&contents)
            .map_err(|e| VaultError::Config(format!("Failed to parse config.toml: {}", e)))
    }

    /// Save config to .studyvault/config.toml in the given directory
    pub fn save_to_dir(&self, path: &Path) -> Result<()> {
        let vault_dir = path.join(VAULT_DIR);
        let config_path = vault_dir.join("config.toml");

        if !vault_dir.exists() {
            fs::create_dir(&vault_dir)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| VaultError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, contents)?;

        Ok(())
    }

    /// Active user, with STUDYVAULT_USER taking precedence over the stored value
    pub fn get_user_id(&self) -> String {
        std::env::var("STUDYVAULT_USER").unwrap_or_else(|_| self.user_id.clone())
    }

    fn detect_default_user() -> String {
        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "local".to_string())
    }
}
