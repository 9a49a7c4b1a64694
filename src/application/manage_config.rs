//! Config management use case

use crate::error::{Result, VaultError};
use crate::infrastructure::{Config, FileSystemRepository, VaultRepository};
use std::str::FromStr;

const VALID_KEYS: &str = "user, debounce_ms, interval_secs, notify_every, cache_ttl, created";

/// Service for managing vault configuration
pub struct ConfigService {
    repository: FileSystemRepository,
}

impl ConfigService {
    /// Create a new config service
    pub fn new(repository: FileSystemRepository) -> Self {
        ConfigService { repository }
    }

    /// Get a single config value
    pub fn get(&self, key: &str) -> Result<String> {
        let config = self.repository.load_config()?;

        match key {
            "user" => Ok(config.user_id.clone()),
            "debounce_ms" => Ok(config.autosave.debounce_ms.to_string()),
            "interval_secs" => Ok(config.autosave.interval_secs.to_string()),
            "notify_every" => Ok(config.autosave.notify_every.to_string()),
            "cache_ttl" => Ok(config.cache.default_ttl_minutes.to_string()),
            "created" => Ok(config.created.to_rfc3339()),
            _ => Err(VaultError::Config(format!(
                "Unknown config key: '{}'. Valid keys are: {}",
                key, VALID_KEYS
            ))),
        }
    }

    /// Set a config value
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut config = self.repository.load_config()?;

        match key {
            "user" => {
                if value.trim().is_empty() {
                    return Err(VaultError::Config("User id cannot be empty".to_string()));
                }
                config.user_id = value.to_string();
            }
            "debounce_ms" => config.autosave.debounce_ms = parse_number(key, value)?,
            "interval_secs" => {
                let secs: u64 = parse_number(key, value)?;
                if secs == 0 {
                    return Err(VaultError::Config(
                        "interval_secs must be at least 1".to_string(),
                    ));
                }
                config.autosave.interval_secs = secs;
            }
            "notify_every" => config.autosave.notify_every = parse_number(key, value)?,
            "cache_ttl" => config.cache.default_ttl_minutes = parse_number(key, value)?,
            "created" => {
                return Err(VaultError::Config(
                    "Cannot modify 'created' field (read-only)".to_string(),
                ));
            }
            _ => {
                return Err(VaultError::Config(format!(
                    "Unknown config key: '{}'. Valid keys are: {}",
                    key, VALID_KEYS
                )));
            }
        }

        self.repository.save_config(&config)?;
        Ok(())
    }

    /// List all config values
    pub fn list(&self) -> Result<Config> {
        self.repository.load_config()
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        VaultError::Config(format!(
            "Invalid value for '{}': '{}' is not a non-negative number",
            key, value
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service() -> (TempDir, ConfigService) {
        let temp = TempDir::new().unwrap();
        let repo = FileSystemRepository::new(temp.path().to_path_buf());
        repo.initialize().unwrap();
        repo.save_config(&Config::new(Some("u1".to_string())))
            .unwrap();
        (temp, ConfigService::new(repo))
    }

    #[test]
    fn test_get_and_set_values() {
        let (_temp, service) = service();
        assert_eq!(service.get("user").unwrap(), "u1");
        assert_eq!(service.get("cache_ttl").unwrap(), "60");

        service.set("cache_ttl", "15").unwrap();
        service.set("user", "u2").unwrap();
        assert_eq!(service.get("cache_ttl").unwrap(), "15");
        assert_eq!(service.list().unwrap().user_id, "u2");
    }

    #[test]
    fn test_rejects_bad_values() {
        let (_temp, service) = service();
        assert!(service.set("debounce_ms", "soon").is_err());
        assert!(service.set("interval_secs", "0").is_err());
        assert!(service.set("created", "2020-01-01").is_err());
        match service.get("colour").unwrap_err() {
            VaultError::Config(msg) => assert!(msg.contains("Unknown config key")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }
}
