//! Vault directory discovery and layout

use crate::domain::Clock;
use crate::error::{Result, VaultError};
use crate::infrastructure::config::{Config, VAULT_DIR};
use crate::infrastructure::engine::FileEngine;
use crate::infrastructure::offline_store::OfflineStore;
use crate::infrastructure::snapshot_storage::FileSnapshotStorage;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Abstract repository for vault operations
pub trait VaultRepository {
    /// Get the root directory of this vault
    fn root(&self) -> &Path;

    /// Load configuration from .studyvault/config.toml
    fn load_config(&self) -> Result<Config>;

    /// Save configuration to .studyvault/config.toml
    fn save_config(&self, config: &Config) -> Result<()>;

    /// Check if .studyvault directory exists
    fn is_initialized(&self) -> bool;

    /// Create .studyvault directory structure
    fn initialize(&self) -> Result<()>;
}

/// File system implementation of VaultRepository
#[derive(Debug, Clone)]
pub struct FileSystemRepository {
    pub root: PathBuf,
}

impl FileSystemRepository {
    /// Create a new repository with the given root directory
    pub fn new(root: PathBuf) -> Self {
        FileSystemRepository { root }
    }

    /// Discover vault root by walking up from current directory
    /// First checks STUDYVAULT_ROOT environment variable, then falls back to discovery
    pub fn discover() -> Result<Self> {
        if let Ok(root_path) = std::env::var("STUDYVAULT_ROOT") {
            let path = PathBuf::from(root_path);
            if Self::has_vault_dir(&path) {
                return Ok(FileSystemRepository::new(path));
            } else {
                return Err(VaultError::Config(format!(
                    "STUDYVAULT_ROOT is set to '{}' but no .studyvault directory found. \
                    Run 'studyvault init' in that directory or unset STUDYVAULT_ROOT.",
                    path.display()
                )));
            }
        }

        let current_dir = std::env::current_dir()?;
        Self::discover_from(&current_dir)
    }

    /// Discover vault root by walking up from a specific starting directory
    pub fn discover_from(start: &Path) -> Result<Self> {
        let mut current = start.to_path_buf();

        loop {
            if Self::has_vault_dir(&current) {
                return Ok(FileSystemRepository::new(current));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Err(VaultError::NotVaultDirectory(start.to_path_buf())),
            }
        }
    }

    fn has_vault_dir(path: &Path) -> bool {
        path.join(VAULT_DIR).is_dir()
    }

    fn vault_dir(&self) -> PathBuf {
        self.root.join(VAULT_DIR)
    }

    pub fn store_dir(&self) -> PathBuf {
        self.vault_dir().join("store")
    }

    pub fn autosave_dir(&self) -> PathBuf {
        self.vault_dir().join("autosave")
    }

    /// Document the loopback backend writes confirmed mutations to
    pub fn remote_path(&self) -> PathBuf {
        self.vault_dir().join("remote.json")
    }

    /// Build and initialize the offline store over this vault's store directory
    pub fn open_store(&self, clock: Arc<dyn Clock>) -> Result<OfflineStore> {
        let store = OfflineStore::new(Box::new(FileEngine::new(self.store_dir())), clock);
        store.initialize()?;
        Ok(store)
    }

    pub fn snapshot_storage(&self) -> FileSnapshotStorage {
        FileSnapshotStorage::new(self.autosave_dir())
    }
}

impl VaultRepository for FileSystemRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    fn load_config(&self) -> Result<Config> {
        Config::load_from_dir(&self.root)
    }

    fn save_config(&self, config: &Config) -> Result<()> {
        config.save_to_dir(&self.root)
    }

    fn is_initialized(&self) -> bool {
        Self::has_vault_dir(&self.root)
    }

    fn initialize(&self) -> Result<()> {
        let vault_dir = self.vault_dir();

        if vault_dir.exists() {
            return Err(VaultError::Config(format!(
                "Directory already initialized: {}",
                self.root.display()
            )));
        }

        fs::create_dir(&vault_dir)?;
        fs::create_dir(self.store_dir())?;
        fs::create_dir(self.autosave_dir())?;
        Ok(())
    }
}
