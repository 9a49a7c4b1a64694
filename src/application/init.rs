//! Initialize vault use case

use crate::domain::SystemClock;
use crate::error::Result;
use crate::infrastructure::{Config, FileSystemRepository, VaultRepository};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Initialize a new vault at the specified path.
pub fn init(path: &Path, user_id: Option<String>) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }

    let repo = FileSystemRepository::new(path.to_path_buf());
    repo.initialize()?;

    let config = Config::new(user_id);
    repo.save_config(&config)?;

    // Create the partition files up front so a broken store shows up now
    repo.open_store(Arc::new(SystemClock))?;

    println!("Initialized studyvault at {}", repo.root().display());
    println!("User: {}", config.user_id);

    Ok(())
}
