//! Remote backend seam used when draining the sync queue

use crate::domain::{SyncAction, SyncOperation};
use crate::error::{Result, VaultError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Applies one coalesced mutation to the remote database
pub trait RemoteBackend {
    fn apply(&self, action: &SyncAction) -> Result<()>;
}

/// Loopback backend that keeps the "remote" copy in a local JSON document,
/// keyed by `{entity type}/{entity id}`
#[derive(Debug, Clone)]
pub struct FileRemote {
    path: PathBuf,
}

impl FileRemote {
    pub fn new(path: PathBuf) -> Self {
        FileRemote { path }
    }

    pub fn load(&self) -> Result<BTreeMap<String, Value>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(VaultError::Io(e)),
        }
    }
}

impl RemoteBackend for FileRemote {
    fn apply(&self, action: &SyncAction) -> Result<()> {
        let mut rows = self.load()?;
        let key = format!(
            "{}/{}",
            action.entity.entity_type(),
            action.entity.entity_id()
        );

        match action.operation {
            SyncOperation::Create | SyncOperation::Update => {
                rows.insert(key, serde_json::to_value(&action.entity)?);
            }
            SyncOperation::Delete => {
                rows.remove(&key);
            }
        }

        fs::write(&self.path, serde_json::to_string_pretty(&rows)?)
            .map_err(|e| VaultError::Sync(format!("remote write failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Note, SyncEntity};
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_file_remote_upsert_and_delete() {
        let temp = TempDir::new().unwrap();
        let remote = FileRemote::new(temp.path().join("remote.json"));
        let entity = SyncEntity::Note(Note::new("n1", "u1", "x", "", Utc::now()));

        remote
            .apply(&SyncAction {
                operation: SyncOperation::Create,
                entity: entity.clone(),
            })
            .unwrap();
        assert!(remote.load().unwrap().contains_key("note/n1"));

        remote
            .apply(&SyncAction {
                operation: SyncOperation::Delete,
                entity,
            })
            .unwrap();
        assert!(remote.load().unwrap().is_empty());
    }
}
