//! Storage for quiz autosave snapshots

use crate::domain::quiz::validate_quiz_id;
use crate::domain::QuizSnapshot;
use crate::error::{Result, VaultError};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Keyed by quiz id; saving overwrites the previous snapshot.
pub trait SnapshotStorage: Send + Sync {
    fn save(&self, snapshot: &QuizSnapshot) -> Result<()>;
    fn load(&self, quiz_id: &str) -> Result<Option<QuizSnapshot>>;
    /// Returns whether a snapshot existed
    fn remove(&self, quiz_id: &str) -> Result<bool>;
}

/// One `quiz_autosave_<id>.json` file per quiz
#[derive(Debug, Clone)]
pub struct FileSnapshotStorage {
    dir: PathBuf,
}

impl FileSnapshotStorage {
    pub fn new(dir: PathBuf) -> Self {
        FileSnapshotStorage { dir }
    }

    fn path_for(&self, quiz_id: &str) -> Result<PathBuf> {
        validate_quiz_id(quiz_id)?;
        Ok(self.dir.join(format!("quiz_autosave_{}.json", quiz_id)))
    }
}

impl SnapshotStorage for FileSnapshotStorage {
    fn save(&self, snapshot: &QuizSnapshot) -> Result<()> {
        let path = self.path_for(&snapshot.quiz_id)?;
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }

        // Replace via rename so a failed write leaves the previous snapshot intact
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_string_pretty(snapshot)?)?;
        if cfg!(windows) && path.exists() {
            fs::remove_file(&path)?;
        }
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn load(&self, quiz_id: &str) -> Result<Option<QuizSnapshot>> {
        let path = self.path_for(quiz_id)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VaultError::Io(e)),
        }
    }

    fn remove(&self, quiz_id: &str) -> Result<bool> {
        let path = self.path_for(quiz_id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(VaultError::Io(e)),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemorySnapshotStorage {
    snapshots: Mutex<HashMap<String, QuizSnapshot>>,
    failing: Mutex<bool>,
}

impl MemorySnapshotStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent saves fail, to exercise the error status
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap_or_else(|e| e.into_inner()) = failing;
    }
}

impl SnapshotStorage for MemorySnapshotStorage {
    fn save(&self, snapshot: &QuizSnapshot) -> Result<()> {
        if *self.failing.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(VaultError::Io(std::io::Error::other("snapshot storage full")));
        }
        validate_quiz_id(&snapshot.quiz_id)?;
        self.snapshots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(snapshot.quiz_id.clone(), snapshot.clone());
        Ok(())
    }

    fn load(&self, quiz_id: &str) -> Result<Option<QuizSnapshot>> {
        Ok(self
            .snapshots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(quiz_id)
            .cloned())
    }

    fn remove(&self, quiz_id: &str) -> Result<bool> {
        Ok(self
            .snapshots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(quiz_id)
            .is_some())
    }
}
