//! Persistent key-value engines backing the offline store

use crate::domain::Partition;
use crate::error::{Result, VaultError};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

type PartitionMap = BTreeMap<String, Value>;

/// Key-value engine split into fixed partitions.
///
/// Iteration order of `values` is the engine's key order; callers that need a
/// particular order sort the result themselves.
pub trait StorageEngine: Send + Sync {
    /// Create or open every partition. Fails if the engine is unavailable.
    fn open(&self, partitions: &[Partition]) -> Result<()>;

    fn get(&self, partition: Partition, key: &str) -> Result<Option<Value>>;

    /// Insert or overwrite
    fn put(&self, partition: Partition, key: &str, value: Value) -> Result<()>;

    /// Returns whether a value was removed
    fn delete(&self, partition: Partition, key: &str) -> Result<bool>;

    fn values(&self, partition: Partition) -> Result<Vec<Value>>;

    fn count(&self, partition: Partition) -> Result<usize>;

    fn clear(&self, partition: Partition) -> Result<()>;
}

/// Stores each partition as one JSON document in a directory
#[derive(Debug)]
pub struct FileEngine {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileEngine {
    pub fn new(dir: PathBuf) -> Self {
        FileEngine {
            dir,
            write_lock: Mutex::new(()),
        }
    }

    fn partition_path(&self, partition: Partition) -> PathBuf {
        self.dir.join(format!("{}.json", partition.as_str()))
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn load(&self, partition: Partition) -> Result<PartitionMap> {
        let path = self.partition_path(partition);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(PartitionMap::new()),
            Err(e) => return Err(VaultError::Io(e)),
        };
        if contents.trim().is_empty() {
            return Ok(PartitionMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write to a temp file next to the target, then rename into place.
    ///
    /// On Windows, `rename` does not overwrite existing files, so the target is removed first.
    fn store(&self, partition: Partition, map: &PartitionMap) -> Result<()> {
        let path = self.partition_path(partition);
        let tmp_path = path.with_file_name(format!(
            "{}.json.tmp-{}",
            partition.as_str(),
            std::process::id()
        ));

        fs::write(&tmp_path, serde_json::to_string_pretty(map)?)?;

        if cfg!(windows) && path.exists() {
            fs::remove_file(&path)?;
        }

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

impl StorageEngine for FileEngine {
    fn open(&self, partitions: &[Partition]) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            VaultError::StoreUnavailable(format!("{}: {}", self.dir.display(), e))
        })?;

        let _guard = self.lock();
        for partition in partitions {
            if !self.partition_path(*partition).exists() {
                self.store(*partition, &PartitionMap::new())
                    .map_err(|e| VaultError::StoreUnavailable(e.to_string()))?;
            }
        }
        Ok(())
    }

    fn get(&self, partition: Partition, key: &str) -> Result<Option<Value>> {
        Ok(self.load(partition)?.remove(key))
    }

    fn put(&self, partition: Partition, key: &str, value: Value) -> Result<()> {
        let _guard = self.lock();
        let mut map = self.load(partition)?;
        map.insert(key.to_string(), value);
        self.store(partition, &map)
    }

    fn delete(&self, partition: Partition, key: &str) -> Result<bool> {
        let _guard = self.lock();
        let mut map = self.load(partition)?;
        if map.remove(key).is_none() {
            return Ok(false);
        }
        self.store(partition, &map)?;
        Ok(true)
    }

    fn values(&self, partition: Partition) -> Result<Vec<Value>> {
        Ok(self.load(partition)?.into_values().collect())
    }

    fn count(&self, partition: Partition) -> Result<usize> {
        Ok(self.load(partition)?.len())
    }

    fn clear(&self, partition: Partition) -> Result<()> {
        let _guard = self.lock();
        self.store(partition, &PartitionMap::new())
    }
}

/// In-process engine; nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryEngine {
    partitions: Mutex<HashMap<Partition, PartitionMap>>,
    unavailable: bool,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine whose `open` always fails, like a browser with storage disabled
    pub fn unavailable() -> Self {
        MemoryEngine {
            partitions: Mutex::new(HashMap::new()),
            unavailable: true,
        }
    }

    fn with_partition<T>(
        &self,
        partition: Partition,
        f: impl FnOnce(&mut PartitionMap) -> T,
    ) -> Result<T> {
        let mut partitions = self.partitions.lock().unwrap_or_else(|e| e.into_inner());
        let map = partitions.get_mut(&partition).ok_or_else(|| {
            VaultError::StoreUnavailable(format!("partition '{}' is not open", partition))
        })?;
        Ok(f(map))
    }
}

impl StorageEngine for MemoryEngine {
    fn open(&self, partitions: &[Partition]) -> Result<()> {
        if self.unavailable {
            return Err(VaultError::StoreUnavailable(
                "in-memory engine disabled".to_string(),
            ));
        }
        let mut open = self.partitions.lock().unwrap_or_else(|e| e.into_inner());
        for partition in partitions {
            open.entry(*partition).or_default();
        }
        Ok(())
    }

    fn get(&self, partition: Partition, key: &str) -> Result<Option<Value>> {
        self.with_partition(partition, |map| map.get(key).cloned())
    }

    fn put(&self, partition: Partition, key: &str, value: Value) -> Result<()> {
        self.with_partition(partition, |map| {
            map.insert(key.to_string(), value);
        })
    }

    fn delete(&self, partition: Partition, key: &str) -> Result<bool> {
        self.with_partition(partition, |map| map.remove(key).is_some())
    }

    fn values(&self, partition: Partition) -> Result<Vec<Value>> {
        self.with_partition(partition, |map| map.values().cloned().collect())
    }

    fn count(&self, partition: Partition) -> Result<usize> {
        self.with_partition(partition, |map| map.len())
    }

    fn clear(&self, partition: Partition) -> Result<()> {
        self.with_partition(partition, |map| map.clear())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_file_engine_open_creates_partition_files() {
        let temp = TempDir::new().unwrap();
        let engine = FileEngine::new(temp.path().join("store"));

        engine.open(&Partition::ALL).unwrap();

        for partition in Partition::ALL {
            assert!(temp
                .path()
                .join("store")
                .join(format!("{}.json", partition))
                .exists());
        }
    }

    #[test]
    fn test_file_engine_put_get_delete() {
        let temp = TempDir::new().unwrap();
        let engine = FileEngine::new(temp.path().to_path_buf());
        engine.open(&Partition::ALL).unwrap();

        engine
            .put(Partition::Preferences, "theme", json!("dark"))
            .unwrap();
        assert_eq!(
            engine.get(Partition::Preferences, "theme").unwrap(),
            Some(json!("dark"))
        );
        assert_eq!(engine.count(Partition::Preferences).unwrap(), 1);

        assert!(engine.delete(Partition::Preferences, "theme").unwrap());
        assert!(!engine.delete(Partition::Preferences, "theme").unwrap());
        assert_eq!(engine.get(Partition::Preferences, "theme").unwrap(), None);
    }

    #[test]
    fn test_file_engine_persists_across_instances() {
        let temp = TempDir::new().unwrap();
        {
            let engine = FileEngine::new(temp.path().to_path_buf());
            engine.open(&Partition::ALL).unwrap();
            engine.put(Partition::Cache, "k", json!({"a": 1})).unwrap();
        }

        let engine = FileEngine::new(temp.path().to_path_buf());
        engine.open(&Partition::ALL).unwrap();
        assert_eq!(
            engine.get(Partition::Cache, "k").unwrap(),
            Some(json!({"a": 1}))
        );
    }

    #[test]
    fn test_file_engine_corrupt_partition_is_format_error() {
        let temp = TempDir::new().unwrap();
        let engine = FileEngine::new(temp.path().to_path_buf());
        engine.open(&Partition::ALL).unwrap();
        fs::write(temp.path().join("notes.json"), "{oops").unwrap();

        match engine.values(Partition::Notes) {
            Err(VaultError::Format(_)) => {}
            other => panic!("Expected Format error, got {:?}", other),
        }
    }

    #[test]
    fn test_file_engine_open_fails_when_dir_is_a_file() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("store");
        fs::write(&blocker, "not a directory").unwrap();

        let engine = FileEngine::new(blocker);
        match engine.open(&Partition::ALL) {
            Err(VaultError::StoreUnavailable(_)) => {}
            other => panic!("Expected StoreUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_memory_engine_clear() {
        let engine = MemoryEngine::new();
        engine.open(&Partition::ALL).unwrap();
        engine.put(Partition::Notes, "a", json!(1)).unwrap();
        engine.put(Partition::Notes, "b", json!(2)).unwrap();

        engine.clear(Partition::Notes).unwrap();
        assert_eq!(engine.count(Partition::Notes).unwrap(), 0);
    }

    #[test]
    fn test_memory_engine_unavailable() {
        let engine = MemoryEngine::unavailable();
        assert!(engine.open(&Partition::ALL).is_err());
        assert!(engine.get(Partition::Notes, "a").is_err());
    }
}
