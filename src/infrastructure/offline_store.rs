//! Offline store: local records, the sync queue, preferences and cached content

use crate::domain::{
    CachedContent, Clock, FileRecord, LocalRecord, Note, Partition, SyncEntity, SyncOperation,
    SyncQueueEntry,
};
use crate::error::{Result, VaultError};
use crate::infrastructure::engine::StorageEngine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Record counts per partition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    pub notes: usize,
    pub files: usize,
    pub sync_queue: usize,
    pub preferences: usize,
    pub cache: usize,
}

/// Local durable store mirrored to the remote backend.
///
/// Constructed once and shared by reference. Until `initialize` succeeds every
/// other operation fails with `VaultError::NotInitialized`.
///
/// Read-modify-write sequences (`mark_*_synced`, `delete_*`) are not atomic
/// across callers, and a save writes the record and its queue entry in two
/// separate engine calls.
pub struct OfflineStore {
    engine: Box<dyn StorageEngine>,
    clock: Arc<dyn Clock>,
    initialized: AtomicBool,
}

impl OfflineStore {
    pub fn new(engine: Box<dyn StorageEngine>, clock: Arc<dyn Clock>) -> Self {
        OfflineStore {
            engine,
            clock,
            initialized: AtomicBool::new(false),
        }
    }

    /// Open every partition. A failure is logged and returned; the store stays unusable.
    pub fn initialize(&self) -> Result<()> {
        match self.engine.open(&Partition::ALL) {
            Ok(()) => {
                self.initialized.store(true, Ordering::SeqCst);
                tracing::info!("offline store initialized");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to initialize offline store");
                Err(e)
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn engine(&self) -> Result<&dyn StorageEngine> {
        if self.is_initialized() {
            Ok(self.engine.as_ref())
        } else {
            Err(VaultError::NotInitialized)
        }
    }

    fn read<T: DeserializeOwned>(&self, partition: Partition, key: &str) -> Result<Option<T>> {
        match self.engine()?.get(partition, key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, partition: Partition, key: &str, value: &T) -> Result<()> {
        self.engine()?
            .put(partition, key, serde_json::to_value(value)?)
    }

    fn read_all<T: DeserializeOwned>(&self, partition: Partition) -> Result<Vec<T>> {
        self.engine()?
            .values(partition)?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(VaultError::from))
            .collect()
    }

    // Records

    fn save_record<R: LocalRecord>(&self, mut record: R, operation: SyncOperation) -> Result<R> {
        record.mark_pending(operation, self.clock.now());
        self.write(R::PARTITION, record.id(), &record)?;
        self.add_to_sync_queue(record.to_entity(), operation)?;
        tracing::debug!(
            partition = %R::PARTITION,
            id = record.id(),
            %operation,
            "saved record locally"
        );
        Ok(record)
    }

    fn records_for_user<R: LocalRecord>(&self, user_id: &str) -> Result<Vec<R>> {
        let mut records: Vec<R> = self.read_all(R::PARTITION)?;
        records.retain(|r| r.user_id() == user_id);
        Ok(records)
    }

    fn unsynced_records<R: LocalRecord>(&self) -> Result<Vec<R>> {
        let mut records: Vec<R> = self.read_all(R::PARTITION)?;
        records.retain(|r| !r.synced());
        Ok(records)
    }

    fn mark_record_synced<R: LocalRecord>(&self, id: &str) -> Result<()> {
        let Some(mut record) = self.read::<R>(R::PARTITION, id)? else {
            return Ok(());
        };
        record.mark_synced();
        self.write(R::PARTITION, id, &record)
    }

    fn delete_record<R: LocalRecord>(&self, id: &str) -> Result<()> {
        let Some(record) = self.read::<R>(R::PARTITION, id)? else {
            return Ok(());
        };

        let entity_type = record.to_entity().entity_type();
        if !record.synced() && self.create_still_queued(entity_type, id)? {
            self.engine()?.delete(R::PARTITION, id)?;
            let removed = self.remove_queue_entries_for(entity_type, id)?;
            tracing::debug!(
                partition = %R::PARTITION,
                id,
                removed_entries = removed,
                "purged record that never left the device"
            );
        } else {
            // Remote copy exists: keep a tombstone until the delete is pushed
            self.save_record(record, SyncOperation::Delete)?;
        }
        Ok(())
    }

    /// A record reached the remote unless its create is still waiting in the queue.
    /// `synced` alone is not enough: a later local edit clears it.
    fn create_still_queued(&self, entity_type: &str, id: &str) -> Result<bool> {
        Ok(self
            .read_all::<SyncQueueEntry>(Partition::SyncQueue)?
            .iter()
            .any(|e| e.is_for(entity_type, id) && e.operation == SyncOperation::Create))
    }

    fn purge_record<R: LocalRecord>(&self, id: &str) -> Result<bool> {
        self.engine()?.delete(R::PARTITION, id)
    }

    pub fn save_note(&self, note: Note, operation: SyncOperation) -> Result<Note> {
        self.save_record(note, operation)
    }

    pub fn save_file(&self, file: FileRecord, operation: SyncOperation) -> Result<FileRecord> {
        self.save_record(file, operation)
    }

    pub fn get_note(&self, id: &str) -> Result<Option<Note>> {
        self.read(Partition::Notes, id)
    }

    pub fn get_file(&self, id: &str) -> Result<Option<FileRecord>> {
        self.read(Partition::Files, id)
    }

    pub fn get_all_notes(&self, user_id: &str) -> Result<Vec<Note>> {
        self.records_for_user(user_id)
    }

    pub fn get_all_files(&self, user_id: &str) -> Result<Vec<FileRecord>> {
        self.records_for_user(user_id)
    }

    pub fn get_unsynced_notes(&self) -> Result<Vec<Note>> {
        self.unsynced_records()
    }

    pub fn get_unsynced_files(&self) -> Result<Vec<FileRecord>> {
        self.unsynced_records()
    }

    pub fn mark_note_synced(&self, id: &str) -> Result<()> {
        self.mark_record_synced::<Note>(id)
    }

    pub fn mark_file_synced(&self, id: &str) -> Result<()> {
        self.mark_record_synced::<FileRecord>(id)
    }

    /// Tombstone a synced note, or purge an unsynced one together with its queue entries
    pub fn delete_note(&self, id: &str) -> Result<()> {
        self.delete_record::<Note>(id)
    }

    pub fn delete_file(&self, id: &str) -> Result<()> {
        self.delete_record::<FileRecord>(id)
    }

    /// Drop a note outright, without queueing anything. Used once a remote delete is confirmed.
    pub fn purge_note(&self, id: &str) -> Result<bool> {
        self.purge_record::<Note>(id)
    }

    pub fn purge_file(&self, id: &str) -> Result<bool> {
        self.purge_record::<FileRecord>(id)
    }

    // Sync queue

    /// Append an entry. Entries for the same entity and operation never collapse.
    pub fn add_to_sync_queue(
        &self,
        entity: SyncEntity,
        operation: SyncOperation,
    ) -> Result<SyncQueueEntry> {
        let engine = self.engine()?;
        let mut entry = SyncQueueEntry::new(entity, operation, self.clock.now());

        // Same entity, operation and millisecond: keep both entries
        let base_id = entry.id.clone();
        let mut suffix = 1;
        while engine.get(Partition::SyncQueue, &entry.id)?.is_some() {
            entry.id = format!("{}-{}", base_id, suffix);
            suffix += 1;
        }

        self.write(Partition::SyncQueue, &entry.id, &entry)?;
        Ok(entry)
    }

    pub fn remove_from_sync_queue(&self, id: &str) -> Result<bool> {
        self.engine()?.delete(Partition::SyncQueue, id)
    }

    /// Record a failed attempt on a queue entry. No-op if the entry is gone.
    pub fn update_sync_queue_item(
        &self,
        id: &str,
        retry_count: u32,
        last_error: Option<String>,
    ) -> Result<()> {
        let Some(mut entry) = self.read::<SyncQueueEntry>(Partition::SyncQueue, id)? else {
            return Ok(());
        };
        entry.retry_count = retry_count;
        entry.last_error = last_error;
        self.write(Partition::SyncQueue, id, &entry)
    }

    /// All queued entries, oldest first
    pub fn get_sync_queue(&self) -> Result<Vec<SyncQueueEntry>> {
        let mut entries: Vec<SyncQueueEntry> = self.read_all(Partition::SyncQueue)?;
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(entries)
    }

    pub fn remove_queue_entries_for(&self, entity_type: &str, entity_id: &str) -> Result<usize> {
        let engine = self.engine()?;
        let mut removed = 0;
        for entry in self.read_all::<SyncQueueEntry>(Partition::SyncQueue)? {
            if entry.is_for(entity_type, entity_id) && engine.delete(Partition::SyncQueue, &entry.id)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    // Preferences

    pub fn set_preference<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.write(Partition::Preferences, key, value)
    }

    pub fn get_preference<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.read(Partition::Preferences, key)
    }

    // Cache

    pub fn cache_content(
        &self,
        url: &str,
        data: serde_json::Value,
        ttl_minutes: u32,
    ) -> Result<CachedContent> {
        let entry = CachedContent::new(url, data, self.clock.now(), ttl_minutes);
        self.write(Partition::Cache, url, &entry)?;
        Ok(entry)
    }

    /// Cached payload, or `None` if absent or expired. Expired entries are removed on read.
    pub fn get_cached_content(&self, url: &str) -> Result<Option<serde_json::Value>> {
        let Some(entry) = self.read::<CachedContent>(Partition::Cache, url)? else {
            return Ok(None);
        };
        if entry.is_expired(self.clock.now()) {
            self.engine()?.delete(Partition::Cache, url)?;
            tracing::debug!(url, "evicted expired cache entry");
            return Ok(None);
        }
        Ok(Some(entry.data))
    }

    /// Sweep every expired entry; returns how many were removed
    pub fn clear_expired_cache(&self) -> Result<usize> {
        let now = self.clock.now();
        let engine = self.engine()?;
        let mut removed = 0;
        for entry in self.read_all::<CachedContent>(Partition::Cache)? {
            if entry.is_expired(now) && engine.delete(Partition::Cache, &entry.url)? {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!(removed, "cleared expired cache entries");
        }
        Ok(removed)
    }

    // Maintenance

    /// Wipe every partition. Irreversible.
    pub fn clear_all_data(&self) -> Result<()> {
        let engine = self.engine()?;
        for partition in Partition::ALL {
            engine.clear(partition)?;
        }
        tracing::warn!("cleared all offline data");
        Ok(())
    }

    pub fn get_storage_stats(&self) -> Result<StorageStats> {
        let engine = self.engine()?;
        Ok(StorageStats {
            notes: engine.count(Partition::Notes)?,
            files: engine.count(Partition::Files)?,
            sync_queue: engine.count(Partition::SyncQueue)?,
            preferences: engine.count(Partition::Preferences)?,
            cache: engine.count(Partition::Cache)?,
        })
    }
}
