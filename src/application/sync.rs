//! Drain the sync queue against the remote backend

use crate::domain::{coalesce, SyncAction, SyncEntity, SyncOperation};
use crate::error::Result;
use crate::infrastructure::{Notice, Notifier, OfflineStore, RemoteBackend};
use serde::Serialize;

/// Outcome of one drain pass, counted per entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Entities whose coalesced action the remote accepted
    pub applied: usize,
    /// Entities created and deleted locally; nothing was sent
    pub dropped: usize,
    /// Entities whose action failed; their entries stay queued
    pub failed: usize,
}

/// Service that replays queued mutations, one coalesced action per entity
pub struct SyncService<'a> {
    store: &'a OfflineStore,
    notifier: &'a dyn Notifier,
}

impl<'a> SyncService<'a> {
    pub fn new(store: &'a OfflineStore, notifier: &'a dyn Notifier) -> Self {
        SyncService { store, notifier }
    }

    /// Push every pending entity to `remote`.
    ///
    /// A failure on one entity bumps the retry count on its entries and moves on;
    /// the remaining entities are still attempted.
    pub fn drain(&self, remote: &dyn RemoteBackend) -> Result<SyncReport> {
        let entries = self.store.get_sync_queue()?;
        let mut report = SyncReport::default();

        for group in coalesce(&entries) {
            let Some(action) = &group.action else {
                self.remove_entries(&group.entry_ids)?;
                report.dropped += 1;
                continue;
            };

            match remote.apply(action) {
                Ok(()) => {
                    self.settle_local(action)?;
                    self.remove_entries(&group.entry_ids)?;
                    report.applied += 1;
                    tracing::debug!(
                        entity_type = group.entity_type,
                        entity_id = %group.entity_id,
                        operation = %action.operation,
                        "synced entity"
                    );
                }
                Err(e) => {
                    let message = e.to_string();
                    for entry in entries
                        .iter()
                        .filter(|entry| group.entry_ids.contains(&entry.id))
                    {
                        self.store.update_sync_queue_item(
                            &entry.id,
                            entry.retry_count + 1,
                            Some(message.clone()),
                        )?;
                    }
                    report.failed += 1;
                    self.notifier.notify(Notice::error(format!(
                        "Could not sync {} {}: {}",
                        group.entity_type, group.entity_id, message
                    )));
                    tracing::warn!(
                        entity_type = group.entity_type,
                        entity_id = %group.entity_id,
                        error = %message,
                        "sync failed, entries kept for retry"
                    );
                }
            }
        }

        tracing::info!(
            applied = report.applied,
            dropped = report.dropped,
            failed = report.failed,
            "sync queue drained"
        );
        if report.applied > 0 {
            self.notifier.notify(Notice::success(format!(
                "Synced {} change(s)",
                report.applied
            )));
        }
        Ok(report)
    }

    fn remove_entries(&self, ids: &[String]) -> Result<()> {
        for id in ids {
            self.store.remove_from_sync_queue(id)?;
        }
        Ok(())
    }

    /// Bring the local copy in line with what the remote now holds
    fn settle_local(&self, action: &SyncAction) -> Result<()> {
        let delete = action.operation == SyncOperation::Delete;
        match &action.entity {
            SyncEntity::Note(note) if delete => self.store.purge_note(&note.id).map(|_| ()),
            SyncEntity::Note(note) => self.store.mark_note_synced(&note.id),
            SyncEntity::File(file) if delete => self.store.purge_file(&file.id).map(|_| ()),
            SyncEntity::File(file) => self.store.mark_file_synced(&file.id),
            SyncEntity::Profile(_) | SyncEntity::Analytics(_) => Ok(()),
        }
    }
}
