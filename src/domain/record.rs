//! Locally stored notes and files

use crate::domain::partition::Partition;
use crate::domain::sync_queue::SyncEntity;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mutation waiting to be applied to the remote backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOperation {
    Create,
    Update,
    Delete,
}

impl SyncOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOperation::Create => "create",
            SyncOperation::Update => "update",
            SyncOperation::Delete => "delete",
        }
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(SyncOperation::Create),
            "update" => Ok(SyncOperation::Update),
            "delete" => Ok(SyncOperation::Delete),
            _ => Err(format!(
                "Invalid operation: '{}'. Valid operations are: create, update, delete",
                s
            )),
        }
    }
}

/// Behavior shared by every record kind the offline store mirrors.
///
/// A record with `synced() == true` never carries a pending operation; the
/// two mutators below are the only way the sync fields change.
pub trait LocalRecord: Serialize + DeserializeOwned + Clone {
    /// Partition the record lives in
    const PARTITION: Partition;

    fn id(&self) -> &str;
    fn user_id(&self) -> &str;
    fn synced(&self) -> bool;

    /// Flag the record as locally modified by `operation` at `at`
    fn mark_pending(&mut self, operation: SyncOperation, at: DateTime<Utc>);

    /// Flag the record as confirmed by the remote backend
    fn mark_synced(&mut self);

    /// Wrap a snapshot of the record for the sync queue
    fn to_entity(&self) -> SyncEntity;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub synced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_operation: Option<SyncOperation>,
}

impl Note {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Note {
            id: id.into(),
            user_id: user_id.into(),
            title: title.into(),
            content: content.into(),
            category: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            synced: false,
            pending_operation: None,
        }
    }
}

impl LocalRecord for Note {
    const PARTITION: Partition = Partition::Notes;

    fn id(&self) -> &str {
        &self.id
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn synced(&self) -> bool {
        self.synced
    }

    fn mark_pending(&mut self, operation: SyncOperation, at: DateTime<Utc>) {
        self.synced = false;
        self.pending_operation = Some(operation);
        self.updated_at = at;
    }

    fn mark_synced(&mut self) {
        self.synced = true;
        self.pending_operation = None;
    }

    fn to_entity(&self) -> SyncEntity {
        SyncEntity::Note(self.clone())
    }
}

/// Uploaded file metadata (the blob itself lives in remote storage)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub file_type: String,
    pub file_size: u64,
    pub storage_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
    #[serde(default)]
    pub processed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub synced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_operation: Option<SyncOperation>,
}

impl FileRecord {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        name: impl Into<String>,
        file_type: impl Into<String>,
        file_size: u64,
        now: DateTime<Utc>,
    ) -> Self {
        let id = id.into();
        let user_id = user_id.into();
        let name = name.into();
        let storage_path = format!("{}/{}-{}", user_id, id, name);
        FileRecord {
            id,
            user_id,
            name,
            file_type: file_type.into(),
            file_size,
            storage_path,
            ocr_text: None,
            processed: false,
            created_at: now,
            updated_at: now,
            synced: false,
            pending_operation: None,
        }
    }
}

impl LocalRecord for FileRecord {
    const PARTITION: Partition = Partition::Files;

    fn id(&self) -> &str {
        &self.id
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn synced(&self) -> bool {
        self.synced
    }

    fn mark_pending(&mut self, operation: SyncOperation, at: DateTime<Utc>) {
        self.synced = false;
        self.pending_operation = Some(operation);
        self.updated_at = at;
    }

    fn mark_synced(&mut self) {
        self.synced = true;
        self.pending_operation = None;
    }

    fn to_entity(&self) -> SyncEntity {
        SyncEntity::File(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, secs).unwrap()
    }

    #[test]
    fn test_operation_from_str() {
        assert_eq!(
            SyncOperation::from_str("Create").unwrap(),
            SyncOperation::Create
        );
        assert_eq!(
            SyncOperation::from_str("delete").unwrap(),
            SyncOperation::Delete
        );
        assert!(SyncOperation::from_str("upsert").is_err());
    }

    #[test]
    fn test_mark_pending_then_synced() {
        let mut note = Note::new("n1", "u1", "x", "", at(0));
        note.mark_pending(SyncOperation::Update, at(5));
        assert!(!note.synced);
        assert_eq!(note.pending_operation, Some(SyncOperation::Update));
        assert_eq!(note.updated_at, at(5));

        note.mark_synced();
        assert!(note.synced);
        assert_eq!(note.pending_operation, None);
    }

    #[test]
    fn test_note_json_omits_empty_pending_operation() {
        let note = Note::new("n1", "u1", "x", "", at(0));
        let json = serde_json::to_string(&note).unwrap();
        assert!(!json.contains("pending_operation"));
    }

    #[test]
    fn test_file_storage_path() {
        let file = FileRecord::new("f1", "u1", "scan.png", "image/png", 2048, at(0));
        assert_eq!(file.storage_path, "u1/f1-scan.png");
        assert!(!file.processed);
    }
}
