//! Sync queue entries and the coalescing policy used when draining them

use crate::domain::record::{FileRecord, Note, SyncOperation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub id: String,
    pub user_id: String,
    pub event: String,
    #[serde(default)]
    pub properties: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

/// Snapshot of the entity a queued mutation applies to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum SyncEntity {
    Note(Note),
    File(FileRecord),
    Profile(ProfileUpdate),
    Analytics(AnalyticsEvent),
}

impl SyncEntity {
    pub fn entity_type(&self) -> &'static str {
        match self {
            SyncEntity::Note(_) => "note",
            SyncEntity::File(_) => "file",
            SyncEntity::Profile(_) => "profile",
            SyncEntity::Analytics(_) => "analytics",
        }
    }

    pub fn entity_id(&self) -> &str {
        match self {
            SyncEntity::Note(note) => &note.id,
            SyncEntity::File(file) => &file.id,
            SyncEntity::Profile(profile) => &profile.user_id,
            SyncEntity::Analytics(event) => &event.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncQueueEntry {
    pub id: String,
    pub entity: SyncEntity,
    pub operation: SyncOperation,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl SyncQueueEntry {
    /// Build an entry whose id is `{type}_{entity id}_{operation}_{millis}`
    pub fn new(entity: SyncEntity, operation: SyncOperation, created_at: DateTime<Utc>) -> Self {
        let id = format!(
            "{}_{}_{}_{}",
            entity.entity_type(),
            entity.entity_id(),
            operation,
            created_at.timestamp_millis()
        );
        SyncQueueEntry {
            id,
            entity,
            operation,
            created_at,
            retry_count: 0,
            last_error: None,
        }
    }

    pub fn entity_type(&self) -> &'static str {
        self.entity.entity_type()
    }

    pub fn entity_id(&self) -> &str {
        self.entity.entity_id()
    }

    pub fn is_for(&self, entity_type: &str, entity_id: &str) -> bool {
        self.entity_type() == entity_type && self.entity_id() == entity_id
    }
}

/// Single remote call produced by coalescing one entity's entries
#[derive(Debug, Clone, PartialEq)]
pub struct SyncAction {
    pub operation: SyncOperation,
    pub entity: SyncEntity,
}

/// All queued entries for one entity, reduced to at most one action
#[derive(Debug, Clone, PartialEq)]
pub struct CoalescedEntity {
    pub entity_type: &'static str,
    pub entity_id: String,
    /// `None` when the entity was created and deleted before ever syncing
    pub action: Option<SyncAction>,
    pub entry_ids: Vec<String>,
}

/// Reduce queue entries to one action per entity, latest snapshot wins.
///
/// Groups come out in the order of each entity's oldest entry.
pub fn coalesce(entries: &[SyncQueueEntry]) -> Vec<CoalescedEntity> {
    let mut ordered: Vec<&SyncQueueEntry> = entries.iter().collect();
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let mut groups: Vec<Vec<&SyncQueueEntry>> = Vec::new();
    let mut index: HashMap<(&'static str, &str), usize> = HashMap::new();
    for entry in ordered {
        let key = (entry.entity_type(), entry.entity_id());
        match index.get(&key) {
            Some(&i) => groups[i].push(entry),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![entry]);
            }
        }
    }

    groups
        .into_iter()
        .filter_map(|group| {
            let first = group.first()?;
            let last = group.last()?;
            let created_locally = group
                .iter()
                .any(|e| e.operation == SyncOperation::Create);

            let operation = match last.operation {
                SyncOperation::Delete if created_locally => None,
                SyncOperation::Delete => Some(SyncOperation::Delete),
                _ if first.operation == SyncOperation::Create => Some(SyncOperation::Create),
                _ => Some(SyncOperation::Update),
            };

            Some(CoalescedEntity {
                entity_type: last.entity_type(),
                entity_id: last.entity_id().to_string(),
                action: operation.map(|operation| SyncAction {
                    operation,
                    entity: last.entity.clone(),
                }),
                entry_ids: group.iter().map(|e| e.id.clone()).collect(),
            })
        })
        .collect()
}
