//! Logical partitions of the local store

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed set of partitions the offline store opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    Notes,
    Files,
    SyncQueue,
    Preferences,
    Cache,
}

impl Partition {
    pub const ALL: [Partition; 5] = [
        Partition::Notes,
        Partition::Files,
        Partition::SyncQueue,
        Partition::Preferences,
        Partition::Cache,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Notes => "notes",
            Partition::Files => "files",
            Partition::SyncQueue => "sync_queue",
            Partition::Preferences => "preferences",
            Partition::Cache => "cache",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
