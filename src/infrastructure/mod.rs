//! Infrastructure layer - External I/O and persistence

pub mod config;
pub mod engine;
pub mod notifier;
pub mod offline_store;
pub mod remote;
pub mod repository;
pub mod snapshot_storage;

pub use config::{AutosaveConfig, CacheConfig, Config};
pub use engine::{FileEngine, MemoryEngine, StorageEngine};
pub use notifier::{ConsoleNotifier, Notice, NoticeLevel, Notifier, RecordingNotifier};
pub use offline_store::{OfflineStore, StorageStats};
pub use remote::{FileRemote, RemoteBackend};
pub use repository::{FileSystemRepository, VaultRepository};
pub use snapshot_storage::{FileSnapshotStorage, MemorySnapshotStorage, SnapshotStorage};
