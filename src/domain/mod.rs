//! Domain layer - Records, queue policy and quiz state

pub mod cache;
pub mod clock;
pub mod partition;
pub mod quiz;
pub mod record;
pub mod sync_queue;

pub use cache::CachedContent;
pub use clock::{Clock, ManualClock, SystemClock};
pub use partition::Partition;
pub use quiz::{QuizQuestion, QuizSession, QuizSettings, QuizSnapshot, SaveStatus};
pub use record::{FileRecord, LocalRecord, Note, SyncOperation};
pub use sync_queue::{
    coalesce, AnalyticsEvent, CoalescedEntity, ProfileUpdate, SyncAction, SyncEntity,
    SyncQueueEntry,
};
