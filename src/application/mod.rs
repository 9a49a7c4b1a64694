//! Application layer - Use cases and orchestration

pub mod autosave;
pub mod init;
pub mod list_notes;
pub mod manage_config;
pub mod sync;

pub use autosave::{load_saved_quiz, AutosaveSettings, QuizAutosave, UnloadDecision};
pub use list_notes::list_notes;
pub use manage_config::ConfigService;
pub use sync::{SyncReport, SyncService};
