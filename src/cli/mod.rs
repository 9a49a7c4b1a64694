//! CLI layer - Command-line interface

pub mod commands;
pub mod output;

pub use commands::{CacheCommand, Cli, Commands, FileCommand, NoteCommand, PrefCommand, QuizCommand};
pub use output::{format_file_list, format_note_list, format_queue, format_snapshot, format_stats};
