//! studyvault - Offline-first study notes store
//!
//! Keeps notes, file records, preferences and cached content in a local store,
//! queues every local mutation for the remote backend, and autosaves
//! in-progress quizzes so they can be recovered after an interruption.

pub mod application;
pub mod cli;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::VaultError;
