//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "studyvault")]
#[command(about = "Offline-first study notes store with quiz autosave", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new vault
    Init {
        /// Directory to initialize (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Owner of the notes created in this vault
        #[arg(short, long)]
        user: Option<String>,
    },

    /// View or modify configuration
    Config {
        /// Config key to get or set
        key: Option<String>,

        /// Value to set (if provided, sets the key)
        value: Option<String>,

        /// List all configuration
        #[arg(short, long)]
        list: bool,
    },

    /// Work with locally stored notes
    #[command(subcommand)]
    Note(NoteCommand),

    /// Work with uploaded file records
    #[command(subcommand)]
    File(FileCommand),

    /// Show pending sync queue entries
    Queue,

    /// Push pending changes to the remote backend
    Sync,

    /// Cached remote content
    #[command(subcommand)]
    Cache(CacheCommand),

    /// User preferences
    #[command(subcommand)]
    Pref(PrefCommand),

    /// Record counts per partition
    Stats,

    /// Wipe all local data (irreversible)
    Clear {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },

    /// In-progress quiz snapshots
    #[command(subcommand)]
    Quiz(QuizCommand),
}

#[derive(Subcommand, Debug)]
pub enum NoteCommand {
    /// Create or update a note
    Save {
        id: String,

        #[arg(short, long)]
        title: String,

        #[arg(short, long, default_value = "")]
        content: String,

        /// Operation to queue (create, update); inferred when omitted
        #[arg(long)]
        op: Option<String>,
    },

    /// List notes, newest first
    List {
        /// Only notes with pending changes
        #[arg(long)]
        unsynced: bool,

        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Delete a note
    Delete { id: String },

    /// Mark a note as confirmed by the remote backend
    Synced { id: String },
}

#[derive(Subcommand, Debug)]
pub enum FileCommand {
    /// Record an uploaded file
    Add {
        id: String,
        name: String,

        /// MIME type
        #[arg(short = 't', long = "type", default_value = "application/octet-stream")]
        file_type: String,

        /// Size in bytes
        #[arg(short, long, default_value_t = 0)]
        size: u64,
    },

    /// List file records, newest first
    List {
        /// Only files with pending changes
        #[arg(long)]
        unsynced: bool,
    },

    /// Delete a file record
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Cache a JSON payload for a URL
    Put {
        url: String,
        data: String,

        /// Time-to-live in minutes (default from config)
        #[arg(long)]
        ttl: Option<u32>,
    },

    /// Read a cached payload
    Get { url: String },

    /// Remove every expired entry
    Sweep,
}

#[derive(Subcommand, Debug)]
pub enum PrefCommand {
    /// Store a preference (JSON, or plain text)
    Set { key: String, value: String },

    /// Read a preference
    Get { key: String },
}

#[derive(Subcommand, Debug)]
pub enum QuizCommand {
    /// Answer a question and save progress immediately
    Answer {
        quiz_id: String,

        /// Question number, starting at 1
        number: usize,

        answer: String,

        /// Number of questions when starting a new quiz
        #[arg(long, default_value_t = 10)]
        questions: usize,
    },

    /// Show the saved snapshot
    Show { quiz_id: String },

    /// Delete the saved snapshot
    Clear { quiz_id: String },
}
