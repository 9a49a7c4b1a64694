use clap::Parser;
use studyvault::application::{
    init::init, list_notes, load_saved_quiz, AutosaveSettings, ConfigService, QuizAutosave,
    SyncService,
};
use studyvault::cli::{
    format_file_list, format_note_list, format_queue, format_snapshot, format_stats,
    CacheCommand, Cli, Commands, FileCommand, NoteCommand, PrefCommand, QuizCommand,
};
use studyvault::domain::{
    FileRecord, Note, QuizQuestion, QuizSession, QuizSettings, SyncOperation, SystemClock,
};
use studyvault::error::{Result, VaultError};
use studyvault::infrastructure::{
    Config, ConsoleNotifier, FileRemote, FileSystemRepository, OfflineStore, SnapshotStorage,
    VaultRepository,
};
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(_) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e.display_with_suggestions());
            std::process::exit(e.exit_code());
        }
    }
}

struct Vault {
    repo: FileSystemRepository,
    config: Config,
    store: OfflineStore,
}

fn open_vault() -> Result<Vault> {
    let repo = FileSystemRepository::discover()?;
    let config = repo.load_config()?;
    let store = repo.open_store(Arc::new(SystemClock))?;
    Ok(Vault {
        repo,
        config,
        store,
    })
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Init { path, user }) => init(&path, user),
        Some(Commands::Config { key, value, list }) => {
            let repo = FileSystemRepository::discover()?;
            let service = ConfigService::new(repo);

            if list {
                let config = service.list()?;
                println!("user = {}", config.user_id);
                println!("debounce_ms = {}", config.autosave.debounce_ms);
                println!("interval_secs = {}", config.autosave.interval_secs);
                println!("notify_every = {}", config.autosave.notify_every);
                println!("cache_ttl = {}", config.cache.default_ttl_minutes);
                println!("created = {}", config.created.to_rfc3339());
                Ok(())
            } else if let Some(k) = key {
                if let Some(v) = value {
                    service.set(&k, &v)?;
                    println!("Set {} = {}", k, v);
                } else {
                    println!("{}", service.get(&k)?);
                }
                Ok(())
            } else {
                println!("Usage: studyvault config [--list | <key> [<value>]]");
                println!("Valid keys: user, debounce_ms, interval_secs, notify_every, cache_ttl, created");
                Ok(())
            }
        }
        Some(Commands::Note(command)) => run_note(open_vault()?, command),
        Some(Commands::File(command)) => run_file(open_vault()?, command),
        Some(Commands::Queue) => {
            let vault = open_vault()?;
            print!("{}", with_newline(format_queue(&vault.store.get_sync_queue()?)));
            Ok(())
        }
        Some(Commands::Sync) => {
            let vault = open_vault()?;
            let remote = FileRemote::new(vault.repo.remote_path());
            let report = SyncService::new(&vault.store, &ConsoleNotifier).drain(&remote)?;
            println!(
                "Synced: {} applied, {} dropped, {} failed",
                report.applied, report.dropped, report.failed
            );
            Ok(())
        }
        Some(Commands::Cache(command)) => run_cache(open_vault()?, command),
        Some(Commands::Pref(command)) => run_pref(open_vault()?, command),
        Some(Commands::Stats) => {
            let vault = open_vault()?;
            print!("{}", format_stats(&vault.store.get_storage_stats()?));
            Ok(())
        }
        Some(Commands::Clear { yes }) => {
            if !yes {
                return Err(VaultError::Config(
                    "Refusing to wipe local data without --yes".to_string(),
                ));
            }
            let vault = open_vault()?;
            vault.store.clear_all_data()?;
            println!("Cleared all local data");
            Ok(())
        }
        Some(Commands::Quiz(command)) => run_quiz(open_vault()?, command),
        None => {
            println!("studyvault - Offline-first study notes store");
            println!("Use --help for usage information");
            Ok(())
        }
    }
}

fn with_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

fn run_note(vault: Vault, command: NoteCommand) -> Result<()> {
    let store = &vault.store;
    let user_id = vault.config.get_user_id();

    match command {
        NoteCommand::Save {
            id,
            title,
            content,
            op,
        } => {
            let existing = store.get_note(&id)?;
            let operation = match op {
                Some(op) => SyncOperation::from_str(&op).map_err(VaultError::Config)?,
                None if existing.is_some() => SyncOperation::Update,
                None => SyncOperation::Create,
            };
            if operation == SyncOperation::Delete {
                return Err(VaultError::Config(
                    "Use 'studyvault note delete' to delete a note".to_string(),
                ));
            }

            let note = match existing {
                Some(mut note) => {
                    note.title = title;
                    note.content = content;
                    note
                }
                None => Note::new(id, user_id, title, content, chrono::Utc::now()),
            };
            let saved = store.save_note(note, operation)?;
            println!("Saved note {} ({})", saved.id, operation);
            Ok(())
        }
        NoteCommand::List { unsynced, limit } => {
            let notes = list_notes(store, &user_id, unsynced, limit)?;
            print!("{}", with_newline(format_note_list(&notes)));
            Ok(())
        }
        NoteCommand::Delete { id } => {
            store.delete_note(&id)?;
            println!("Deleted note {}", id);
            Ok(())
        }
        NoteCommand::Synced { id } => {
            store.mark_note_synced(&id)?;
            println!("Marked note {} as synced", id);
            Ok(())
        }
    }
}

fn run_file(vault: Vault, command: FileCommand) -> Result<()> {
    let store = &vault.store;

    match command {
        FileCommand::Add {
            id,
            name,
            file_type,
            size,
        } => {
            let (file, operation) = match store.get_file(&id)? {
                Some(mut file) => {
                    file.name = name;
                    file.file_type = file_type;
                    file.file_size = size;
                    (file, SyncOperation::Update)
                }
                None => (
                    FileRecord::new(
                        id,
                        vault.config.get_user_id(),
                        name,
                        file_type,
                        size,
                        chrono::Utc::now(),
                    ),
                    SyncOperation::Create,
                ),
            };
            let saved = store.save_file(file, operation)?;
            println!("Saved file {} ({})", saved.id, operation);
            Ok(())
        }
        FileCommand::List { unsynced } => {
            let user_id = vault.config.get_user_id();
            let mut files = if unsynced {
                store.get_unsynced_files()?
            } else {
                store.get_all_files(&user_id)?
            };
            files.retain(|f| f.user_id == user_id);
            files.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
            print!("{}", with_newline(format_file_list(&files)));
            Ok(())
        }
        FileCommand::Delete { id } => {
            store.delete_file(&id)?;
            println!("Deleted file {}", id);
            Ok(())
        }
    }
}

fn run_cache(vault: Vault, command: CacheCommand) -> Result<()> {
    let store = &vault.store;

    match command {
        CacheCommand::Put { url, data, ttl } => {
            let payload: serde_json::Value = serde_json::from_str(&data)?;
            let ttl = ttl.unwrap_or(vault.config.cache.default_ttl_minutes);
            let entry = store.cache_content(&url, payload, ttl)?;
            println!("Cached {} until {}", url, entry.expires_at.to_rfc3339());
            Ok(())
        }
        CacheCommand::Get { url } => {
            match store.get_cached_content(&url)? {
                Some(data) => println!("{}", data),
                None => println!("Not cached"),
            }
            Ok(())
        }
        CacheCommand::Sweep => {
            let removed = store.clear_expired_cache()?;
            println!("Removed {} expired entries", removed);
            Ok(())
        }
    }
}

fn run_pref(vault: Vault, command: PrefCommand) -> Result<()> {
    match command {
        PrefCommand::Set { key, value } => {
            // Plain text is stored as a JSON string
            let value = serde_json::from_str::<serde_json::Value>(&value)
                .unwrap_or(serde_json::Value::String(value));
            vault.store.set_preference(&key, &value)?;
            println!("Set {} = {}", key, value);
            Ok(())
        }
        PrefCommand::Get { key } => {
            match vault.store.get_preference::<serde_json::Value>(&key)? {
                Some(value) => println!("{}", value),
                None => println!("Not set"),
            }
            Ok(())
        }
    }
}

fn run_quiz(vault: Vault, command: QuizCommand) -> Result<()> {
    let storage: Arc<dyn SnapshotStorage> = Arc::new(vault.repo.snapshot_storage());

    match command {
        QuizCommand::Answer {
            quiz_id,
            number,
            answer,
            questions,
        } => {
            let session = match load_saved_quiz(storage.as_ref(), &quiz_id)? {
                Some(snapshot) => QuizSession::from_snapshot(snapshot),
                None => QuizSession::new(
                    quiz_id.clone(),
                    placeholder_questions(questions),
                    QuizSettings {
                        question_count: questions,
                        ..QuizSettings::default()
                    },
                    chrono::Utc::now(),
                ),
            };

            let index = number
                .checked_sub(1)
                .filter(|i| *i < session.answers.len())
                .ok_or_else(|| {
                    VaultError::Config(format!(
                        "Question {} is out of range (quiz has {} questions)",
                        number,
                        session.answers.len()
                    ))
                })?;
            let mut answers = session.answers.clone();
            answers[index] = Some(answer);

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()?;
            let snapshot = runtime.block_on(async {
                let autosave = QuizAutosave::start(
                    session,
                    Arc::clone(&storage),
                    Arc::new(ConsoleNotifier),
                    Arc::new(SystemClock),
                    AutosaveSettings::from(&vault.config.autosave),
                );
                autosave.update_answers(answers, index);
                autosave.force_save()?;
                let snapshot = autosave.load_saved_quiz();
                autosave.stop();
                snapshot
            })?;

            if let Some(snapshot) = snapshot {
                print!("{}", format_snapshot(&snapshot));
            }
            Ok(())
        }
        QuizCommand::Show { quiz_id } => {
            match load_saved_quiz(storage.as_ref(), &quiz_id)? {
                Some(snapshot) => print!("{}", format_snapshot(&snapshot)),
                None => println!("No saved progress for quiz {}", quiz_id),
            }
            Ok(())
        }
        QuizCommand::Clear { quiz_id } => {
            if storage.remove(&quiz_id)? {
                println!("Cleared saved progress for quiz {}", quiz_id);
            } else {
                println!("No saved progress for quiz {}", quiz_id);
            }
            Ok(())
        }
    }
}

fn placeholder_questions(count: usize) -> Vec<QuizQuestion> {
    (1..=count)
        .map(|n| QuizQuestion {
            question: format!("Question {}", n),
            options: Vec::new(),
            correct_answer: String::new(),
            explanation: None,
        })
        .collect()
}
