//! Quiz autosave and recovery
//!
//! Two scheduled tasks feed a single `flush`:
//! - a debounce task that saves once answers have been quiet for the debounce period
//! - an interval task that saves on every tick while unsaved changes exist
//!
//! `flush` runs under a write lock, so overlapping triggers never produce
//! overlapping writes; a trigger that arrives mid-write waits, then writes
//! only if there is still something new. A failed save leaves the previous
//! snapshot in place and waits for the next trigger.

use crate::domain::{Clock, QuizSession, QuizSnapshot, SaveStatus};
use crate::error::Result;
use crate::infrastructure::{AutosaveConfig, Notice, Notifier, SnapshotStorage};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveSettings {
    pub debounce: Duration,
    pub interval: Duration,
    /// 0 disables progress notices
    pub notify_every: usize,
    pub saved_reset: chrono::Duration,
    pub error_reset: chrono::Duration,
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        AutosaveSettings::from(&AutosaveConfig::default())
    }
}

impl From<&AutosaveConfig> for AutosaveSettings {
    fn from(config: &AutosaveConfig) -> Self {
        AutosaveSettings {
            debounce: Duration::from_millis(config.debounce_ms),
            interval: Duration::from_secs(config.interval_secs.max(1)),
            notify_every: config.notify_every,
            saved_reset: chrono::Duration::seconds(2),
            error_reset: chrono::Duration::seconds(3),
        }
    }
}

/// What the host should do when the page (or process) is about to go away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnloadDecision {
    Leave,
    /// There were unsaved changes; ask the user before leaving
    ConfirmLeave,
}

struct SessionState {
    session: QuizSession,
    revision: u64,
    saved_revision: u64,
    last_saved: Option<DateTime<Utc>>,
    notified_milestone: usize,
    status: SaveStatus,
    status_since: DateTime<Utc>,
}

struct Inner {
    storage: Arc<dyn SnapshotStorage>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    settings: AutosaveSettings,
    state: Mutex<SessionState>,
    write_lock: Mutex<()>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn has_unsaved(&self) -> bool {
        let state = self.state();
        state.revision != state.saved_revision
    }

    /// Persist the current session. Returns `Ok(false)` when there was nothing new.
    /// A flush already writing is waited for first.
    fn flush(&self, force: bool) -> Result<bool> {
        let _writing = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.write_snapshot(force)
    }

    fn write_snapshot(&self, force: bool) -> Result<bool> {
        let (snapshot, revision) = {
            let mut state = self.state();
            if !force && state.revision == state.saved_revision {
                return Ok(false);
            }
            let now = self.clock.now();
            let saved_at = match state.last_saved {
                Some(previous) if previous > now => previous,
                _ => now,
            };
            state.status = SaveStatus::Saving;
            state.status_since = now;
            (state.session.snapshot(saved_at), state.revision)
        };

        let outcome = self.storage.save(&snapshot);

        let mut state = self.state();
        state.status_since = self.clock.now();
        match outcome {
            Ok(()) => {
                state.saved_revision = state.saved_revision.max(revision);
                state.last_saved = Some(snapshot.last_saved);
                state.status = SaveStatus::Saved;
                tracing::debug!(
                    quiz_id = %snapshot.quiz_id,
                    question_index = snapshot.question_index,
                    "quiz progress saved"
                );
                Ok(true)
            }
            Err(e) => {
                state.status = SaveStatus::Error;
                tracing::warn!(quiz_id = %snapshot.quiz_id, error = %e, "quiz autosave failed");
                Err(e)
            }
        }
    }

    fn flush_logged(&self) {
        // Failures are already logged and reflected in the status
        let _ = self.flush(false);
    }
}

/// Autosave for one quiz session. Must be started inside a tokio runtime;
/// dropping it cancels both scheduled tasks.
pub struct QuizAutosave {
    inner: Arc<Inner>,
    changes: watch::Sender<u64>,
    tasks: Vec<JoinHandle<()>>,
}

impl QuizAutosave {
    pub fn start(
        session: QuizSession,
        storage: Arc<dyn SnapshotStorage>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        settings: AutosaveSettings,
    ) -> Self {
        // Carry over the previous save time so last_saved never goes backwards
        let last_saved = match storage.load(&session.quiz_id) {
            Ok(previous) => previous.map(|s| s.last_saved),
            Err(e) => {
                tracing::warn!(quiz_id = %session.quiz_id, error = %e, "could not read previous snapshot");
                None
            }
        };
        let notified_milestone = match settings.notify_every {
            0 => 0,
            every => session.answered_count() / every * every,
        };

        let now = clock.now();
        tracing::info!(quiz_id = %session.quiz_id, "quiz autosave started");

        let inner = Arc::new(Inner {
            storage,
            notifier,
            clock,
            settings,
            state: Mutex::new(SessionState {
                session,
                revision: 0,
                saved_revision: 0,
                last_saved,
                notified_milestone,
                status: SaveStatus::Idle,
                status_since: now,
            }),
            write_lock: Mutex::new(()),
        });

        let (changes, receiver) = watch::channel(0u64);
        let tasks = vec![
            tokio::spawn(debounce_loop(Arc::clone(&inner), receiver, settings.debounce)),
            tokio::spawn(interval_loop(Arc::clone(&inner), settings.interval)),
        ];

        QuizAutosave {
            inner,
            changes,
            tasks,
        }
    }

    /// Record new answers and schedule a debounced save
    pub fn update_answers(&self, answers: Vec<Option<String>>, question_index: usize) {
        let (revision, milestone) = {
            let mut state = self.inner.state();
            state.session.answers = answers;
            state.session.question_index = question_index;
            state.revision += 1;

            let answered = state.session.answered_count();
            let every = self.inner.settings.notify_every;
            let milestone = if every > 0
                && answered > 0
                && answered % every == 0
                && answered > state.notified_milestone
            {
                state.notified_milestone = answered;
                Some(answered)
            } else {
                None
            };
            (state.revision, milestone)
        };

        if let Some(answered) = milestone {
            self.inner.notifier.notify(Notice::info(format!(
                "Progress saved: {} questions answered",
                answered
            )));
        }

        self.changes.send_replace(revision);
    }

    /// Save now, bypassing the debounce period. Blocks until any save already
    /// running has finished, then writes the latest answers.
    pub fn force_save(&self) -> Result<bool> {
        self.inner.flush(true)
    }

    /// Synchronous last-chance save before the host goes away
    pub fn before_unload(&self) -> UnloadDecision {
        if !self.inner.has_unsaved() {
            return UnloadDecision::Leave;
        }
        if let Err(e) = self.inner.flush(false) {
            tracing::warn!(error = %e, "save before unload failed");
        }
        UnloadDecision::ConfirmLeave
    }

    /// Latest persisted snapshot for this quiz
    pub fn load_saved_quiz(&self) -> Result<Option<QuizSnapshot>> {
        load_saved_quiz(self.inner.storage.as_ref(), &self.quiz_id())
    }

    /// Delete the snapshot, typically on quiz completion. Pending changes are discarded.
    pub fn clear_saved_quiz(&self) -> Result<bool> {
        {
            let mut state = self.inner.state();
            state.saved_revision = state.revision;
        }
        let quiz_id = self.quiz_id();
        let removed = self.inner.storage.remove(&quiz_id)?;
        tracing::info!(quiz_id = %quiz_id, "cleared saved quiz");
        Ok(removed)
    }

    pub fn status(&self) -> SaveStatus {
        let state = self.inner.state();
        state.status.settle(
            state.status_since,
            self.inner.clock.now(),
            self.inner.settings.saved_reset,
            self.inner.settings.error_reset,
        )
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.inner.has_unsaved()
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.inner.state().last_saved
    }

    pub fn quiz_id(&self) -> String {
        self.inner.state().session.quiz_id.clone()
    }

    /// Cancel the scheduled tasks without saving
    pub fn stop(mut self) {
        self.abort_tasks();
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for QuizAutosave {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

/// Read the last snapshot saved for `quiz_id`
pub fn load_saved_quiz(storage: &dyn SnapshotStorage, quiz_id: &str) -> Result<Option<QuizSnapshot>> {
    storage.load(quiz_id)
}

async fn debounce_loop(inner: Arc<Inner>, mut changes: watch::Receiver<u64>, quiet: Duration) {
    while changes.changed().await.is_ok() {
        // Each further change restarts the quiet period
        loop {
            tokio::select! {
                changed = changes.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = tokio::time::sleep(quiet) => break,
            }
        }
        inner.flush_logged();
    }
}

async fn interval_loop(inner: Arc<Inner>, period: Duration) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    loop {
        ticker.tick().await;
        if inner.has_unsaved() {
            inner.flush_logged();
        }
    }
}
