//! Quiz autosave timing scenarios, run on a paused tokio clock

use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use studyvault::application::{AutosaveSettings, QuizAutosave, UnloadDecision};
use studyvault::domain::{ManualClock, QuizQuestion, QuizSession, QuizSettings, QuizSnapshot};
use studyvault::error::Result;
use studyvault::infrastructure::{
    MemorySnapshotStorage, NoticeLevel, RecordingNotifier, SnapshotStorage,
};

/// Wraps the in-memory storage and counts writes
#[derive(Default)]
struct CountingStorage {
    inner: MemorySnapshotStorage,
    saves: AtomicUsize,
}

impl CountingStorage {
    fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SnapshotStorage for CountingStorage {
    fn save(&self, snapshot: &QuizSnapshot) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(snapshot)
    }

    fn load(&self, quiz_id: &str) -> Result<Option<QuizSnapshot>> {
        self.inner.load(quiz_id)
    }

    fn remove(&self, quiz_id: &str) -> Result<bool> {
        self.inner.remove(quiz_id)
    }
}

struct Fixture {
    autosave: QuizAutosave,
    storage: Arc<CountingStorage>,
    notifier: Arc<RecordingNotifier>,
}

fn questions(count: usize) -> Vec<QuizQuestion> {
    (1..=count)
        .map(|n| QuizQuestion {
            question: format!("Question {}", n),
            options: vec!["A".into(), "B".into(), "C".into()],
            correct_answer: "A".into(),
            explanation: None,
        })
        .collect()
}

fn start(quiz_id: &str, count: usize) -> Fixture {
    let start_time = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
    let storage = Arc::new(CountingStorage::default());
    let notifier = Arc::new(RecordingNotifier::new());
    let autosave = QuizAutosave::start(
        QuizSession::new(quiz_id, questions(count), QuizSettings::default(), start_time),
        storage.clone(),
        notifier.clone(),
        Arc::new(ManualClock::new(start_time)),
        AutosaveSettings::default(),
    );
    Fixture {
        autosave,
        storage,
        notifier,
    }
}

async fn sleep_secs(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

#[tokio::test(start_paused = true)]
async fn test_debounced_save_after_quiet_period() {
    let f = start("q1", 3);

    f.autosave
        .update_answers(vec![None, Some("B".into()), None], 1);

    sleep_secs(1).await;
    assert_eq!(f.storage.load("q1").unwrap(), None);
    assert!(f.autosave.has_unsaved_changes());

    sleep_secs(2).await;
    let snapshot = f.storage.load("q1").unwrap().expect("snapshot saved");
    assert_eq!(snapshot.answers, vec![None, Some("B".to_string()), None]);
    assert_eq!(snapshot.question_index, 1);
    assert!(!f.autosave.has_unsaved_changes());
}

#[tokio::test(start_paused = true)]
async fn test_rapid_edits_collapse_into_one_write() {
    let f = start("q1", 3);

    for i in 0..5 {
        let answer = format!("draft-{}", i);
        f.autosave.update_answers(vec![Some(answer), None, None], 0);
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    assert_eq!(f.storage.saves(), 0);

    sleep_secs(3).await;
    assert_eq!(f.storage.saves(), 1);
    let snapshot = f.storage.load("q1").unwrap().unwrap();
    assert_eq!(snapshot.answers[0].as_deref(), Some("draft-4"));
}

#[tokio::test(start_paused = true)]
async fn test_interval_saves_during_continuous_editing() {
    let f = start("q1", 3);

    // An edit every second keeps the debounce from ever firing
    for i in 0..29 {
        f.autosave
            .update_answers(vec![Some(format!("a{}", i)), None, None], 0);
        sleep_secs(1).await;
    }
    assert_eq!(f.storage.saves(), 0);

    for i in 29..32 {
        f.autosave
            .update_answers(vec![Some(format!("a{}", i)), None, None], 0);
        sleep_secs(1).await;
    }
    assert_eq!(f.storage.saves(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_interval_skips_when_nothing_changed() {
    let f = start("q1", 3);

    sleep_secs(95).await;
    assert_eq!(f.storage.saves(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_before_unload_decision() {
    let f = start("q1", 3);
    assert_eq!(f.autosave.before_unload(), UnloadDecision::Leave);

    f.autosave
        .update_answers(vec![Some("C".into()), None, None], 0);
    assert_eq!(f.autosave.before_unload(), UnloadDecision::ConfirmLeave);

    // The last-chance save went through
    let snapshot = f.storage.load("q1").unwrap().unwrap();
    assert_eq!(snapshot.answers[0].as_deref(), Some("C"));
    assert_eq!(f.autosave.before_unload(), UnloadDecision::Leave);
}

#[tokio::test(start_paused = true)]
async fn test_progress_notice_every_five_answers() {
    let f = start("q1", 12);
    let mut answers: Vec<Option<String>> = vec![None; 12];

    for i in 0..10 {
        answers[i] = Some("A".into());
        f.autosave.update_answers(answers.clone(), i);
    }
    // Re-sending the same five-answer milestone does not notify again
    answers[9] = None;
    f.autosave.update_answers(answers.clone(), 9);
    answers[9] = Some("B".into());
    f.autosave.update_answers(answers.clone(), 9);

    let notices = f.notifier.notices();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|n| n.level == NoticeLevel::Info));
    assert!(notices[0].message.contains("5 questions answered"));
    assert!(notices[1].message.contains("10 questions answered"));
}

#[tokio::test(start_paused = true)]
async fn test_force_save_bypasses_debounce() {
    let f = start("q1", 3);

    f.autosave
        .update_answers(vec![Some("A".into()), Some("B".into()), None], 2);
    assert!(f.autosave.force_save().unwrap());

    let snapshot = f.autosave.load_saved_quiz().unwrap().unwrap();
    assert_eq!(snapshot.question_index, 2);
    assert!(f.autosave.last_saved().is_some());

    // The pending debounce finds nothing new to write
    sleep_secs(3).await;
    assert_eq!(f.storage.saves(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_clear_removes_snapshot() {
    let f = start("q1", 3);
    f.autosave
        .update_answers(vec![Some("A".into()), None, None], 0);
    f.autosave.force_save().unwrap();

    assert!(f.autosave.clear_saved_quiz().unwrap());
    assert_eq!(f.autosave.load_saved_quiz().unwrap(), None);
    assert!(!f.autosave.clear_saved_quiz().unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_stopped_autosave_writes_nothing() {
    let f = start("q1", 3);
    f.autosave
        .update_answers(vec![Some("A".into()), None, None], 0);
    let storage = f.storage.clone();
    f.autosave.stop();

    sleep_secs(40).await;
    assert_eq!(storage.saves(), 0);
}
