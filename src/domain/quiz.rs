//! In-progress quiz state and its autosave snapshot

use crate::error::{Result, VaultError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSettings {
    pub difficulty: String,
    pub question_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,
}

impl Default for QuizSettings {
    fn default() -> Self {
        QuizSettings {
            difficulty: "medium".to_string(),
            question_count: 10,
            time_limit_minutes: None,
        }
    }
}

/// Quiz being taken right now
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSession {
    pub quiz_id: String,
    pub questions: Vec<QuizQuestion>,
    pub settings: QuizSettings,
    pub start_time: DateTime<Utc>,
    pub question_index: usize,
    pub answers: Vec<Option<String>>,
}

impl QuizSession {
    pub fn new(
        quiz_id: impl Into<String>,
        questions: Vec<QuizQuestion>,
        settings: QuizSettings,
        start_time: DateTime<Utc>,
    ) -> Self {
        let answers = vec![None; questions.len()];
        QuizSession {
            quiz_id: quiz_id.into(),
            questions,
            settings,
            start_time,
            question_index: 0,
            answers,
        }
    }

    /// Resume from a saved snapshot
    pub fn from_snapshot(snapshot: QuizSnapshot) -> Self {
        QuizSession {
            quiz_id: snapshot.quiz_id,
            questions: snapshot.questions,
            settings: snapshot.settings,
            start_time: snapshot.start_time,
            question_index: snapshot.question_index,
            answers: snapshot.answers,
        }
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    pub fn snapshot(&self, saved_at: DateTime<Utc>) -> QuizSnapshot {
        let elapsed = (saved_at - self.start_time).num_seconds().max(0) as u64;
        QuizSnapshot {
            quiz_id: self.quiz_id.clone(),
            question_index: self.question_index,
            answers: self.answers.clone(),
            start_time: self.start_time,
            elapsed_seconds: elapsed,
            questions: self.questions.clone(),
            settings: self.settings.clone(),
            last_saved: saved_at,
        }
    }
}

/// Persisted state of one quiz; one per quiz id, overwritten on each save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSnapshot {
    pub quiz_id: String,
    pub question_index: usize,
    pub answers: Vec<Option<String>>,
    pub start_time: DateTime<Utc>,
    pub elapsed_seconds: u64,
    pub questions: Vec<QuizQuestion>,
    pub settings: QuizSettings,
    pub last_saved: DateTime<Utc>,
}

/// Quiz ids become file names, so only `[A-Za-z0-9_-]` is accepted
pub fn validate_quiz_id(quiz_id: &str) -> Result<()> {
    let valid = !quiz_id.is_empty()
        && quiz_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(VaultError::InvalidQuizId(quiz_id.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Error,
}

impl SaveStatus {
    /// Status as seen at `now`, given it was entered at `since`.
    /// `Saved` and `Error` fall back to `Idle` once their reset delay passes.
    pub fn settle(
        self,
        since: DateTime<Utc>,
        now: DateTime<Utc>,
        saved_reset: Duration,
        error_reset: Duration,
    ) -> SaveStatus {
        let elapsed = now - since;
        match self {
            SaveStatus::Saved if elapsed >= saved_reset => SaveStatus::Idle,
            SaveStatus::Error if elapsed >= error_reset => SaveStatus::Idle,
            other => other,
        }
    }
}
