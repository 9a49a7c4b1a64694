//! Output formatting utilities

use crate::domain::{FileRecord, Note, QuizSnapshot, SyncQueueEntry};
use crate::infrastructure::StorageStats;

fn sync_marker(synced: bool, pending: Option<crate::domain::SyncOperation>) -> String {
    match (synced, pending) {
        (true, _) => "synced".to_string(),
        (false, Some(op)) => format!("pending:{}", op),
        (false, None) => "pending".to_string(),
    }
}

/// Format a list of notes for display
pub fn format_note_list(notes: &[Note]) -> String {
    if notes.is_empty() {
        return "No notes found".to_string();
    }

    let mut output = String::new();
    for note in notes {
        output.push_str(&format!(
            "{}  {:<16} {}  [{}]\n",
            note.updated_at.format("%d-%m-%Y %H:%M"),
            note.id,
            note.title,
            sync_marker(note.synced, note.pending_operation)
        ));
    }
    output
}

pub fn format_file_list(files: &[FileRecord]) -> String {
    if files.is_empty() {
        return "No files found".to_string();
    }

    let mut output = String::new();
    for file in files {
        output.push_str(&format!(
            "{:<16} {} ({} bytes, {})  [{}]\n",
            file.id,
            file.name,
            file.file_size,
            file.file_type,
            sync_marker(file.synced, file.pending_operation)
        ));
    }
    output
}

pub fn format_queue(entries: &[SyncQueueEntry]) -> String {
    if entries.is_empty() {
        return "Sync queue is empty".to_string();
    }

    let mut output = String::new();
    for entry in entries {
        output.push_str(&format!(
            "{}  {} {}/{}",
            entry.created_at.format("%d-%m-%Y %H:%M:%S"),
            entry.operation,
            entry.entity_type(),
            entry.entity_id()
        ));
        if entry.retry_count > 0 {
            output.push_str(&format!("  retries={}", entry.retry_count));
        }
        if let Some(err) = &entry.last_error {
            output.push_str(&format!("  last_error={}", err));
        }
        output.push('\n');
    }
    output
}

pub fn format_stats(stats: &StorageStats) -> String {
    format!(
        "notes: {}\nfiles: {}\nsync_queue: {}\npreferences: {}\ncache: {}\n",
        stats.notes, stats.files, stats.sync_queue, stats.preferences, stats.cache
    )
}

pub fn format_snapshot(snapshot: &QuizSnapshot) -> String {
    let answered = snapshot.answers.iter().filter(|a| a.is_some()).count();
    let mut output = format!(
        "Quiz {}\nQuestion: {}/{}\nAnswered: {}\nElapsed: {}s\nLast saved: {}\n",
        snapshot.quiz_id,
        snapshot.question_index + 1,
        snapshot.answers.len(),
        answered,
        snapshot.elapsed_seconds,
        snapshot.last_saved.to_rfc3339()
    );
    for (i, answer) in snapshot.answers.iter().enumerate() {
        output.push_str(&format!(
            "  {:>2}. {}\n",
            i + 1,
            answer.as_deref().unwrap_or("-")
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{QuizSession, QuizSettings, SyncEntity, SyncOperation};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_format_empty_lists() {
        assert_eq!(format_note_list(&[]), "No notes found");
        assert_eq!(format_file_list(&[]), "No files found");
        assert_eq!(format_queue(&[]), "Sync queue is empty");
    }

    #[test]
    fn test_format_note_list_marks_pending() {
        let at = Utc.with_ymd_and_hms(2025, 1, 17, 8, 30, 0).unwrap();
        let mut note = Note::new("n1", "u1", "Krebs cycle", "", at);
        note.pending_operation = Some(SyncOperation::Create);

        let output = format_note_list(&[note]);
        assert!(output.contains("17-01-2025 08:30"));
        assert!(output.contains("Krebs cycle"));
        assert!(output.contains("[pending:create]"));
    }

    #[test]
    fn test_format_queue_shows_retries() {
        let at = Utc.with_ymd_and_hms(2025, 1, 17, 8, 30, 0).unwrap();
        let mut entry = SyncQueueEntry::new(
            SyncEntity::Note(Note::new("n1", "u1", "x", "", at)),
            SyncOperation::Update,
            at,
        );
        entry.retry_count = 2;
        entry.last_error = Some("offline".to_string());

        let output = format_queue(&[entry]);
        assert!(output.contains("update note/n1"));
        assert!(output.contains("retries=2"));
        assert!(output.contains("last_error=offline"));
    }

    #[test]
    fn test_format_snapshot() {
        let at = Utc.with_ymd_and_hms(2025, 1, 17, 8, 30, 0).unwrap();
        let mut session = QuizSession::new("q1", Vec::new(), QuizSettings::default(), at);
        session.answers = vec![None, Some("B".to_string()), None];
        session.question_index = 1;

        let output = format_snapshot(&session.snapshot(at));
        assert!(output.contains("Question: 2/3"));
        assert!(output.contains("Answered: 1"));
        assert!(output.contains("2. B"));
    }
}
