//! List notes use case

use crate::domain::Note;
use crate::error::Result;
use crate::infrastructure::OfflineStore;

/// Notes owned by `user_id`, most recently updated first.
pub fn list_notes(
    store: &OfflineStore,
    user_id: &str,
    unsynced_only: bool,
    limit: Option<usize>,
) -> Result<Vec<Note>> {
    let mut notes = if unsynced_only {
        let mut notes = store.get_unsynced_notes()?;
        notes.retain(|n| n.user_id == user_id);
        notes
    } else {
        store.get_all_notes(user_id)?
    };

    // Store order is key order; re-sort by recency
    notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));

    if let Some(n) = limit {
        notes.truncate(n);
    }

    Ok(notes)
}
