use super::{page_of, sort_by_recency, LocalCache};
use crate::error::{QnoteError, Result};
use crate::model::Note;
use crate::sync::state::SyncEngineState;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory cache for testing.
///
/// Write-error simulation lets tests exercise the "storage failed, keep going"
/// paths without a real disk.
#[derive(Default)]
pub struct MemCache {
    notes: RwLock<HashMap<String, HashMap<String, Note>>>,
    state: Mutex<SyncEngineState>,
    simulate_write_error: AtomicBool,
}

impl MemCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(QnoteError::Store("Simulated write error".to_string()));
        }
        Ok(())
    }

    fn all_notes(&self, user_id: &str) -> Vec<Note> {
        self.notes
            .read()
            .get(user_id)
            .map(|notes| notes.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl LocalCache for MemCache {
    fn fetch(&self, user_id: &str, page: usize, page_size: usize) -> Result<Vec<Note>> {
        Ok(page_of(self.all_notes(user_id), page, page_size))
    }

    fn fetch_matching(
        &self,
        user_id: &str,
        predicate: &dyn Fn(&Note) -> bool,
    ) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .all_notes(user_id)
            .into_iter()
            .filter(|note| predicate(note))
            .collect();
        sort_by_recency(&mut notes);
        Ok(notes)
    }

    fn get(&self, user_id: &str, note_id: &str) -> Result<Option<Note>> {
        Ok(self
            .notes
            .read()
            .get(user_id)
            .and_then(|notes| notes.get(note_id))
            .cloned())
    }

    fn put(&self, note: &Note) -> Result<()> {
        self.put_batch(std::slice::from_ref(note))
    }

    fn put_batch(&self, notes: &[Note]) -> Result<()> {
        self.check_writable()?;
        let mut all = self.notes.write();
        for note in notes {
            all.entry(note.user_id().to_string())
                .or_default()
                .insert(note.id().to_string(), note.clone());
        }
        Ok(())
    }

    fn delete(&self, note_id: &str, user_id: &str) -> Result<bool> {
        self.check_writable()?;
        let mut all = self.notes.write();
        Ok(all
            .get_mut(user_id)
            .map(|notes| notes.remove(note_id).is_some())
            .unwrap_or(false))
    }

    fn sync_state(&self) -> Result<SyncEngineState> {
        Ok(self.state.lock().clone())
    }

    fn update_sync_state<T>(&self, f: impl FnOnce(&mut SyncEngineState) -> T) -> Result<T> {
        self.check_writable()?;
        let mut state = self.state.lock();
        Ok(f(&mut state))
    }
}
