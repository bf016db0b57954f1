use super::{sort_by_recency, LocalCache};
use crate::error::{QnoteError, Result};
use crate::model::Note;
use crate::sync::state::SyncEngineState;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const NOTES_FILE: &str = "notes.json";
const SYNC_STATE_FILE: &str = "sync_state.json";

/// File-backed cache: one JSON index per user plus one sync state record.
///
/// Every write replaces the whole file through a temp file and a rename, so a
/// crash mid-write leaves the previous version in place.
///
/// Paging reads the file once: page 0 takes a sorted listing and later pages
/// are cut from it until the next write.
pub struct FsCache {
    root: PathBuf,
    // Serializes read-modify-write cycles on the files below `root`.
    lock: RwLock<()>,
    // User id and sorted notes behind the last page-0 fetch.
    listing: Mutex<Option<(String, Vec<Note>)>>,
}

impl FsCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: RwLock::new(()),
            listing: Mutex::new(None),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, user_id: &str) -> Result<PathBuf> {
        let valid = !user_id.is_empty()
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && user_id != "."
            && user_id != "..";
        if !valid {
            return Err(QnoteError::Store(format!(
                "User id cannot be used as a directory name: {}",
                user_id
            )));
        }
        Ok(self.root.join("users").join(user_id))
    }

    fn load_index(&self, user_id: &str) -> Result<HashMap<String, Note>> {
        let path = self.user_dir(user_id)?.join(NOTES_FILE);
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(path).map_err(QnoteError::Io)?;
        let index: HashMap<String, Note> =
            serde_json::from_str(&content).map_err(QnoteError::Serialization)?;
        Ok(index)
    }

    fn save_index(&self, user_id: &str, index: &HashMap<String, Note>) -> Result<()> {
        *self.listing.lock() = None;
        let dir = self.user_dir(user_id)?;
        let content = serde_json::to_string_pretty(index).map_err(QnoteError::Serialization)?;
        write_atomic(&dir, NOTES_FILE, &content)
    }

    fn load_state(&self) -> Result<SyncEngineState> {
        let path = self.root.join(SYNC_STATE_FILE);
        if !path.exists() {
            return Ok(SyncEngineState::default());
        }
        let content = fs::read_to_string(path).map_err(QnoteError::Io)?;
        let state = serde_json::from_str(&content).map_err(QnoteError::Serialization)?;
        Ok(state)
    }

    fn save_state(&self, state: &SyncEngineState) -> Result<()> {
        let content = serde_json::to_string_pretty(state).map_err(QnoteError::Serialization)?;
        write_atomic(&self.root, SYNC_STATE_FILE, &content)
    }
}

fn write_atomic(dir: &Path, file_name: &str, content: &str) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(QnoteError::Io)?;
    }
    let tmp_file = dir.join(format!(".{}-{}.tmp", file_name, Uuid::new_v4()));
    fs::write(&tmp_file, content).map_err(QnoteError::Io)?;
    fs::rename(&tmp_file, dir.join(file_name)).map_err(QnoteError::Io)?;
    Ok(())
}

impl LocalCache for FsCache {
    fn fetch(&self, user_id: &str, page: usize, page_size: usize) -> Result<Vec<Note>> {
        let _guard = self.lock.read();
        let mut listing = self.listing.lock();
        let stale = page == 0 || !matches!(listing.as_ref(), Some((user, _)) if user == user_id);
        if stale {
            let mut notes: Vec<Note> = self.load_index(user_id)?.into_values().collect();
            sort_by_recency(&mut notes);
            *listing = Some((user_id.to_string(), notes));
        }
        let notes = listing.as_ref().map(|(_, notes)| notes.as_slice()).unwrap_or(&[]);
        Ok(notes
            .iter()
            .skip(page.saturating_mul(page_size))
            .take(page_size)
            .cloned()
            .collect())
    }

    fn fetch_matching(
        &self,
        user_id: &str,
        predicate: &dyn Fn(&Note) -> bool,
    ) -> Result<Vec<Note>> {
        let _guard = self.lock.read();
        let mut notes: Vec<Note> = self
            .load_index(user_id)?
            .into_values()
            .filter(|note| predicate(note))
            .collect();
        sort_by_recency(&mut notes);
        Ok(notes)
    }

    fn get(&self, user_id: &str, note_id: &str) -> Result<Option<Note>> {
        let _guard = self.lock.read();
        Ok(self.load_index(user_id)?.remove(note_id))
    }

    fn put(&self, note: &Note) -> Result<()> {
        self.put_batch(std::slice::from_ref(note))
    }

    fn put_batch(&self, notes: &[Note]) -> Result<()> {
        let _guard = self.lock.write();
        let mut by_user: HashMap<&str, Vec<&Note>> = HashMap::new();
        for note in notes {
            by_user.entry(note.user_id()).or_default().push(note);
        }
        for (user_id, notes) in by_user {
            let mut index = self.load_index(user_id)?;
            for note in notes {
                index.insert(note.id().to_string(), note.clone());
            }
            self.save_index(user_id, &index)?;
        }
        Ok(())
    }

    fn delete(&self, note_id: &str, user_id: &str) -> Result<bool> {
        let _guard = self.lock.write();
        let mut index = self.load_index(user_id)?;
        if index.remove(note_id).is_none() {
            return Ok(false);
        }
        self.save_index(user_id, &index)?;
        Ok(true)
    }

    fn sync_state(&self) -> Result<SyncEngineState> {
        let _guard = self.lock.read();
        self.load_state()
    }

    fn update_sync_state<T>(&self, f: impl FnOnce(&mut SyncEngineState) -> T) -> Result<T> {
        let _guard = self.lock.write();
        let mut state = self.load_state()?;
        let value = f(&mut state);
        self.save_state(&state)?;
        Ok(value)
    }
}
