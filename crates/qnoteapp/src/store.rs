//! # Note Store
//!
//! The in-memory, always-sorted list of the signed-in user's notes, written
//! through to the [`LocalCache`] on every mutation.
//!
//! ## Ordering
//!
//! Pinned notes come before unpinned ones, always. Within each group notes are
//! newest first, and ties fall back to the id so two notes never swap places
//! between renders. The list is re-sorted after every mutation.
//!
//! ## Failure Handling
//!
//! The in-memory list is authoritative for the session. When a write-through
//! fails the change is kept, the failure is logged, and an alert is queued.
//! The command layer drains alerts into warning messages with
//! [`NoteStore::take_alerts`].
//!
//! ## Locking
//!
//! Mutations hold one write lock for the in-memory change and its cache write,
//! so the cache sees writes in the same order as the list. Nothing in here
//! talks to the remote store.

use crate::cache::LocalCache;
use crate::model::{Note, Tombstone};
use parking_lot::{Mutex, RwLock};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Display order: pinned first, newest first, then by id.
pub fn display_order(a: &Note, b: &Note) -> Ordering {
    b.is_pinned
        .cmp(&a.is_pinned)
        .then_with(|| b.timestamp.cmp(&a.timestamp))
        .then_with(|| a.id().cmp(b.id()))
}

/// What a pull changed locally.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    pub inserted: usize,
    pub updated: usize,
    pub removed: usize,
    /// Local notes that won over the remote copy and still owe a push.
    pub kept_local: usize,
}

impl MergeReport {
    pub fn changed(&self) -> usize {
        self.inserted + self.updated + self.removed
    }
}

pub struct NoteStore<C: LocalCache> {
    cache: Arc<C>,
    user_id: String,
    page_size: usize,
    notes: RwLock<Vec<Note>>,
    alerts: Mutex<Vec<String>>,
}

impl<C: LocalCache> NoteStore<C> {
    pub fn new(cache: Arc<C>, user_id: impl Into<String>, page_size: usize) -> Self {
        Self {
            cache,
            user_id: user_id.into(),
            page_size: page_size.max(1),
            notes: RwLock::new(Vec::new()),
            alerts: Mutex::new(Vec::new()),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    /// Reads the user's notes from the cache, one page at a time.
    ///
    /// A storage error leaves the list empty and queues an alert.
    pub fn load(&self) -> Vec<Note> {
        let mut loaded = Vec::new();
        let mut page = 0;
        loop {
            match self.cache.fetch(&self.user_id, page, self.page_size) {
                Ok(batch) => {
                    let last = batch.len() < self.page_size;
                    loaded.extend(batch);
                    if last {
                        break;
                    }
                    page += 1;
                }
                Err(e) => {
                    warn!(user_id = %self.user_id, error = %e, "Failed to load notes from cache");
                    self.alert(format!("Could not load notes: {}", e));
                    loaded.clear();
                    break;
                }
            }
        }
        loaded.sort_by(display_order);
        debug!(user_id = %self.user_id, count = loaded.len(), "Loaded notes");
        *self.notes.write() = loaded.clone();
        loaded
    }

    /// Inserts or replaces a note by id.
    pub fn upsert(&self, note: Note) {
        let mut notes = self.notes.write();
        let result = self.cache.put(&note);
        self.check_write(result, note.id());
        match notes.iter_mut().find(|n| n.id() == note.id()) {
            Some(existing) => *existing = note,
            None => notes.push(note),
        }
        notes.sort_by(display_order);
    }

    /// Removes a note. Returns it if it was present.
    pub fn remove(&self, note_id: &str) -> Option<Note> {
        let mut notes = self.notes.write();
        let index = notes.iter().position(|n| n.id() == note_id)?;
        let removed = notes.remove(index);
        let result = self.cache.delete(note_id, &self.user_id).map(|_| ());
        self.check_write(result, note_id);
        Some(removed)
    }

    /// Removes every unpinned note, returning what was removed.
    pub fn remove_unpinned(&self) -> Vec<Note> {
        let mut notes = self.notes.write();
        let (pinned, unpinned): (Vec<Note>, Vec<Note>) =
            notes.drain(..).partition(|n| n.is_pinned);
        *notes = pinned;

        // Notes that never made it into memory (a failed load) go too.
        match self.cache.fetch_matching(&self.user_id, &|n: &Note| !n.is_pinned) {
            Ok(stored) => {
                for note in stored {
                    let result = self.cache.delete(note.id(), &self.user_id).map(|_| ());
                    self.check_write(result, note.id());
                }
            }
            Err(e) => {
                warn!(user_id = %self.user_id, error = %e, "Failed to read unpinned notes from cache");
                self.alert(format!("Could not delete unpinned notes from storage: {}", e));
            }
        }
        unpinned
    }

    pub fn get(&self, note_id: &str) -> Option<Note> {
        self.notes.read().iter().find(|n| n.id() == note_id).cloned()
    }

    /// Atomically modifies one note and writes it through.
    /// Returns the updated note, or `None` if it does not exist.
    pub fn update<F>(&self, note_id: &str, f: F) -> Option<Note>
    where
        F: FnOnce(&mut Note),
    {
        let mut notes = self.notes.write();
        let note = notes.iter_mut().find(|n| n.id() == note_id)?;
        f(note);
        let updated = note.clone();
        let result = self.cache.put(&updated);
        self.check_write(result, note_id);
        notes.sort_by(display_order);
        Some(updated)
    }

    /// Case-insensitive substring search over content.
    /// Blank search text returns everything.
    pub fn query(&self, search: &str) -> Vec<Note> {
        let needle = search.trim().to_lowercase();
        let notes = self.notes.read();
        if needle.is_empty() {
            return notes.clone();
        }
        notes
            .iter()
            .filter(|n| n.content.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn list(&self) -> Vec<Note> {
        self.notes.read().clone()
    }

    pub fn len(&self) -> usize {
        self.notes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.read().is_empty()
    }

    /// Ids of notes reconciliation should push, in display order.
    pub fn pending_ids(&self) -> Vec<String> {
        self.notes
            .read()
            .iter()
            .filter(|n| n.is_pending())
            .map(|n| n.id().to_string())
            .collect()
    }

    /// Applies a complete remote listing under last-write-wins.
    ///
    /// - Remote-only notes are inserted unless tombstoned.
    /// - A strictly newer remote copy replaces the local one. On equal
    ///   timestamps it replaces it only if nothing local is pending.
    /// - Local-only notes survive if they still owe a push; synced ones were
    ///   deleted elsewhere and are dropped.
    /// - Notes listed in `protected` (pushes in flight, unreadable remote
    ///   documents) are left exactly as they are.
    pub fn merge_remote(
        &self,
        remote: Vec<Note>,
        tombstones: &BTreeSet<Tombstone>,
        protected: &HashSet<String>,
    ) -> MergeReport {
        let mut report = MergeReport::default();
        let mut notes = self.notes.write();

        let mut remote_by_id: HashMap<String, Note> = remote
            .into_iter()
            .map(|n| (n.id().to_string(), n))
            .collect();
        let mut changed = Vec::new();
        let mut removed = Vec::new();

        notes.retain_mut(|local| match remote_by_id.remove(local.id()) {
            // A running push will overwrite the remote copy; the next pull
            // settles whichever side is newer then.
            Some(_) if protected.contains(local.id()) => {
                report.kept_local += 1;
                true
            }
            Some(incoming) => {
                let remote_wins = incoming.timestamp > local.timestamp
                    || (incoming.timestamp == local.timestamp && !local.is_pending());
                if remote_wins {
                    if !local.same_revision(&incoming) || local.is_pending() {
                        report.updated += 1;
                    }
                    *local = incoming;
                    changed.push(local.clone());
                } else if local.is_pending() {
                    report.kept_local += 1;
                }
                true
            }
            None if local.is_pending() || protected.contains(local.id()) => true,
            None => {
                removed.push(local.id().to_string());
                report.removed += 1;
                false
            }
        });

        for (id, incoming) in remote_by_id {
            if tombstones.contains(&Tombstone::new(self.user_id.as_str(), id.as_str())) {
                continue;
            }
            report.inserted += 1;
            changed.push(incoming.clone());
            notes.push(incoming);
        }
        notes.sort_by(display_order);

        if !changed.is_empty() {
            let result = self.cache.put_batch(&changed);
            self.check_write(result, "pull");
        }
        for id in &removed {
            let result = self.cache.delete(id, &self.user_id).map(|_| ());
            self.check_write(result, id);
        }
        report
    }

    /// Drains queued storage alerts.
    pub fn take_alerts(&self) -> Vec<String> {
        std::mem::take(&mut *self.alerts.lock())
    }

    pub(crate) fn alert(&self, message: String) {
        self.alerts.lock().push(message);
    }

    fn check_write(&self, result: crate::error::Result<()>, note_id: &str) {
        if let Err(e) = result {
            warn!(user_id = %self.user_id, note_id, error = %e, "Local cache write failed");
            self.alert(format!("Could not save changes to storage: {}", e));
        }
    }
}
