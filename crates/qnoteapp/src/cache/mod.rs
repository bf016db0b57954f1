//! # Local Cache
//!
//! This module defines the durable storage abstraction for qnote. The
//! [`LocalCache`] trait is the only thing the rest of the crate knows about
//! persistence.
//!
//! ## What Lives Here
//!
//! - Notes, keyed by note id and scoped by user id.
//! - The [`SyncEngineState`] record: tombstones and the per-user
//!   "bulk unpinned deletion pending" flag.
//!
//! The cache is written synchronously on every mutation. The remote store is
//! only ever brought in line with it by the sync engine.
//!
//! ## Concurrency
//!
//! All methods take `&self`. Implementations guard their state with short
//! locks, so a background reconciliation writing a batch never holds up a list
//! read for longer than one write. Updates to [`SyncEngineState`] go through
//! [`LocalCache::update_sync_state`], which is atomic, so concurrent tombstone
//! flushes cannot lose each other's removals.
//!
//! ## Implementations
//!
//! - [`fs::FsCache`]: JSON files with atomic tmp-then-rename writes.
//! - [`memory::MemCache`]: For testing logic without filesystem I/O.
//!
//! ## Storage Layout
//!
//! ```text
//! <root>/
//! ├── sync_state.json            # Tombstones + bulk flags
//! └── users/
//!     └── {user_id}/notes.json   # Notes by id
//! ```

use crate::error::Result;
use crate::model::{Note, Tombstone};
use crate::sync::state::SyncEngineState;
use std::collections::BTreeSet;

pub mod fs;
pub mod memory;

/// Abstract interface for durable note storage.
pub trait LocalCache: Send + Sync {
    // --- Notes ---

    /// One page of a user's notes, newest first. Pages are zero-based.
    fn fetch(&self, user_id: &str, page: usize, page_size: usize) -> Result<Vec<Note>>;

    /// All of a user's notes matching `predicate`, newest first.
    fn fetch_matching(&self, user_id: &str, predicate: &dyn Fn(&Note) -> bool)
        -> Result<Vec<Note>>;

    /// Get a note by ID
    fn get(&self, user_id: &str, note_id: &str) -> Result<Option<Note>>;

    /// Save a note (create or update)
    fn put(&self, note: &Note) -> Result<()>;

    /// Save many notes in a single write.
    fn put_batch(&self, notes: &[Note]) -> Result<()>;

    /// Delete a note. Returns whether it existed.
    fn delete(&self, note_id: &str, user_id: &str) -> Result<bool>;

    // --- Sync bookkeeping ---

    /// Snapshot of the persisted sync state.
    fn sync_state(&self) -> Result<SyncEngineState>;

    /// Atomically read-modify-write the persisted sync state.
    fn update_sync_state<T>(&self, f: impl FnOnce(&mut SyncEngineState) -> T) -> Result<T>;

    fn tombstones(&self, user_id: &str) -> Result<BTreeSet<Tombstone>> {
        Ok(self.sync_state()?.tombstones_for(user_id))
    }

    fn add_tombstone(&self, tombstone: Tombstone) -> Result<()> {
        self.update_sync_state(|state| {
            state.add_tombstone(tombstone);
        })
    }

    fn remove_tombstone(&self, tombstone: &Tombstone) -> Result<bool> {
        self.update_sync_state(|state| state.remove_tombstone(tombstone))
    }

    fn bulk_unpinned_pending(&self, user_id: &str) -> Result<bool> {
        Ok(self.sync_state()?.bulk_unpinned_pending(user_id))
    }

    fn set_bulk_unpinned_pending(&self, user_id: &str, pending: bool) -> Result<()> {
        self.update_sync_state(|state| state.set_bulk_unpinned_pending(user_id, pending))
    }
}

/// Newest first; ties broken by id so pages never overlap.
pub(crate) fn sort_by_recency(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.id().cmp(b.id()))
    });
}

pub(crate) fn page_of(mut notes: Vec<Note>, page: usize, page_size: usize) -> Vec<Note> {
    sort_by_recency(&mut notes);
    notes
        .into_iter()
        .skip(page.saturating_mul(page_size))
        .take(page_size)
        .collect()
}
