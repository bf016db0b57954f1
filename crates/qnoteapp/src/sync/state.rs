use crate::model::Tombstone;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Durable sync bookkeeping that does not belong to any single note.
///
/// Both pieces are scoped by user id, so signing in as someone else never
/// flushes another user's deletions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEngineState {
    /// Deletions the remote store has not confirmed yet.
    #[serde(default)]
    tombstones: BTreeSet<Tombstone>,

    /// Users whose "delete all unpinned notes" still has to reach the remote store.
    #[serde(default)]
    bulk_unpinned_pending: BTreeSet<String>,
}

impl SyncEngineState {
    pub fn tombstones_for(&self, user_id: &str) -> BTreeSet<Tombstone> {
        self.tombstones
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn has_tombstone(&self, user_id: &str, note_id: &str) -> bool {
        self.tombstones
            .iter()
            .any(|t| t.user_id == user_id && t.note_id == note_id)
    }

    pub fn add_tombstone(&mut self, tombstone: Tombstone) -> bool {
        self.tombstones.insert(tombstone)
    }

    pub fn remove_tombstone(&mut self, tombstone: &Tombstone) -> bool {
        self.tombstones.remove(tombstone)
    }

    pub fn bulk_unpinned_pending(&self, user_id: &str) -> bool {
        self.bulk_unpinned_pending.contains(user_id)
    }

    pub fn set_bulk_unpinned_pending(&mut self, user_id: &str, pending: bool) {
        if pending {
            self.bulk_unpinned_pending.insert(user_id.to_string());
        } else {
            self.bulk_unpinned_pending.remove(user_id);
        }
    }
}
