//! # Remote Store Port
//!
//! The remote document store is consumed through the async [`RemoteStore`]
//! trait. Every call resolves to `Result<_, SyncError>`; the sync engine turns
//! failures into "stay pending, retry at the next reconciliation".
//!
//! ## Namespaces
//!
//! - **User notes**: `users/{user_id}/notes/{note_id}` holding a [`RemoteNote`].
//!   Only user-visible fields travel; sync bookkeeping never leaves the device.
//! - **Public notes**: `public/{public_id}` holding a [`PublicNote`], the copy
//!   readable by anyone with the link.
//!
//! ## Pagination
//!
//! `list_notes` is cursor-paginated. Documents are ordered newest first with
//! ties broken by id, and a [`PageCursor`] names the last document of the
//! previous page. Pages never overlap and nothing is fetched twice.
//!
//! ## Implementations
//!
//! - [`fs::FsRemote`]: a directory standing in for the remote store.
//! - [`memory::MemRemote`]: For tests, with call counters and failure injection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::model::Note;

pub mod fs;
pub mod memory;

/// A note as stored remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteNote {
    pub id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
}

impl From<&Note> for RemoteNote {
    fn from(note: &Note) -> Self {
        Self {
            id: note.id().to_string(),
            content: note.content.clone(),
            timestamp: note.timestamp,
            is_pinned: note.is_pinned,
            is_public: note.is_public(),
            public_id: note.public_id().map(str::to_string),
        }
    }
}

impl RemoteNote {
    /// Converts a pulled document into a local note owned by `user_id`.
    pub fn into_note(self, user_id: &str) -> Result<Note, SyncError> {
        let id = self.id.clone();
        Note::from_remote_parts(
            self.id,
            user_id,
            self.content,
            self.timestamp,
            self.is_pinned,
            self.is_public,
            self.public_id,
        )
        .map_err(|e| SyncError::Malformed(format!("{}: {}", id, e)))
    }

    pub fn cursor(&self) -> PageCursor {
        PageCursor {
            timestamp: self.timestamp,
            id: self.id.clone(),
        }
    }
}

/// The publicly readable copy of a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicNote {
    pub public_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
}

impl PublicNote {
    /// The public copy of `note`, or `None` while the note is private.
    pub fn from_note(note: &Note) -> Option<Self> {
        note.public_id().map(|public_id| Self {
            public_id: public_id.to_string(),
            content: note.content.clone(),
            timestamp: note.timestamp,
            user_id: note.user_id().to_string(),
        })
    }
}

/// Position after the last document of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub timestamp: DateTime<Utc>,
    pub id: String,
}

impl PageCursor {
    fn admits(&self, note: &RemoteNote) -> bool {
        note.timestamp < self.timestamp || (note.timestamp == self.timestamp && note.id > self.id)
    }
}

/// Abstract interface for the remote document store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Create or overwrite a user's note.
    async fn put_note(&self, user_id: &str, note: &Note) -> Result<(), SyncError>;

    /// Delete a user's note. Deleting a missing note succeeds.
    async fn delete_note(&self, user_id: &str, note_id: &str) -> Result<(), SyncError>;

    /// Up to `limit` notes, newest first, strictly after `after`.
    async fn list_notes(
        &self,
        user_id: &str,
        limit: usize,
        after: Option<&PageCursor>,
    ) -> Result<Vec<RemoteNote>, SyncError>;

    /// Delete every unpinned note of a user. Returns how many were removed.
    async fn delete_unpinned(&self, user_id: &str) -> Result<usize, SyncError>;

    async fn publish_note(&self, note: &PublicNote) -> Result<(), SyncError>;

    async fn unpublish_note(&self, public_id: &str) -> Result<(), SyncError>;
}

/// Orders a full listing and cuts the page that follows `after`.
pub(crate) fn page_after(
    mut notes: Vec<RemoteNote>,
    limit: usize,
    after: Option<&PageCursor>,
) -> Vec<RemoteNote> {
    notes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
    notes
        .into_iter()
        .filter(|note| after.map_or(true, |cursor| cursor.admits(note)))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn remote(id: &str, minutes: i64) -> RemoteNote {
        let base = Utc.with_ymd_and_hms(2024, 10, 3, 9, 0, 0).unwrap();
        RemoteNote {
            id: id.to_string(),
            content: id.to_string(),
            timestamp: base + Duration::minutes(minutes),
            is_pinned: false,
            is_public: false,
            public_id: None,
        }
    }

    #[test]
    fn test_cursor_pages_do_not_overlap() {
        let notes = vec![remote("a", 1), remote("b", 2), remote("c", 2), remote("d", 3)];

        let first = page_after(notes.clone(), 2, None);
        let ids: Vec<&str> = first.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b"]);

        let cursor = first.last().unwrap().cursor();
        let second = page_after(notes.clone(), 2, Some(&cursor));
        let ids: Vec<&str> = second.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);

        let cursor = second.last().unwrap().cursor();
        assert!(page_after(notes, 2, Some(&cursor)).is_empty());
    }

    #[test]
    fn test_into_note_is_synced() {
        let note = remote("a", 1).into_note("alice").unwrap();
        assert_eq!(note.user_id(), "alice");
        assert_eq!(note.sync_state(), crate::model::SyncState::Synced);
        assert!(!note.needs_sync());
    }

    #[test]
    fn test_into_note_rejects_broken_publication() {
        let mut doc = remote("a", 1);
        doc.is_public = true;
        let err = doc.into_note("alice").unwrap_err();
        assert!(matches!(err, SyncError::Malformed(_)));
    }

    #[test]
    fn test_remote_note_carries_no_bookkeeping() {
        let note = Note::new("alice", "x");
        let json = serde_json::to_value(RemoteNote::from(&note)).unwrap();
        assert!(json.get("syncState").is_none());
        assert!(json.get("needsSync").is_none());
        assert!(json.get("userId").is_none());
    }

    #[test]
    fn test_public_note_only_for_public_notes() {
        let mut note = Note::new("alice", "x");
        assert!(PublicNote::from_note(&note).is_none());
        note.publish("p1").unwrap();
        let public = PublicNote::from_note(&note).unwrap();
        assert_eq!(public.public_id, "p1");
        assert_eq!(public.user_id, "alice");
    }
}
