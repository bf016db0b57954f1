//! # Domain Model: Notes, Sync State and Tombstones
//!
//! This module defines the core data structures for qnote: [`Note`], [`SyncState`]
//! and [`Tombstone`].
//!
//! ## Two Flags, One Question
//!
//! Every note carries two pieces of sync bookkeeping:
//!
//! - `sync_state` answers "does the remote store hold what I hold?" and is what a
//!   UI shows as the per-note indicator.
//! - `needs_sync` answers "is a push still owed?".
//!
//! They are related but not redundant. An oversized note is `NotSynced` forever
//! and yet owes nothing (`needs_sync == false`), because it will never be pushed.
//!
//! ```text
//!              edit / pin / publish
//!   Synced ───────────────────────────► NotSynced (needs_sync)
//!     ▲                                     │
//!     │ push ok                push starts  │
//!     └────────────── Syncing ◄─────────────┘
//!                        │
//!                        └── push failed ──► NotSynced (needs_sync)
//! ```
//!
//! The fields are private: state only moves through the `mark_*` methods, so
//! `Synced` with `needs_sync == true` cannot be built.
//!
//! ## Publication
//!
//! `public_id` is present if and only if the note is public. This is checked
//! when publishing and again when a persisted record is read back; a record that
//! violates it fails to deserialize instead of leaking into the list.
//!
//! ## Size Ceiling
//!
//! Content longer than the configured ceiling (800,000 characters by default,
//! counted as Unicode scalar values) is never sent to the remote store. Such a
//! note is parked in `NotSynced` with nothing owed.
//!
//! ## Tombstones
//!
//! A [`Tombstone`] records a deletion the remote store has not confirmed yet.
//! It is persisted as the string `"{user_id}:{note_id}"`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{QnoteError, Result};

/// Maximum note length (in characters) eligible for remote sync.
pub const DEFAULT_CONTENT_CEILING: usize = 800_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncState {
    #[default]
    NotSynced,
    Syncing,
    Synced,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::NotSynced => write!(f, "not synced"),
            SyncState::Syncing => write!(f, "syncing"),
            SyncState::Synced => write!(f, "synced"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_pinned: bool,
    user_id: String,
    sync_state: SyncState,
    needs_sync: bool,
    is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    public_id: Option<String>,
}

// Records written before `syncState` existed only carry `needsSync`; for those,
// a note with nothing owed was in agreement with the remote store.
impl<'de> Deserialize<'de> for Note {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let helper = NoteHelper::deserialize(deserializer)?;

        let sync_state = helper.sync_state.unwrap_or(if helper.needs_sync {
            SyncState::NotSynced
        } else {
            SyncState::Synced
        });
        if sync_state == SyncState::Synced && helper.needs_sync {
            return Err(serde::de::Error::custom(format!(
                "note {} is synced but still needs sync",
                helper.id
            )));
        }
        validate_publication(helper.is_public, helper.public_id.as_deref())
            .map_err(serde::de::Error::custom)?;

        Ok(Note {
            id: helper.id,
            content: helper.content,
            timestamp: helper.timestamp,
            is_pinned: helper.is_pinned,
            user_id: helper.user_id,
            sync_state,
            needs_sync: helper.needs_sync,
            is_public: helper.is_public,
            public_id: helper.public_id,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteHelper {
    id: String,
    content: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    is_pinned: bool,
    user_id: String,
    #[serde(default)]
    sync_state: Option<SyncState>,
    #[serde(default)]
    needs_sync: bool,
    #[serde(default)]
    is_public: bool,
    #[serde(default)]
    public_id: Option<String>,
}

fn validate_publication(is_public: bool, public_id: Option<&str>) -> Result<()> {
    match (is_public, public_id) {
        (true, Some(id)) if !id.is_empty() => Ok(()),
        (true, _) => Err(QnoteError::InvalidNote(
            "public note is missing its public id".to_string(),
        )),
        (false, Some(_)) => Err(QnoteError::InvalidNote(
            "private note carries a public id".to_string(),
        )),
        (false, None) => Ok(()),
    }
}

impl Note {
    /// A fresh local note. It owes a push from the moment it exists.
    pub fn new(user_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_id(
            Uuid::new_v4().to_string(),
            user_id,
            content,
            Utc::now(),
        )
    }

    pub fn with_id(
        id: impl Into<String>,
        user_id: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            timestamp,
            is_pinned: false,
            user_id: user_id.into(),
            sync_state: SyncState::NotSynced,
            needs_sync: true,
            is_public: false,
            public_id: None,
        }
    }

    /// Rebuilds a note from a remote document. Pulled notes agree with the
    /// remote store by definition.
    pub(crate) fn from_remote_parts(
        id: String,
        user_id: &str,
        content: String,
        timestamp: DateTime<Utc>,
        is_pinned: bool,
        is_public: bool,
        public_id: Option<String>,
    ) -> Result<Self> {
        validate_publication(is_public, public_id.as_deref())?;
        Ok(Self {
            id,
            content,
            timestamp,
            is_pinned,
            user_id: user_id.to_string(),
            sync_state: SyncState::Synced,
            needs_sync: false,
            is_public,
            public_id,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync_state
    }

    pub fn needs_sync(&self) -> bool {
        self.needs_sync
    }

    pub fn is_public(&self) -> bool {
        self.is_public
    }

    pub fn public_id(&self) -> Option<&str> {
        self.public_id.as_deref()
    }

    /// First non-empty line, used for listings.
    pub fn title(&self) -> &str {
        self.content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("")
    }

    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn exceeds_ceiling(&self, ceiling: usize) -> bool {
        self.content_len() > ceiling
    }

    /// Whether reconciliation should look at this note.
    pub fn is_pending(&self) -> bool {
        self.needs_sync || self.sync_state == SyncState::NotSynced
    }

    /// Replaces the content and stamps the edit.
    pub fn edit(&mut self, content: impl Into<String>, at: DateTime<Utc>) {
        self.content = content.into();
        self.timestamp = at;
        self.mark_pending();
    }

    pub fn publish(&mut self, public_id: impl Into<String>) -> Result<()> {
        let public_id = public_id.into();
        validate_publication(true, Some(&public_id))?;
        self.is_public = true;
        self.public_id = Some(public_id);
        Ok(())
    }

    /// Makes the note private again, returning the public id it had.
    pub fn unpublish(&mut self) -> Option<String> {
        self.is_public = false;
        self.public_id.take()
    }

    pub fn mark_pending(&mut self) {
        self.sync_state = SyncState::NotSynced;
        self.needs_sync = true;
    }

    pub fn mark_syncing(&mut self) {
        self.sync_state = SyncState::Syncing;
        self.needs_sync = true;
    }

    pub fn mark_synced(&mut self) {
        self.sync_state = SyncState::Synced;
        self.needs_sync = false;
    }

    pub fn mark_oversized(&mut self) {
        self.sync_state = SyncState::NotSynced;
        self.needs_sync = false;
    }

    /// True when both notes carry the same user-visible data, ignoring sync
    /// bookkeeping.
    pub fn same_revision(&self, other: &Note) -> bool {
        self.id == other.id
            && self.content == other.content
            && self.timestamp == other.timestamp
            && self.is_pinned == other.is_pinned
            && self.is_public == other.is_public
            && self.public_id == other.public_id
    }
}

/// A deletion not yet confirmed by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tombstone {
    pub user_id: String,
    pub note_id: String,
}

impl Tombstone {
    pub fn new(user_id: impl Into<String>, note_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            note_id: note_id.into(),
        }
    }
}

impl fmt::Display for Tombstone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_id, self.note_id)
    }
}

impl FromStr for Tombstone {
    type Err = String;

    // Note ids never contain ':', user ids might.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.rsplit_once(':') {
            Some((user_id, note_id)) if !user_id.is_empty() && !note_id.is_empty() => {
                Ok(Tombstone::new(user_id, note_id))
            }
            _ => Err(format!("Invalid tombstone key: {}", s)),
        }
    }
}

impl Serialize for Tombstone {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Tombstone {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_note_owes_a_push() {
        let note = Note::new("alice", "Groceries");
        assert_eq!(note.user_id(), "alice");
        assert_eq!(note.sync_state(), SyncState::NotSynced);
        assert!(note.needs_sync());
        assert!(!note.is_public());
        assert!(note.public_id().is_none());
        assert!(note.is_pending());
    }

    #[test]
    fn test_state_transitions_keep_synced_consistent() {
        let mut note = Note::new("alice", "x");
        note.mark_syncing();
        assert_eq!(note.sync_state(), SyncState::Syncing);
        assert!(note.needs_sync());

        note.mark_synced();
        assert_eq!(note.sync_state(), SyncState::Synced);
        assert!(!note.needs_sync());
        assert!(!note.is_pending());

        note.edit("y", Utc::now());
        assert_eq!(note.sync_state(), SyncState::NotSynced);
        assert!(note.needs_sync());
    }

    #[test]
    fn test_oversized_is_not_synced_but_owes_nothing() {
        let mut note = Note::new("alice", "x");
        note.mark_oversized();
        assert_eq!(note.sync_state(), SyncState::NotSynced);
        assert!(!note.needs_sync());
        // Still visible to reconciliation, which parks it again without a push.
        assert!(note.is_pending());
    }

    #[test]
    fn test_ceiling_counts_characters_not_bytes() {
        let note = Note::new("alice", "é".repeat(10));
        assert_eq!(note.content_len(), 10);
        assert!(!note.exceeds_ceiling(10));
        assert!(note.exceeds_ceiling(9));
    }

    #[test]
    fn test_publish_and_unpublish() {
        let mut note = Note::new("alice", "x");
        note.publish("pub-1").unwrap();
        assert!(note.is_public());
        assert_eq!(note.public_id(), Some("pub-1"));

        assert_eq!(note.unpublish(), Some("pub-1".to_string()));
        assert!(!note.is_public());
        assert!(note.public_id().is_none());
    }

    #[test]
    fn test_publish_rejects_empty_public_id() {
        let mut note = Note::new("alice", "x");
        assert!(note.publish("").is_err());
        assert!(!note.is_public());
    }

    #[test]
    fn test_deserialize_rejects_public_without_id() {
        let raw = r#"{"id":"n1","content":"x","timestamp":"2024-10-03T10:00:00Z",
            "userId":"alice","isPublic":true}"#;
        let result: std::result::Result<Note, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_rejects_private_with_id() {
        let raw = r#"{"id":"n1","content":"x","timestamp":"2024-10-03T10:00:00Z",
            "userId":"alice","isPublic":false,"publicId":"p"}"#;
        let result: std::result::Result<Note, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_legacy_record_without_sync_state() {
        let raw = r#"{"id":"n1","content":"x","timestamp":"2024-10-03T10:00:00Z",
            "userId":"alice","isPinned":true,"needsSync":false}"#;
        let note: Note = serde_json::from_str(raw).unwrap();
        assert_eq!(note.sync_state(), SyncState::Synced);
        assert!(note.is_pinned);

        let raw = r#"{"id":"n2","content":"x","timestamp":"2024-10-03T10:00:00Z",
            "userId":"alice","needsSync":true}"#;
        let note: Note = serde_json::from_str(raw).unwrap();
        assert_eq!(note.sync_state(), SyncState::NotSynced);
    }

    #[test]
    fn test_deserialize_rejects_synced_with_pending_push() {
        let raw = r#"{"id":"n1","content":"x","timestamp":"2024-10-03T10:00:00Z",
            "userId":"alice","syncState":"synced","needsSync":true}"#;
        let result: std::result::Result<Note, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn test_note_serializes_camel_case() {
        let ts = Utc.with_ymd_and_hms(2024, 10, 3, 10, 0, 0).unwrap();
        let mut note = Note::with_id("n1", "alice", "x", ts);
        note.publish("p1").unwrap();
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["userId"], "alice");
        assert_eq!(json["syncState"], "notSynced");
        assert_eq!(json["publicId"], "p1");
        assert_eq!(json["isPinned"], false);
    }

    #[test]
    fn test_title_is_first_non_empty_line() {
        let note = Note::new("alice", "\n\n  Shopping  \nmilk");
        assert_eq!(note.title(), "Shopping");
    }

    #[test]
    fn test_same_revision_ignores_sync_bookkeeping() {
        let mut a = Note::new("alice", "x");
        let b = a.clone();
        a.mark_synced();
        assert!(a.same_revision(&b));
        a.is_pinned = true;
        assert!(!a.same_revision(&b));
    }

    #[test]
    fn test_tombstone_key_round_trip() {
        let t = Tombstone::new("alice", "n1");
        assert_eq!(t.to_string(), "alice:n1");
        assert_eq!("alice:n1".parse::<Tombstone>().unwrap(), t);
    }

    #[test]
    fn test_tombstone_user_id_may_contain_colon() {
        let t: Tombstone = "org:alice:n1".parse().unwrap();
        assert_eq!(t.user_id, "org:alice");
        assert_eq!(t.note_id, "n1");
    }

    #[test]
    fn test_tombstone_rejects_malformed_keys() {
        assert!("no-separator".parse::<Tombstone>().is_err());
        assert!(":n1".parse::<Tombstone>().is_err());
        assert!("alice:".parse::<Tombstone>().is_err());
    }

    #[test]
    fn test_tombstone_serializes_as_string() {
        let t = Tombstone::new("alice", "n1");
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"alice:n1\"");
    }
}
