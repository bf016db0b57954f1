use super::{page_after, PageCursor, PublicNote, RemoteNote, RemoteStore};
use crate::error::SyncError;
use crate::model::Note;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;
use uuid::Uuid;

/// Directory-backed remote store.
///
/// Mirrors the document layout of the hosted store, one JSON file per
/// document:
///
/// ```text
/// <root>/
/// ├── public/{public_id}.json
/// └── users/{user_id}/notes/{note_id}.json
/// ```
///
/// Pointing two devices at a shared directory gives a working multi-device
/// setup for the CLI.
pub struct FsRemote {
    root: PathBuf,
}

impl FsRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn notes_dir(&self, user_id: &str) -> Result<PathBuf, SyncError> {
        check_segment(user_id)?;
        Ok(self.root.join("users").join(user_id).join("notes"))
    }

    fn note_path(&self, user_id: &str, note_id: &str) -> Result<PathBuf, SyncError> {
        check_segment(note_id)?;
        Ok(self.notes_dir(user_id)?.join(format!("{}.json", note_id)))
    }

    fn public_path(&self, public_id: &str) -> Result<PathBuf, SyncError> {
        check_segment(public_id)?;
        Ok(self.root.join("public").join(format!("{}.json", public_id)))
    }

    /// Reads every document of a user, setting aside the ones that do not
    /// parse.
    async fn read_all(&self, user_id: &str) -> Result<Listing, SyncError> {
        let dir = self.notes_dir(user_id)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Listing::default()),
            Err(e) => return Err(request_error(e)),
        };

        let mut listing = Listing::default();
        while let Some(entry) = entries.next_entry().await.map_err(request_error)? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let content = fs::read_to_string(&path).await.map_err(request_error)?;
            match serde_json::from_str::<RemoteNote>(&content) {
                Ok(note) => listing.notes.push(note),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Unreadable remote document");
                    listing.unreadable.push(path);
                }
            }
        }
        Ok(listing)
    }
}

#[derive(Default)]
struct Listing {
    notes: Vec<RemoteNote>,
    unreadable: Vec<PathBuf>,
}

fn check_segment(segment: &str) -> Result<(), SyncError> {
    let valid = !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(SyncError::Request(format!("invalid document path segment: {}", segment)))
    }
}

fn request_error(e: std::io::Error) -> SyncError {
    SyncError::Request(e.to_string())
}

async fn write_document(path: &Path, content: String) -> Result<(), SyncError> {
    let dir = path
        .parent()
        .ok_or_else(|| SyncError::Request(format!("no parent for {}", path.display())))?;
    fs::create_dir_all(dir).await.map_err(request_error)?;
    let tmp = dir.join(format!(".{}.tmp", Uuid::new_v4()));
    fs::write(&tmp, content).await.map_err(request_error)?;
    fs::rename(&tmp, path).await.map_err(request_error)
}

async fn remove_document(path: &Path) -> Result<(), SyncError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(request_error(e)),
    }
}

#[async_trait]
impl RemoteStore for FsRemote {
    async fn put_note(&self, user_id: &str, note: &Note) -> Result<(), SyncError> {
        let path = self.note_path(user_id, note.id())?;
        let content = serde_json::to_string_pretty(&RemoteNote::from(note))
            .map_err(|e| SyncError::Malformed(e.to_string()))?;
        write_document(&path, content).await
    }

    async fn delete_note(&self, user_id: &str, note_id: &str) -> Result<(), SyncError> {
        remove_document(&self.note_path(user_id, note_id)?).await
    }

    async fn list_notes(
        &self,
        user_id: &str,
        limit: usize,
        after: Option<&PageCursor>,
    ) -> Result<Vec<RemoteNote>, SyncError> {
        let listing = self.read_all(user_id).await?;
        // A partial listing would read as deletions on the pulling side.
        if let Some(path) = listing.unreadable.first() {
            return Err(SyncError::Malformed(format!(
                "{} unreadable document(s), first {}",
                listing.unreadable.len(),
                path.display()
            )));
        }
        Ok(page_after(listing.notes, limit, after))
    }

    async fn delete_unpinned(&self, user_id: &str) -> Result<usize, SyncError> {
        let mut removed = 0;
        for note in self.read_all(user_id).await?.notes {
            if note.is_pinned {
                continue;
            }
            remove_document(&self.note_path(user_id, &note.id)?).await?;
            removed += 1;
        }
        Ok(removed)
    }

    async fn publish_note(&self, note: &PublicNote) -> Result<(), SyncError> {
        let path = self.public_path(&note.public_id)?;
        let content =
            serde_json::to_string_pretty(note).map_err(|e| SyncError::Malformed(e.to_string()))?;
        write_document(&path, content).await
    }

    async fn unpublish_note(&self, public_id: &str) -> Result<(), SyncError> {
        remove_document(&self.public_path(public_id)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_documents_land_in_user_namespace() {
        let dir = tempdir().unwrap();
        let remote = FsRemote::new(dir.path());
        let note = Note::new("alice", "hello");
        remote.put_note("alice", &note).await.unwrap();

        let path = dir
            .path()
            .join("users/alice/notes")
            .join(format!("{}.json", note.id()));
        assert!(path.exists());

        let listed = remote.list_notes("alice", 10, None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(remote.list_notes("bob", 10, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let dir = tempdir().unwrap();
        let remote = FsRemote::new(dir.path());
        remote.delete_note("alice", "nope").await.unwrap();
        remote.unpublish_note("nope").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = tempdir().unwrap();
        let remote = FsRemote::new(dir.path());
        let err = remote.delete_note("..", "x").await.unwrap_err();
        assert!(matches!(err, SyncError::Request(_)));
    }

    #[tokio::test]
    async fn test_delete_unpinned() {
        let dir = tempdir().unwrap();
        let remote = FsRemote::new(dir.path());
        let mut pinned = Note::new("alice", "keep");
        pinned.is_pinned = true;
        remote.put_note("alice", &pinned).await.unwrap();
        remote.put_note("alice", &Note::new("alice", "drop")).await.unwrap();

        assert_eq!(remote.delete_unpinned("alice").await.unwrap(), 1);
        let left = remote.list_notes("alice", 10, None).await.unwrap();
        assert_eq!(left.len(), 1);
        assert!(left[0].is_pinned);
    }

    #[tokio::test]
    async fn test_unreadable_document_fails_listing() {
        let dir = tempdir().unwrap();
        let remote = FsRemote::new(dir.path());
        remote.put_note("alice", &Note::new("alice", "ok")).await.unwrap();
        std::fs::write(dir.path().join("users/alice/notes/broken.json"), "{").unwrap();

        let err = remote.list_notes("alice", 10, None).await.unwrap_err();
        assert!(matches!(err, SyncError::Malformed(_)));
        // Bulk deletion still clears what it can read.
        assert_eq!(remote.delete_unpinned("alice").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_public_documents() {
        let dir = tempdir().unwrap();
        let remote = FsRemote::new(dir.path());
        let mut note = Note::new("alice", "shared");
        note.publish("pub-1").unwrap();
        remote
            .publish_note(&PublicNote::from_note(&note).unwrap())
            .await
            .unwrap();
        assert!(dir.path().join("public/pub-1.json").exists());

        remote.unpublish_note("pub-1").await.unwrap();
        assert!(!dir.path().join("public/pub-1.json").exists());
    }
}
