use super::{page_after, PageCursor, PublicNote, RemoteNote, RemoteStore};
use crate::error::SyncError;
use crate::model::Note;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// How many times each remote operation was attempted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RemoteCalls {
    pub put: usize,
    pub delete: usize,
    pub list: usize,
    pub delete_unpinned: usize,
    pub publish: usize,
    pub unpublish: usize,
}

impl RemoteCalls {
    pub fn total(&self) -> usize {
        self.put + self.delete + self.list + self.delete_unpinned + self.publish + self.unpublish
    }
}

#[derive(Default)]
struct Inner {
    notes: HashMap<String, BTreeMap<String, RemoteNote>>,
    public: HashMap<String, PublicNote>,
    calls: RemoteCalls,
}

/// In-memory remote store for testing.
///
/// Counts every call so tests can assert that offline paths never touch the
/// network, and can fail all calls or only the ones for specific notes.
#[derive(Default)]
pub struct MemRemote {
    inner: Mutex<Inner>,
    failing: AtomicBool,
    failing_notes: Mutex<HashSet<String>>,
    latency: Mutex<Option<Duration>>,
}

impl MemRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the server were unreachable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make pushes and deletes of one note fail.
    pub fn fail_note(&self, note_id: &str) {
        self.failing_notes.lock().insert(note_id.to_string());
    }

    pub fn heal_note(&self, note_id: &str) {
        self.failing_notes.lock().remove(note_id);
    }

    /// Delay every call, to widen race windows in tests.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Seed a document as if another device had written it.
    pub fn insert_note(&self, user_id: &str, note: RemoteNote) {
        self.inner
            .lock()
            .notes
            .entry(user_id.to_string())
            .or_default()
            .insert(note.id.clone(), note);
    }

    pub fn note(&self, user_id: &str, note_id: &str) -> Option<RemoteNote> {
        self.inner
            .lock()
            .notes
            .get(user_id)
            .and_then(|notes| notes.get(note_id))
            .cloned()
    }

    pub fn notes(&self, user_id: &str) -> Vec<RemoteNote> {
        let all: Vec<RemoteNote> = self
            .inner
            .lock()
            .notes
            .get(user_id)
            .map(|notes| notes.values().cloned().collect())
            .unwrap_or_default();
        page_after(all, usize::MAX, None)
    }

    pub fn public_note(&self, public_id: &str) -> Option<PublicNote> {
        self.inner.lock().public.get(public_id).cloned()
    }

    pub fn calls(&self) -> RemoteCalls {
        self.inner.lock().calls
    }

    pub fn reset_calls(&self) {
        self.inner.lock().calls = RemoteCalls::default();
    }

    async fn enter(&self, record: impl FnOnce(&mut RemoteCalls)) -> Result<(), SyncError> {
        record(&mut self.inner.lock().calls);
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(SyncError::Unreachable("simulated outage".to_string()));
        }
        Ok(())
    }

    fn check_note(&self, note_id: &str) -> Result<(), SyncError> {
        if self.failing_notes.lock().contains(note_id) {
            return Err(SyncError::Request(format!("simulated failure for {}", note_id)));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemRemote {
    async fn put_note(&self, user_id: &str, note: &Note) -> Result<(), SyncError> {
        self.enter(|calls| calls.put += 1).await?;
        self.check_note(note.id())?;
        self.insert_note(user_id, RemoteNote::from(note));
        Ok(())
    }

    async fn delete_note(&self, user_id: &str, note_id: &str) -> Result<(), SyncError> {
        self.enter(|calls| calls.delete += 1).await?;
        self.check_note(note_id)?;
        if let Some(notes) = self.inner.lock().notes.get_mut(user_id) {
            notes.remove(note_id);
        }
        Ok(())
    }

    async fn list_notes(
        &self,
        user_id: &str,
        limit: usize,
        after: Option<&PageCursor>,
    ) -> Result<Vec<RemoteNote>, SyncError> {
        self.enter(|calls| calls.list += 1).await?;
        let all: Vec<RemoteNote> = self
            .inner
            .lock()
            .notes
            .get(user_id)
            .map(|notes| notes.values().cloned().collect())
            .unwrap_or_default();
        Ok(page_after(all, limit, after))
    }

    async fn delete_unpinned(&self, user_id: &str) -> Result<usize, SyncError> {
        self.enter(|calls| calls.delete_unpinned += 1).await?;
        let mut inner = self.inner.lock();
        let Some(notes) = inner.notes.get_mut(user_id) else {
            return Ok(0);
        };
        let before = notes.len();
        notes.retain(|_, note| note.is_pinned);
        Ok(before - notes.len())
    }

    async fn publish_note(&self, note: &PublicNote) -> Result<(), SyncError> {
        self.enter(|calls| calls.publish += 1).await?;
        self.inner
            .lock()
            .public
            .insert(note.public_id.clone(), note.clone());
        Ok(())
    }

    async fn unpublish_note(&self, public_id: &str) -> Result<(), SyncError> {
        self.enter(|calls| calls.unpublish += 1).await?;
        self.inner.lock().public.remove(public_id);
        Ok(())
    }
}
