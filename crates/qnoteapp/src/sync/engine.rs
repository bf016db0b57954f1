use super::outcome::{BulkDeleteReport, DeleteOutcome, PullReport, ReconcileReport, SyncOutcome};
use crate::cache::LocalCache;
use crate::config::QnoteConfig;
use crate::connectivity::ConnectivitySignal;
use crate::error::SyncError;
use crate::model::{Note, Tombstone};
use crate::remote::{PageCursor, RemoteStore};
use crate::store::NoteStore;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Knobs the engine reads from [`QnoteConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub content_ceiling: usize,
    pub pull_page_size: usize,
    pub push_concurrency: usize,
}

impl From<&QnoteConfig> for SyncSettings {
    fn from(config: &QnoteConfig) -> Self {
        Self {
            content_ceiling: config.content_ceiling,
            pull_page_size: config.pull_page_size.max(1),
            push_concurrency: config.push_concurrency.max(1),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from(&QnoteConfig::default())
    }
}

/// Brings the remote store in line with the local one for a single user.
///
/// The engine never holds a note across a suspension point except the snapshot
/// being pushed. When a push completes, the note is only marked synced if it
/// still matches that snapshot.
pub struct SyncEngine<C: LocalCache, R: RemoteStore> {
    store: Arc<NoteStore<C>>,
    remote: Arc<R>,
    connectivity: ConnectivitySignal,
    settings: SyncSettings,
    // Note id -> follow-up work for the push in flight.
    flights: Mutex<HashMap<String, FlightState>>,
    // Held by reconcile, pull and the remote half of bulk deletion.
    pass: tokio::sync::Mutex<()>,
}

/// Follow-up work queued against a note while its push is running.
#[derive(Debug, Default, Clone, Copy)]
struct FlightState {
    rerun: bool,
    delete: bool,
}

/// What the push owner does once an attempt finishes.
enum Landing {
    Again,
    Done { delete: bool },
}

/// A note's entry in `flights`, removed on landing or when the push future
/// is dropped.
struct Flight<'a> {
    flights: &'a Mutex<HashMap<String, FlightState>>,
    note_id: &'a str,
    landed: bool,
}

impl Flight<'_> {
    // Checking for a rerun and leaving happen under one lock, so a request
    // arriving in between cannot be lost.
    fn land(&mut self) -> Landing {
        let flights = self.flights;
        let mut flights = flights.lock();
        let rerun = flights.get(self.note_id).map(|state| state.rerun);
        if rerun == Some(true) {
            if let Some(state) = flights.get_mut(self.note_id) {
                state.rerun = false;
            }
            return Landing::Again;
        }
        let delete = flights
            .remove(self.note_id)
            .map(|state| state.delete)
            .unwrap_or(false);
        self.landed = true;
        Landing::Done { delete }
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        if !self.landed {
            self.flights.lock().remove(self.note_id);
        }
    }
}

impl<C: LocalCache, R: RemoteStore> SyncEngine<C, R> {
    pub fn new(
        store: Arc<NoteStore<C>>,
        remote: Arc<R>,
        connectivity: ConnectivitySignal,
        settings: SyncSettings,
    ) -> Self {
        Self {
            store,
            remote,
            connectivity,
            settings,
            flights: Mutex::new(HashMap::new()),
            pass: tokio::sync::Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<NoteStore<C>> {
        &self.store
    }

    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    pub fn connectivity(&self) -> &ConnectivitySignal {
        &self.connectivity
    }

    pub fn settings(&self) -> SyncSettings {
        self.settings
    }

    pub fn user_id(&self) -> &str {
        self.store.user_id()
    }

    pub fn in_flight(&self) -> HashSet<String> {
        self.flights.lock().keys().cloned().collect()
    }

    /// Pushes one note if it can be pushed.
    ///
    /// A call for a note that is already being pushed returns
    /// [`SyncOutcome::Coalesced`] at once; the running call then goes around
    /// once more with the latest version of the note.
    pub async fn sync_note(&self, note_id: &str) -> SyncOutcome {
        {
            let mut flights = self.flights.lock();
            if let Some(state) = flights.get_mut(note_id) {
                state.rerun = true;
                debug!(note_id, "Push already in flight; coalescing");
                return SyncOutcome::Coalesced;
            }
            flights.insert(note_id.to_string(), FlightState::default());
        }
        let mut flight = Flight {
            flights: &self.flights,
            note_id,
            landed: false,
        };

        loop {
            let outcome = self.sync_once(note_id).await;
            match flight.land() {
                Landing::Again => debug!(note_id, "Note changed during push; pushing again"),
                Landing::Done { delete } => {
                    if delete {
                        debug!(note_id, "Note deleted during push; sending the deletion");
                        let tombstone = Tombstone::new(self.user_id(), note_id);
                        // A failure keeps the tombstone for the next pass.
                        let _ = self.send_delete(&tombstone).await;
                    }
                    return outcome;
                }
            }
        }
    }

    // Defers a deletion behind a running push of the same note. Returns false
    // when nothing is in flight and the caller should send it now.
    fn defer_delete(&self, note_id: &str) -> bool {
        match self.flights.lock().get_mut(note_id) {
            Some(state) => {
                state.delete = true;
                true
            }
            None => false,
        }
    }

    async fn send_delete(&self, tombstone: &Tombstone) -> Result<(), SyncError> {
        match self
            .remote
            .delete_note(&tombstone.user_id, &tombstone.note_id)
            .await
        {
            Ok(()) => {
                self.forget_tombstone(tombstone);
                Ok(())
            }
            Err(e) => {
                warn!(note_id = %tombstone.note_id, error = %e, "Remote deletion still pending");
                Err(e)
            }
        }
    }

    async fn sync_once(&self, note_id: &str) -> SyncOutcome {
        let Some(current) = self.store.get(note_id) else {
            return SyncOutcome::Skipped;
        };

        if current.exceeds_ceiling(self.settings.content_ceiling) {
            info!(
                note_id,
                chars = current.content_len(),
                ceiling = self.settings.content_ceiling,
                "Note exceeds the sync ceiling; keeping it local"
            );
            self.store.update(note_id, Note::mark_oversized);
            return SyncOutcome::Oversized;
        }

        if !self.connectivity.is_online() || self.bulk_deletion_pending() {
            self.store.update(note_id, Note::mark_pending);
            debug!(note_id, "Queued for the next reconciliation");
            return SyncOutcome::Queued;
        }

        let Some(snapshot) = self.store.update(note_id, Note::mark_syncing) else {
            return SyncOutcome::Skipped;
        };

        match self.remote.put_note(self.user_id(), &snapshot).await {
            Ok(()) => {
                self.store.update(note_id, |note| {
                    if note.same_revision(&snapshot) {
                        note.mark_synced();
                    }
                });
                debug!(note_id, "Pushed note");
                SyncOutcome::Synced
            }
            Err(e) => {
                warn!(note_id, error = %e, "Push failed; note stays pending");
                self.store.update(note_id, Note::mark_pending);
                SyncOutcome::Failed(e)
            }
        }
    }

    // A note pushed before the bulk deletion reaches the server would be
    // caught by it.
    fn bulk_deletion_pending(&self) -> bool {
        self.store
            .cache()
            .bulk_unpinned_pending(self.user_id())
            .unwrap_or_else(|e| {
                warn!(user_id = self.user_id(), error = %e, "Could not read bulk deletion flag");
                false
            })
    }

    /// Pushes every pending note and flushes queued deletions.
    ///
    /// Skipped while offline. A pending bulk deletion goes first; if it fails
    /// the pass stops there.
    pub async fn reconcile(&self) -> ReconcileReport {
        let _pass = self.pass.lock().await;
        if !self.connectivity.is_online() {
            debug!(user_id = self.user_id(), "Offline; skipping reconciliation");
            return ReconcileReport::skipped();
        }

        let mut report = ReconcileReport {
            ran: true,
            ..ReconcileReport::default()
        };

        if self.bulk_deletion_pending() {
            match self.remote.delete_unpinned(self.user_id()).await {
                Ok(removed) => {
                    report.bulk_removed = Some(removed);
                    self.clear_bulk_flag();
                }
                Err(e) => {
                    warn!(user_id = self.user_id(), error = %e, "Bulk deletion still pending");
                    report.errors.push(e);
                    return report;
                }
            }
        }

        let pending = self.store.pending_ids();
        let tombstones = self.tombstones();
        let concurrency = self.settings.push_concurrency;

        let pushes = stream::iter(pending)
            .map(|id| async move { self.sync_note(&id).await })
            .buffer_unordered(concurrency)
            .collect::<Vec<_>>();
        let flushes = stream::iter(tombstones)
            .map(|t| async move {
                if self.defer_delete(&t.note_id) {
                    return (t, None);
                }
                let result = self.send_delete(&t).await;
                (t, Some(result))
            })
            .buffer_unordered(concurrency)
            .collect::<Vec<_>>();
        let (outcomes, flushed) = tokio::join!(pushes, flushes);

        for outcome in outcomes {
            match outcome {
                SyncOutcome::Synced => report.pushed += 1,
                SyncOutcome::Oversized => report.oversized += 1,
                SyncOutcome::Failed(e) => {
                    report.failed += 1;
                    report.errors.push(e);
                }
                SyncOutcome::Queued | SyncOutcome::Coalesced | SyncOutcome::Skipped => {}
            }
        }

        for (tombstone, result) in flushed {
            match result {
                Some(Ok(())) => report.tombstones_flushed += 1,
                Some(Err(e)) => {
                    report.tombstones_retained += 1;
                    report.errors.push(e);
                }
                None => {
                    debug!(note_id = %tombstone.note_id, "Deletion waits for a running push");
                    report.tombstones_retained += 1;
                }
            }
        }

        info!(
            user_id = self.user_id(),
            pushed = report.pushed,
            failed = report.failed,
            tombstones = report.tombstones_flushed,
            "Reconciliation finished"
        );
        report
    }

    /// Fetches every remote note and merges it under last-write-wins.
    pub async fn pull(&self) -> Result<PullReport, SyncError> {
        let _pass = self.pass.lock().await;
        if !self.connectivity.is_online() {
            return Err(SyncError::Unreachable("device is offline".to_string()));
        }

        let user_id = self.user_id().to_string();
        let page_size = self.settings.pull_page_size;
        let bulk_pending = self.bulk_deletion_pending();
        let mut report = PullReport::default();
        let mut notes = Vec::new();
        let mut protected = HashSet::new();
        let mut cursor: Option<PageCursor> = None;

        loop {
            let page = self
                .remote
                .list_notes(&user_id, page_size, cursor.as_ref())
                .await?;
            report.pages += 1;
            report.fetched += page.len();
            let last_page = page.len() < page_size;
            cursor = page.last().map(|doc| doc.cursor());

            for doc in page {
                // Still queued for bulk deletion on the server.
                if bulk_pending && !doc.is_pinned {
                    continue;
                }
                let id = doc.id.clone();
                match doc.into_note(&user_id) {
                    Ok(note) => notes.push(note),
                    Err(e) => {
                        warn!(note_id = %id, error = %e, "Skipping malformed remote note");
                        report.malformed += 1;
                        protected.insert(id);
                    }
                }
            }
            if last_page || cursor.is_none() {
                break;
            }
        }

        protected.extend(self.in_flight());
        let tombstones = self.tombstones();
        report.merge = self.store.merge_remote(notes, &tombstones, &protected);
        info!(
            user_id = %user_id,
            fetched = report.fetched,
            changed = report.merge.changed(),
            "Pull finished"
        );
        Ok(report)
    }

    /// Queues a deletion and, when online, sends it at once.
    ///
    /// If a push of the note is still running, the deletion is sent after
    /// that push lands so the push cannot bring the note back.
    pub async fn propagate_delete(&self, note_id: &str) -> DeleteOutcome {
        let tombstone = Tombstone::new(self.user_id(), note_id);
        if let Err(e) = self.store.cache().add_tombstone(tombstone.clone()) {
            warn!(note_id, error = %e, "Could not persist tombstone");
            self.store
                .alert(format!("Could not record deletion of {}: {}", note_id, e));
        }

        if !self.connectivity.is_online() {
            debug!(note_id, "Offline; deletion queued");
            return DeleteOutcome::Queued;
        }

        if self.defer_delete(note_id) {
            debug!(note_id, "Push in flight; deletion follows it");
            return DeleteOutcome::Queued;
        }

        match self.send_delete(&tombstone).await {
            Ok(()) => DeleteOutcome::Confirmed,
            Err(e) => DeleteOutcome::Failed(e),
        }
    }

    /// Deletes every unpinned note locally and, when online, remotely.
    pub async fn delete_unpinned(&self) -> BulkDeleteReport {
        let removed = self.store.remove_unpinned();
        if let Err(e) = self
            .store
            .cache()
            .set_bulk_unpinned_pending(self.user_id(), true)
        {
            warn!(user_id = self.user_id(), error = %e, "Could not persist bulk deletion flag");
            self.store
                .alert(format!("Could not record bulk deletion: {}", e));
        }

        let outcome = if self.connectivity.is_online() {
            let _pass = self.pass.lock().await;
            match self.remote.delete_unpinned(self.user_id()).await {
                Ok(count) => {
                    debug!(user_id = self.user_id(), count, "Remote bulk deletion done");
                    self.clear_bulk_flag();
                    DeleteOutcome::Confirmed
                }
                Err(e) => {
                    warn!(user_id = self.user_id(), error = %e, "Remote bulk deletion failed; will retry");
                    DeleteOutcome::Failed(e)
                }
            }
        } else {
            DeleteOutcome::Queued
        };

        BulkDeleteReport { removed, outcome }
    }

    fn tombstones(&self) -> BTreeSet<Tombstone> {
        self.store
            .cache()
            .tombstones(self.user_id())
            .unwrap_or_else(|e| {
                warn!(user_id = self.user_id(), error = %e, "Could not read tombstones");
                self.store.alert(format!("Could not read pending deletions: {}", e));
                BTreeSet::new()
            })
    }

    fn forget_tombstone(&self, tombstone: &Tombstone) {
        if let Err(e) = self.store.cache().remove_tombstone(tombstone) {
            warn!(note_id = %tombstone.note_id, error = %e, "Could not clear tombstone");
            self.store.alert(format!("Could not clear pending deletion: {}", e));
        }
    }

    fn clear_bulk_flag(&self) {
        if let Err(e) = self
            .store
            .cache()
            .set_bulk_unpinned_pending(self.user_id(), false)
        {
            warn!(user_id = self.user_id(), error = %e, "Could not clear bulk deletion flag");
            self.store
                .alert(format!("Could not clear bulk deletion flag: {}", e));
        }
    }
}
