use crate::error::SyncError;
use crate::model::Note;
use crate::store::MergeReport;

/// Result of trying to push one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The remote store accepted the note.
    Synced,
    /// Offline, or held back behind a pending bulk deletion.
    Queued,
    /// Over the content ceiling; kept local for good.
    Oversized,
    /// The remote call failed; the note stays pending.
    Failed(SyncError),
    /// A push for this note was already running and will go again.
    Coalesced,
    /// The note no longer exists.
    Skipped,
}

/// Result of sending a deletion to the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Confirmed,
    Queued,
    Failed(SyncError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDeleteReport {
    /// Notes removed locally.
    pub removed: Vec<Note>,
    pub outcome: DeleteOutcome,
}

/// Counts from one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// False when the pass was skipped because the device is offline.
    pub ran: bool,
    pub pushed: usize,
    pub failed: usize,
    pub oversized: usize,
    pub tombstones_flushed: usize,
    pub tombstones_retained: usize,
    /// Remote notes removed by a pending bulk deletion, if one was sent.
    pub bulk_removed: Option<usize>,
    pub errors: Vec<SyncError>,
}

impl ReconcileReport {
    pub fn skipped() -> Self {
        Self::default()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// True when the pass ran and found nothing to do.
    pub fn is_idle(&self) -> bool {
        self.ran
            && self.pushed == 0
            && self.failed == 0
            && self.oversized == 0
            && self.tombstones_flushed == 0
            && self.tombstones_retained == 0
            && self.bulk_removed.is_none()
            && self.errors.is_empty()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PullReport {
    pub pages: usize,
    pub fetched: usize,
    /// Remote documents that could not be read as notes.
    pub malformed: usize,
    pub merge: MergeReport,
}
