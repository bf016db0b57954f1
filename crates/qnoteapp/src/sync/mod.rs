//! # Sync Engine
//!
//! Everything that moves notes between the local cache and the remote store.
//!
//! - [`engine::SyncEngine`]: per-note pushes, reconciliation, pulls and
//!   deletion propagation for one signed-in user.
//! - [`reconciler::Reconciler`]: the background task that runs a
//!   reconciliation each time the device comes back online.
//! - [`state::SyncEngineState`]: tombstones and bulk deletion flags, persisted
//!   through the local cache.
//! - [`outcome`]: what each operation reports back.
//!
//! ## Conflicts
//!
//! Last write wins, decided by note timestamp. Concurrent edits to the same
//! note on two devices are not merged; the older edit is lost when the newer
//! one is pulled.

pub mod engine;
pub mod outcome;
pub mod reconciler;
pub mod state;

pub use engine::{SyncEngine, SyncSettings};
pub use outcome::{BulkDeleteReport, DeleteOutcome, PullReport, ReconcileReport, SyncOutcome};
pub use reconciler::Reconciler;
pub use state::SyncEngineState;
