//! # Qnote Architecture
//!
//! Qnote is an **offline-first note library**. Every change lands in the local
//! cache first and reaches the server whenever connectivity allows. The `qnote`
//! binary is one client of this library, not the application itself.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/qnote)                                   │
//! │  - Parses arguments, renders output, owns the runtime       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Session lifecycle, dispatch to commands                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Local write first, then a sync attempt                   │
//! │  - Returns `CmdResult`, never prints                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Sync Layer (session.rs, sync/)                             │
//! │  - SyncEngine: pushes, pulls, deletions, reconciliation     │
//! │  - Reconciler: runs a pass on every reconnect               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store.rs, cache/, remote/)                  │
//! │  - NoteStore: in-memory view over the LocalCache port       │
//! │  - RemoteStore port: FsRemote, MemRemote                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Connectivity
//!
//! [`connectivity::ConnectivitySignal`] is the single source of truth for
//! whether the device is online. Nothing below the API layer probes the network
//! on its own; the engine consults the signal before every remote call and the
//! reconciler subscribes to it.
//!
//! ## Testing Strategy
//!
//! 1. **Storage and sync** (`store.rs`, `sync/`): unit tests against
//!    `MemCache` and `MemRemote`, which can simulate outages and latency.
//! 2. **Commands** (`commands/*.rs`): the bulk of behavior tests, run through a
//!    `TestEnv` session.
//! 3. **Integration** (`tests/`): offline and reconnect scenarios over the
//!    filesystem implementations.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for all operations
//! - [`commands`]: Business logic for each command
//! - [`session`]: One signed-in user's store, engine and reconciler
//! - [`sync`]: Sync engine, reconciler and their reports
//! - [`store`]: In-memory note store and remote merge
//! - [`cache`]: Local persistence port and implementations
//! - [`remote`]: Remote store port and implementations
//! - [`connectivity`]: Online/offline signal
//! - [`model`]: Core data types (`Note`, `SyncState`, `Tombstone`)
//! - [`index`]: Display indexing (p1, 1 notation)
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod api;
pub mod cache;
pub mod commands;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod index;
pub mod model;
pub mod remote;
pub mod session;
pub mod store;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_utils;
