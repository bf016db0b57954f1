//! A signed-in user's working set.
//!
//! Starting a session loads the user's notes, builds the sync engine and
//! subscribes the reconciler to connectivity changes. Shutting it down stops
//! the reconciler (after any running pass) and waits for background work.
//!
//! Background work is best-effort remote cleanup, such as removing the public
//! copy of a deleted note. It is never retried; failures are logged.

use crate::cache::LocalCache;
use crate::config::QnoteConfig;
use crate::connectivity::ConnectivitySignal;
use crate::remote::RemoteStore;
use crate::store::NoteStore;
use crate::sync::{ReconcileReport, Reconciler, SyncEngine, SyncSettings};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

pub struct Session<C: LocalCache + 'static, R: RemoteStore + 'static> {
    engine: Arc<SyncEngine<C, R>>,
    reconciler: Reconciler,
    background: Mutex<JoinSet<()>>,
}

impl<C: LocalCache + 'static, R: RemoteStore + 'static> Session<C, R> {
    /// Must be called from within a tokio runtime.
    pub fn start(
        user_id: &str,
        cache: Arc<C>,
        remote: Arc<R>,
        connectivity: ConnectivitySignal,
        config: &QnoteConfig,
    ) -> Self {
        let store = Arc::new(NoteStore::new(cache, user_id, config.page_size));
        let loaded = store.load();
        info!(user_id, notes = loaded.len(), "Session started");

        let engine = Arc::new(SyncEngine::new(
            store,
            remote,
            connectivity,
            SyncSettings::from(config),
        ));
        let reconciler = Reconciler::spawn(engine.clone());
        Self {
            engine,
            reconciler,
            background: Mutex::new(JoinSet::new()),
        }
    }

    pub fn user_id(&self) -> &str {
        self.engine.user_id()
    }

    pub fn store(&self) -> &Arc<NoteStore<C>> {
        self.engine.store()
    }

    pub fn engine(&self) -> &Arc<SyncEngine<C, R>> {
        &self.engine
    }

    pub fn remote(&self) -> &Arc<R> {
        self.engine.remote()
    }

    pub fn connectivity(&self) -> &ConnectivitySignal {
        self.engine.connectivity()
    }

    pub fn is_online(&self) -> bool {
        self.connectivity().is_online()
    }

    /// Runs `task` in the background, tracked until [`Session::settle`].
    pub fn spawn_background<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.background.lock().spawn(task);
    }

    /// Removes a public copy without waiting for the result.
    pub fn unpublish_in_background(&self, public_id: String) {
        let remote = self.remote().clone();
        self.spawn_background(async move {
            if let Err(e) = remote.unpublish_note(&public_id).await {
                warn!(public_id = %public_id, error = %e, "Could not remove public copy");
            }
        });
    }

    /// Waits for every background task started so far.
    pub async fn settle(&self) {
        let mut tasks = std::mem::take(&mut *self.background.lock());
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Background task failed");
            }
        }
    }

    pub async fn next_reconcile_report(&self) -> Option<ReconcileReport> {
        self.reconciler.next_report().await
    }

    pub async fn try_next_reconcile_report(&self) -> Option<ReconcileReport> {
        self.reconciler.try_next_report().await
    }

    pub async fn shutdown(self) {
        self.settle().await;
        self.reconciler.shutdown().await;
        info!(user_id = self.engine.user_id(), "Session ended");
    }
}
