use super::engine::SyncEngine;
use super::outcome::ReconcileReport;
use crate::cache::LocalCache;
use crate::remote::RemoteStore;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Background task that reconciles on every offline to online transition.
///
/// Repeated online ticks and drops to offline do nothing. Each finished pass
/// is published and can be read with [`Reconciler::next_report`].
pub struct Reconciler {
    shutdown: watch::Sender<bool>,
    reports: Mutex<mpsc::UnboundedReceiver<ReconcileReport>>,
    handle: JoinHandle<()>,
}

impl Reconciler {
    /// Subscribes to the engine's connectivity signal and starts listening.
    /// Must be called from within a tokio runtime.
    pub fn spawn<C, R>(engine: Arc<SyncEngine<C, R>>) -> Self
    where
        C: LocalCache + 'static,
        R: RemoteStore + 'static,
    {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        // Subscribing before spawning makes a reconnect right after this call
        // count; the current value is marked seen.
        let mut reconnects = engine.connectivity().subscribe_reconnects();
        reconnects.borrow_and_update();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    changed = reconnects.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let count = *reconnects.borrow_and_update();
                        info!(user_id = engine.user_id(), reconnects = count, "Back online; reconciling");
                        let report = engine.reconcile().await;
                        if report_tx.send(report).is_err() {
                            debug!("No one is reading reconcile reports");
                        }
                    }
                }
            }
            debug!(user_id = engine.user_id(), "Reconciler stopped");
        });

        Self {
            shutdown,
            reports: Mutex::new(report_rx),
            handle,
        }
    }

    /// Waits for the next finished pass. `None` once the task has stopped and
    /// every report has been read.
    pub async fn next_report(&self) -> Option<ReconcileReport> {
        self.reports.lock().await.recv().await
    }

    /// A finished pass if one is waiting.
    pub async fn try_next_report(&self) -> Option<ReconcileReport> {
        self.reports.lock().await.try_recv().ok()
    }

    /// Stops listening, letting a pass that is already running finish first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Reconciler task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::MemCache;
    use crate::connectivity::{ConnectivitySignal, NetworkStatus};
    use crate::model::Note;
    use crate::remote::memory::MemRemote;
    use crate::store::NoteStore;
    use crate::sync::engine::SyncSettings;
    use std::time::Duration;

    fn engine(signal: &ConnectivitySignal) -> Arc<SyncEngine<MemCache, MemRemote>> {
        let store = Arc::new(NoteStore::new(Arc::new(MemCache::new()), "alice", 10));
        store.upsert(Note::new("alice", "pending"));
        Arc::new(SyncEngine::new(
            store,
            Arc::new(MemRemote::new()),
            signal.clone(),
            SyncSettings::default(),
        ))
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(30)).await;
    }

    #[tokio::test]
    async fn test_reconciles_once_per_reconnect() {
        let signal = ConnectivitySignal::new(NetworkStatus::Offline);
        let engine = engine(&signal);
        let reconciler = Reconciler::spawn(engine.clone());

        signal.set(NetworkStatus::Online);
        let report = tokio::time::timeout(Duration::from_secs(1), reconciler.next_report())
            .await
            .unwrap()
            .unwrap();
        assert!(report.ran);
        assert_eq!(report.pushed, 1);

        // Still online: nothing new.
        signal.set(NetworkStatus::Online);
        settle().await;
        assert!(reconciler.try_next_report().await.is_none());

        // Going offline does not reconcile either.
        signal.set(NetworkStatus::Offline);
        settle().await;
        assert!(reconciler.try_next_report().await.is_none());

        signal.set(NetworkStatus::Online);
        let second = tokio::time::timeout(Duration::from_secs(1), reconciler.next_report())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.pushed, 0);

        reconciler.shutdown().await;
    }

    #[tokio::test]
    async fn test_quick_flip_is_not_missed() {
        let signal = ConnectivitySignal::new(NetworkStatus::Online);
        let engine = engine(&signal);
        let reconciler = Reconciler::spawn(engine.clone());

        signal.set(NetworkStatus::Offline);
        signal.set(NetworkStatus::Online);
        let report = tokio::time::timeout(Duration::from_secs(1), reconciler.next_report())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.pushed, 1);
        reconciler.shutdown().await;
    }

    #[tokio::test]
    async fn test_starting_online_does_not_reconcile() {
        let signal = ConnectivitySignal::new(NetworkStatus::Online);
        let engine = engine(&signal);
        let reconciler = Reconciler::spawn(engine.clone());
        settle().await;
        assert!(reconciler.try_next_report().await.is_none());
        assert_eq!(engine.remote().calls().total(), 0);
        reconciler.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_listening() {
        let signal = ConnectivitySignal::new(NetworkStatus::Offline);
        let engine = engine(&signal);
        let reconciler = Reconciler::spawn(engine.clone());
        reconciler.shutdown().await;

        signal.set(NetworkStatus::Online);
        settle().await;
        assert_eq!(engine.remote().calls().total(), 0);
    }
}
