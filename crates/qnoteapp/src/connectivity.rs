//! Process-wide network status.
//!
//! A [`ConnectivitySignal`] is fed by whatever observes the network (the CLI
//! sets it once from `--offline`, tests flip it by hand) and read by the sync
//! engine before every remote call. Subscribers get a `watch` receiver and see
//! only real changes: setting the current status again notifies nobody.
//!
//! A `watch` receiver only sees the latest value, so a quick offline and back
//! online flip can look like no change at all. Code that must act on every
//! reconnect subscribes to [`ConnectivitySignal::subscribe_reconnects`]
//! instead, a counter bumped on each offline to online transition.

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkStatus {
    Online,
    Offline,
}

impl NetworkStatus {
    pub fn is_online(self) -> bool {
        self == NetworkStatus::Online
    }
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkStatus::Online => write!(f, "online"),
            NetworkStatus::Offline => write!(f, "offline"),
        }
    }
}

/// Cloneable handle to the shared status. All clones observe the same value.
#[derive(Debug, Clone)]
pub struct ConnectivitySignal {
    tx: Arc<watch::Sender<NetworkStatus>>,
    reconnects: Arc<watch::Sender<u64>>,
}

impl ConnectivitySignal {
    pub fn new(initial: NetworkStatus) -> Self {
        let (tx, _rx) = watch::channel(initial);
        let (reconnects, _rx) = watch::channel(0);
        Self {
            tx: Arc::new(tx),
            reconnects: Arc::new(reconnects),
        }
    }

    pub fn current_status(&self) -> NetworkStatus {
        *self.tx.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.current_status().is_online()
    }

    /// Publishes a new status. Returns whether it differed from the current one.
    pub fn set(&self, status: NetworkStatus) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            info!(%status, "Connectivity changed");
            if status.is_online() {
                self.reconnects.send_modify(|count| *count += 1);
            }
        }
        changed
    }

    pub fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.tx.subscribe()
    }

    /// Number of offline to online transitions so far. Receivers wake at
    /// least once after any number of reconnects.
    pub fn subscribe_reconnects(&self) -> watch::Receiver<u64> {
        self.reconnects.subscribe()
    }

    pub fn reconnect_count(&self) -> u64 {
        *self.reconnects.borrow()
    }

    /// Runs `callback` on every change until all signal handles are dropped.
    /// Must be called from within a tokio runtime.
    pub fn on_change<F>(&self, mut callback: F) -> JoinHandle<()>
    where
        F: FnMut(NetworkStatus) + Send + 'static,
    {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let status = *rx.borrow_and_update();
                callback(status);
            }
        })
    }
}

impl Default for ConnectivitySignal {
    fn default() -> Self {
        Self::new(NetworkStatus::Online)
    }
}
