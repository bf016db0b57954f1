use crate::cache::memory::MemCache;
use crate::config::QnoteConfig;
use crate::connectivity::{ConnectivitySignal, NetworkStatus};
use crate::remote::memory::MemRemote;
use crate::session::Session;
use std::sync::Arc;

pub struct TestEnv {
    pub cache: Arc<MemCache>,
    pub remote: Arc<MemRemote>,
    pub signal: ConnectivitySignal,
    pub session: Session<MemCache, MemRemote>,
}

impl TestEnv {
    pub fn online() -> Self {
        Self::new(NetworkStatus::Online, QnoteConfig::default())
    }

    pub fn offline() -> Self {
        Self::new(NetworkStatus::Offline, QnoteConfig::default())
    }

    pub fn new(status: NetworkStatus, config: QnoteConfig) -> Self {
        let cache = Arc::new(MemCache::new());
        let remote = Arc::new(MemRemote::new());
        let signal = ConnectivitySignal::new(status);
        let session = Session::start("alice", cache.clone(), remote.clone(), signal.clone(), &config);
        Self {
            cache,
            remote,
            signal,
            session,
        }
    }
}
