use crate::cache::LocalCache;
use crate::commands::{CmdMessage, CmdResult};
use crate::connectivity::NetworkStatus;
use crate::error::Result;
use crate::model::SyncState;
use crate::remote::RemoteStore;
use crate::session::Session;
use serde::Serialize;
use tracing::warn;

use super::helpers::drain_alerts;

/// Snapshot of where the signed-in user's notes stand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub user_id: String,
    #[serde(serialize_with = "serialize_status")]
    pub network: NetworkStatus,
    pub total: usize,
    pub pinned: usize,
    pub public: usize,
    pub synced: usize,
    /// Notes that still owe a push.
    pub pending: usize,
    /// Notes too long to ever sync.
    pub local_only: usize,
    pub pending_deletions: usize,
    pub bulk_deletion_pending: bool,
}

fn serialize_status<S: serde::Serializer>(
    status: &NetworkStatus,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(status)
}

pub fn run<C, R>(session: &Session<C, R>) -> Result<CmdResult>
where
    C: LocalCache + 'static,
    R: RemoteStore + 'static,
{
    let notes = session.store().list();
    let cache = session.store().cache();
    let user_id = session.user_id();

    let pending_deletions = cache.tombstones(user_id).map(|t| t.len()).unwrap_or_else(|e| {
        warn!(user_id, error = %e, "Could not read tombstones");
        0
    });
    let bulk_deletion_pending = cache.bulk_unpinned_pending(user_id).unwrap_or_else(|e| {
        warn!(user_id, error = %e, "Could not read bulk deletion flag");
        false
    });

    let report = StatusReport {
        user_id: user_id.to_string(),
        network: session.connectivity().current_status(),
        total: notes.len(),
        pinned: notes.iter().filter(|n| n.is_pinned).count(),
        public: notes.iter().filter(|n| n.is_public()).count(),
        synced: notes
            .iter()
            .filter(|n| n.sync_state() == SyncState::Synced)
            .count(),
        pending: notes.iter().filter(|n| n.needs_sync()).count(),
        local_only: notes
            .iter()
            .filter(|n| n.sync_state() == SyncState::NotSynced && !n.needs_sync())
            .count(),
        pending_deletions,
        bulk_deletion_pending,
    };

    let mut result = CmdResult::default();
    if report.pending > 0 || report.pending_deletions > 0 || report.bulk_deletion_pending {
        result.add_message(CmdMessage::info("Some changes have not reached the server yet"));
    }
    drain_alerts(session, &mut result);
    result.status = Some(report);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{create, delete};
    use crate::test_utils::TestEnv;

    #[tokio::test]
    async fn test_status_counts() {
        let env = TestEnv::offline();
        create::run(&env.session, "a").await.unwrap();
        create::run(&env.session, "b").await.unwrap();
        delete::run(&env.session, "1").await.unwrap();

        let result = run(&env.session).unwrap();
        let status = result.status.unwrap();
        assert_eq!(status.user_id, "alice");
        assert_eq!(status.network, NetworkStatus::Offline);
        assert_eq!(status.total, 1);
        assert_eq!(status.pending, 1);
        assert_eq!(status.pending_deletions, 1);
        assert!(!status.bulk_deletion_pending);
        assert_eq!(result.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_status_all_synced() {
        let env = TestEnv::online();
        create::run(&env.session, "a").await.unwrap();
        let result = run(&env.session).unwrap();
        let status = result.status.unwrap();
        assert_eq!(status.synced, 1);
        assert_eq!(status.pending, 0);
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_status_serializes_network_as_text() {
        let report = StatusReport {
            user_id: "alice".to_string(),
            network: NetworkStatus::Online,
            total: 0,
            pinned: 0,
            public: 0,
            synced: 0,
            pending: 0,
            local_only: 0,
            pending_deletions: 0,
            bulk_deletion_pending: false,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["network"], "online");
        assert_eq!(json["pendingDeletions"], 0);
    }
}
