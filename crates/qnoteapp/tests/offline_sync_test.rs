use chrono::{Duration, Utc};
use qnoteapp::api::QnoteApi;
use qnoteapp::cache::fs::FsCache;
use qnoteapp::cache::memory::MemCache;
use qnoteapp::cache::LocalCache;
use qnoteapp::commands::MessageLevel;
use qnoteapp::config::QnoteConfig;
use qnoteapp::connectivity::{ConnectivitySignal, NetworkStatus};
use qnoteapp::model::SyncState;
use qnoteapp::remote::fs::FsRemote;
use qnoteapp::remote::memory::MemRemote;
use qnoteapp::remote::{RemoteNote, RemoteStore};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn fs_api(dir: &Path, status: NetworkStatus) -> QnoteApi<FsCache, FsRemote> {
    QnoteApi::new(
        Arc::new(FsCache::new(dir.join("cache"))),
        Arc::new(FsRemote::new(dir.join("remote"))),
        ConnectivitySignal::new(status),
        QnoteConfig::default(),
    )
}

fn mem_api(
    remote: Arc<MemRemote>,
    status: NetworkStatus,
    config: QnoteConfig,
) -> QnoteApi<MemCache, MemRemote> {
    QnoteApi::new(
        Arc::new(MemCache::new()),
        remote,
        ConnectivitySignal::new(status),
        config,
    )
}

async fn remote_ids(remote: &FsRemote, user_id: &str) -> Vec<String> {
    remote
        .list_notes(user_id, 100, None)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.id)
        .collect()
}

#[tokio::test]
async fn test_offline_create_syncs_on_reconnect() {
    let dir = TempDir::new().unwrap();
    let mut api = fs_api(dir.path(), NetworkStatus::Offline);
    api.sign_in("alice").await.unwrap();

    api.create_note("written on the train").await.unwrap();
    let listed = api.list_visible(None).unwrap().listed_notes;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].note.sync_state(), SyncState::NotSynced);
    assert!(listed[0].note.needs_sync());

    api.connectivity().set(NetworkStatus::Online);
    let report = api.next_reconcile_report().await.unwrap();
    assert_eq!(report.pushed, 1);
    assert_eq!(
        api.current_sync_indicator("1").unwrap(),
        SyncState::Synced
    );

    let remote = FsRemote::new(dir.path().join("remote"));
    assert_eq!(remote_ids(&remote, "alice").await, vec![listed[0].note.id()]);
}

#[tokio::test]
async fn test_offline_delete_reaches_remote_on_reconnect() {
    let dir = TempDir::new().unwrap();
    let mut api = fs_api(dir.path(), NetworkStatus::Online);
    api.sign_in("alice").await.unwrap();
    api.create_note("short lived").await.unwrap();
    let remote = FsRemote::new(dir.path().join("remote"));
    assert_eq!(remote_ids(&remote, "alice").await.len(), 1);

    api.connectivity().set(NetworkStatus::Offline);
    api.delete_note("1").await.unwrap();
    assert!(api.list_visible(None).unwrap().listed_notes.is_empty());

    let cache = FsCache::new(dir.path().join("cache"));
    assert_eq!(cache.tombstones("alice").unwrap().len(), 1);
    assert!(cache.fetch("alice", 0, 10).unwrap().is_empty());

    api.connectivity().set(NetworkStatus::Online);
    let report = api.next_reconcile_report().await.unwrap();
    assert_eq!(report.tombstones_flushed, 1);
    assert!(cache.tombstones("alice").unwrap().is_empty());
    assert!(remote_ids(&remote, "alice").await.is_empty());
}

#[tokio::test]
async fn test_pending_work_survives_restart() {
    let dir = TempDir::new().unwrap();
    {
        let mut api = fs_api(dir.path(), NetworkStatus::Offline);
        api.sign_in("alice").await.unwrap();
        api.create_note("keep me").await.unwrap();
        api.toggle_pin("1").await.unwrap();
        api.create_note("scratch").await.unwrap();
        api.delete_unpinned().await.unwrap();
        api.sign_out().await.unwrap();
    }

    let mut api = fs_api(dir.path(), NetworkStatus::Online);
    api.sign_in("alice").await.unwrap();
    let status = api.status().unwrap().status.unwrap();
    assert_eq!(status.total, 1);
    assert_eq!(status.pending, 1);
    assert!(status.bulk_deletion_pending);

    let result = api.sync_now().await.unwrap();
    assert!(!result.has_level(MessageLevel::Warning));
    let status = api.status().unwrap().status.unwrap();
    assert_eq!(status.synced, 1);
    assert!(!status.bulk_deletion_pending);

    let remote = FsRemote::new(dir.path().join("remote"));
    let notes = remote.list_notes("alice", 100, None).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert!(notes[0].is_pinned);
}

#[tokio::test]
async fn test_oversized_note_never_reaches_remote() {
    let remote = Arc::new(MemRemote::new());
    let config = QnoteConfig {
        content_ceiling: 10,
        ..QnoteConfig::default()
    };
    let mut api = mem_api(remote.clone(), NetworkStatus::Online, config);
    api.sign_in("alice").await.unwrap();

    let result = api
        .create_note("this note is well over ten characters")
        .await
        .unwrap();
    assert_eq!(result.affected_notes.len(), 1);
    assert_eq!(remote.calls().put, 0);

    let listed = api.list_visible(None).unwrap().listed_notes;
    assert_eq!(listed[0].note.sync_state(), SyncState::NotSynced);
    assert!(!listed[0].note.needs_sync());

    api.sync_now().await.unwrap();
    assert_eq!(remote.calls().put, 0);
}

#[tokio::test]
async fn test_second_reconcile_makes_no_remote_calls() {
    let remote = Arc::new(MemRemote::new());
    let mut api = mem_api(remote.clone(), NetworkStatus::Offline, QnoteConfig::default());
    api.sign_in("alice").await.unwrap();
    api.create_note("one").await.unwrap();
    api.create_note("two").await.unwrap();
    api.delete_note("1").await.unwrap();

    api.connectivity().set(NetworkStatus::Online);
    api.next_reconcile_report().await.unwrap();
    assert!(remote.calls().total() > 0);

    remote.reset_calls();
    api.sync_now().await.unwrap();
    assert_eq!(remote.calls().total(), 0);
}

#[tokio::test]
async fn test_refresh_takes_newer_remote_edit() {
    let remote = Arc::new(MemRemote::new());
    let mut api = mem_api(remote.clone(), NetworkStatus::Online, QnoteConfig::default());
    api.sign_in("alice").await.unwrap();
    api.create_note("first draft").await.unwrap();
    let local = api.list_visible(None).unwrap().listed_notes[0].note.clone();

    remote.insert_note(
        "alice",
        RemoteNote {
            id: local.id().to_string(),
            content: "edited on the laptop".to_string(),
            timestamp: local.timestamp + Duration::seconds(30),
            is_pinned: false,
            is_public: false,
            public_id: None,
        },
    );

    api.refresh().await.unwrap();
    let listed = api.list_visible(None).unwrap().listed_notes;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].note.content, "edited on the laptop");
    assert_eq!(listed[0].note.sync_state(), SyncState::Synced);
}

#[tokio::test]
async fn test_refresh_keeps_newer_local_edit() {
    let remote = Arc::new(MemRemote::new());
    let mut api = mem_api(remote.clone(), NetworkStatus::Offline, QnoteConfig::default());
    api.sign_in("alice").await.unwrap();
    api.create_note("fresh local words").await.unwrap();
    let local = api.list_visible(None).unwrap().listed_notes[0].note.clone();

    remote.insert_note(
        "alice",
        RemoteNote {
            id: local.id().to_string(),
            content: "stale server copy".to_string(),
            timestamp: Utc::now() - Duration::hours(1),
            is_pinned: false,
            is_public: false,
            public_id: None,
        },
    );

    api.connectivity().set(NetworkStatus::Online);
    api.next_reconcile_report().await.unwrap();
    api.refresh().await.unwrap();

    let listed = api.list_visible(None).unwrap().listed_notes;
    assert_eq!(listed[0].note.content, "fresh local words");
    assert_eq!(
        remote.note("alice", local.id()).unwrap().content,
        "fresh local words"
    );
}

#[tokio::test]
async fn test_public_toggle_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut api = fs_api(dir.path(), NetworkStatus::Online);
    api.sign_in("alice").await.unwrap();
    api.create_note("share me").await.unwrap();

    api.toggle_public("1").await.unwrap();
    let note = api.list_visible(None).unwrap().listed_notes[0].note.clone();
    assert!(note.is_public());
    let public_id = note.public_id().unwrap().to_string();
    let public_file = dir
        .path()
        .join("remote")
        .join("public")
        .join(format!("{}.json", public_id));
    assert!(public_file.exists());

    api.toggle_public("1").await.unwrap();
    let note = api.list_visible(None).unwrap().listed_notes[0].note.clone();
    assert!(!note.is_public());
    assert_eq!(note.public_id(), None);
    assert!(!public_file.exists());
}

#[tokio::test]
async fn test_going_offline_does_not_reconcile() {
    let remote = Arc::new(MemRemote::new());
    let mut api = mem_api(remote.clone(), NetworkStatus::Online, QnoteConfig::default());
    api.sign_in("alice").await.unwrap();

    api.connectivity().set(NetworkStatus::Offline);
    api.create_note("queued").await.unwrap();
    api.connectivity().set(NetworkStatus::Online);
    let report = api.next_reconcile_report().await.unwrap();
    assert_eq!(report.pushed, 1);

    let session = api.session().unwrap();
    assert!(session.try_next_reconcile_report().await.is_none());
}

#[tokio::test]
async fn test_refresh_keeps_note_when_remote_copy_is_unreadable() {
    let dir = TempDir::new().unwrap();
    let mut api = fs_api(dir.path(), NetworkStatus::Online);
    api.sign_in("alice").await.unwrap();
    api.create_note("precious").await.unwrap();
    let id = api.list_visible(None).unwrap().listed_notes[0]
        .note
        .id()
        .to_string();
    assert_eq!(api.current_sync_indicator("1").unwrap(), SyncState::Synced);

    let doc = dir
        .path()
        .join("remote/users/alice/notes")
        .join(format!("{}.json", id));
    std::fs::write(&doc, "{ truncated").unwrap();

    let result = api.refresh().await.unwrap();
    assert!(result
        .messages
        .iter()
        .any(|m| m.level == MessageLevel::Warning));
    assert_eq!(result.listed_notes.len(), 1);
    assert_eq!(result.listed_notes[0].note.content, "precious");

    let cache = FsCache::new(dir.path().join("cache"));
    assert!(cache.get("alice", &id).unwrap().is_some());
}
