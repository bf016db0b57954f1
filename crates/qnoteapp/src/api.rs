//! # API Facade
//!
//! The API layer is a thin facade over the command layer and the single entry
//! point for every UI (the `qnote` CLI, tests, anything else).
//!
//! ## Role and Responsibilities
//!
//! The API facade:
//! - **Owns the session**: `sign_in` starts one, `sign_out` shuts it down
//! - **Dispatches** to the appropriate command function
//! - **Guards authentication**: without a session, mutations and reads fail
//!   with [`QnoteError::NotAuthenticated`] while sync requests are harmless
//!   no-ops that say so
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: That belongs in `commands/*.rs`
//! - **I/O operations**: No stdout, stderr, or formatting
//!
//! ## Generic Over Ports
//!
//! `QnoteApi<C: LocalCache, R: RemoteStore>` is generic over both storage
//! ports:
//! - CLI: `QnoteApi<FsCache, FsRemote>`
//! - Testing: `QnoteApi<MemCache, MemRemote>`

use crate::cache::LocalCache;
use crate::commands::{self, CmdMessage, CmdResult};
use crate::config::QnoteConfig;
use crate::connectivity::ConnectivitySignal;
use crate::error::{QnoteError, Result};
use crate::model::SyncState;
use crate::remote::RemoteStore;
use crate::session::Session;
use crate::sync::ReconcileReport;
use std::sync::Arc;

/// The main API facade for qnote operations.
pub struct QnoteApi<C: LocalCache + 'static, R: RemoteStore + 'static> {
    cache: Arc<C>,
    remote: Arc<R>,
    connectivity: ConnectivitySignal,
    config: QnoteConfig,
    session: Option<Session<C, R>>,
}

impl<C: LocalCache + 'static, R: RemoteStore + 'static> QnoteApi<C, R> {
    pub fn new(
        cache: Arc<C>,
        remote: Arc<R>,
        connectivity: ConnectivitySignal,
        config: QnoteConfig,
    ) -> Self {
        Self {
            cache,
            remote,
            connectivity,
            config,
            session: None,
        }
    }

    pub fn connectivity(&self) -> &ConnectivitySignal {
        &self.connectivity
    }

    pub fn config(&self) -> &QnoteConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&Session<C, R>> {
        self.session.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    fn require_session(&self) -> Result<&Session<C, R>> {
        self.session.as_ref().ok_or(QnoteError::NotAuthenticated)
    }

    /// Starts a session for `user_id`, ending any previous one first.
    pub async fn sign_in(&mut self, user_id: &str) -> Result<CmdResult> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(QnoteError::Api("User id cannot be empty".to_string()));
        }
        if let Some(previous) = self.session.take() {
            previous.shutdown().await;
        }

        let session = Session::start(
            user_id,
            self.cache.clone(),
            self.remote.clone(),
            self.connectivity.clone(),
            &self.config,
        );
        let mut result = CmdResult::default();
        result.add_message(CmdMessage::success(format!(
            "Signed in as {} ({} note(s) on this device)",
            user_id,
            session.store().len()
        )));
        commands::helpers::drain_alerts(&session, &mut result);
        self.session = Some(session);
        Ok(result)
    }

    /// Ends the session, waiting for background work and any running
    /// reconciliation.
    pub async fn sign_out(&mut self) -> Result<CmdResult> {
        let mut result = CmdResult::default();
        match self.session.take() {
            Some(session) => {
                let user_id = session.user_id().to_string();
                session.shutdown().await;
                result.add_message(CmdMessage::success(format!("Signed out {}", user_id)));
            }
            None => result.add_message(CmdMessage::info("Not signed in")),
        }
        Ok(result)
    }

    pub async fn create_note(&self, content: &str) -> Result<CmdResult> {
        commands::create::run(self.require_session()?, content).await
    }

    pub async fn update_note(&self, selector: &str, content: &str) -> Result<CmdResult> {
        commands::update::run(self.require_session()?, selector, content).await
    }

    pub async fn delete_note(&self, selector: &str) -> Result<CmdResult> {
        commands::delete::run(self.require_session()?, selector).await
    }

    pub async fn toggle_pin(&self, selector: &str) -> Result<CmdResult> {
        commands::pinning::toggle(self.require_session()?, selector).await
    }

    pub async fn toggle_public(&self, selector: &str) -> Result<CmdResult> {
        commands::publish::toggle(self.require_session()?, selector).await
    }

    pub fn list_visible(&self, search: Option<&str>) -> Result<CmdResult> {
        commands::list::run(self.require_session()?, search)
    }

    pub fn view_note(&self, selector: &str) -> Result<CmdResult> {
        commands::list::view(self.require_session()?, selector)
    }

    pub fn current_sync_indicator(&self, selector: &str) -> Result<SyncState> {
        commands::list::sync_indicator(self.require_session()?, selector)
    }

    pub async fn sync_now(&self) -> Result<CmdResult> {
        match &self.session {
            Some(session) => commands::sync::sync_now(session).await,
            None => Ok(not_signed_in()),
        }
    }

    pub async fn refresh(&self) -> Result<CmdResult> {
        match &self.session {
            Some(session) => commands::sync::refresh(session).await,
            None => Ok(not_signed_in()),
        }
    }

    pub async fn delete_unpinned(&self) -> Result<CmdResult> {
        commands::purge::unpinned(self.require_session()?).await
    }

    pub fn status(&self) -> Result<CmdResult> {
        commands::status::run(self.require_session()?)
    }

    /// Waits for background work started by earlier calls.
    pub async fn settle(&self) {
        if let Some(session) = &self.session {
            session.settle().await;
        }
    }

    /// Waits for the next reconciliation triggered by a reconnect.
    pub async fn next_reconcile_report(&self) -> Option<ReconcileReport> {
        match &self.session {
            Some(session) => session.next_reconcile_report().await,
            None => None,
        }
    }
}

fn not_signed_in() -> CmdResult {
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::info("Not signed in; nothing to sync"));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::MemCache;
    use crate::connectivity::NetworkStatus;
    use crate::remote::memory::MemRemote;

    fn make_api(status: NetworkStatus) -> QnoteApi<MemCache, MemRemote> {
        QnoteApi::new(
            Arc::new(MemCache::new()),
            Arc::new(MemRemote::new()),
            ConnectivitySignal::new(status),
            QnoteConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_mutations_need_a_session() {
        let api = make_api(NetworkStatus::Online);
        assert!(matches!(
            api.create_note("x").await,
            Err(QnoteError::NotAuthenticated)
        ));
        assert!(matches!(
            api.list_visible(None),
            Err(QnoteError::NotAuthenticated)
        ));
        assert!(matches!(
            api.delete_unpinned().await,
            Err(QnoteError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_sync_without_session_is_noop() {
        let api = make_api(NetworkStatus::Online);
        let result = api.sync_now().await.unwrap();
        assert!(result.messages[0].content.contains("Not signed in"));
        let result = api.refresh().await.unwrap();
        assert!(result.messages[0].content.contains("Not signed in"));
    }

    #[tokio::test]
    async fn test_sign_in_scopes_notes_by_user() {
        let mut api = make_api(NetworkStatus::Offline);
        api.sign_in("alice").await.unwrap();
        api.create_note("alice's note").await.unwrap();

        api.sign_in("bob").await.unwrap();
        assert!(api.list_visible(None).unwrap().listed_notes.is_empty());

        api.sign_in("alice").await.unwrap();
        assert_eq!(api.list_visible(None).unwrap().listed_notes.len(), 1);
    }

    #[tokio::test]
    async fn test_sign_out() {
        let mut api = make_api(NetworkStatus::Offline);
        api.sign_in("alice").await.unwrap();
        assert!(api.is_signed_in());
        api.sign_out().await.unwrap();
        assert!(!api.is_signed_in());
        assert!(api.status().is_err());
    }

    #[tokio::test]
    async fn test_blank_user_is_rejected() {
        let mut api = make_api(NetworkStatus::Offline);
        assert!(api.sign_in("  ").await.is_err());
    }
}
