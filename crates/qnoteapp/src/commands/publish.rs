use crate::cache::LocalCache;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{QnoteError, Result};
use crate::remote::{PublicNote, RemoteStore};
use crate::session::Session;
use tracing::info;
use uuid::Uuid;

use super::helpers::{resolve_note, sync_and_report};

/// Publishes a private note or unpublishes a public one.
///
/// Needs the network: the public copy is written (or removed) first, and the
/// note only changes once that succeeded. A failed call leaves the note as it
/// was and returns the error. Notes too long to sync cannot be published.
pub async fn toggle<C, R>(session: &Session<C, R>, selector: &str) -> Result<CmdResult>
where
    C: LocalCache + 'static,
    R: RemoteStore + 'static,
{
    let target = resolve_note(session, selector)?;
    if !session.is_online() {
        return Err(QnoteError::Offline(
            "Sharing needs a network connection".to_string(),
        ));
    }

    let note_id = target.note.id().to_string();
    let mut result = CmdResult::default();

    match target.note.public_id() {
        Some(public_id) => {
            session.remote().unpublish_note(public_id).await?;
            session
                .store()
                .update(&note_id, |note| {
                    note.unpublish();
                    note.mark_pending();
                })
                .ok_or_else(|| QnoteError::NoteNotFound(note_id.clone()))?;
            info!(note_id = %note_id, public_id, "Unpublished note");
            result.add_message(CmdMessage::success(format!(
                "Note {} is private again",
                target.index
            )));
        }
        None => {
            let ceiling = session.engine().settings().content_ceiling;
            if target.note.exceeds_ceiling(ceiling) {
                return Err(QnoteError::InvalidNote(format!(
                    "Note {} is too long to share ({} characters, limit {})",
                    target.index,
                    target.note.content_len(),
                    ceiling
                )));
            }
            let public_id = Uuid::new_v4().to_string();
            let mut draft = target.note.clone();
            draft.publish(public_id.clone())?;
            let public = PublicNote::from_note(&draft)
                .ok_or_else(|| QnoteError::InvalidNote("missing public id".to_string()))?;
            session.remote().publish_note(&public).await?;

            let mut published = Ok(());
            session
                .store()
                .update(&note_id, |note| {
                    published = note.publish(public_id.clone());
                    note.mark_pending();
                })
                .ok_or_else(|| QnoteError::NoteNotFound(note_id.clone()))?;
            published?;
            info!(note_id = %note_id, public_id = %public_id, "Published note");
            result.add_message(CmdMessage::success(format!(
                "Note {} is public: {}",
                target.index,
                public_link(&public_id)
            )));
        }
    }

    sync_and_report(session, &note_id, &mut result).await;
    Ok(result)
}

/// Path under which a public note can be read.
pub fn public_link(public_id: &str) -> String {
    format!("/public/{}", public_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::create;
    use crate::config::QnoteConfig;
    use crate::connectivity::NetworkStatus;
    use crate::test_utils::TestEnv;

    #[tokio::test]
    async fn test_publish_round_trip() {
        let env = TestEnv::online();
        create::run(&env.session, "shared").await.unwrap();

        let published = toggle(&env.session, "1").await.unwrap();
        let note = published.affected_notes[0].note.clone();
        let public_id = note.public_id().unwrap().to_string();
        assert!(note.is_public());
        assert_eq!(env.remote.public_note(&public_id).unwrap().content, "shared");
        assert_eq!(
            env.remote.note("alice", note.id()).unwrap().public_id,
            Some(public_id.clone())
        );

        let private = toggle(&env.session, "1").await.unwrap();
        let note = &private.affected_notes[0].note;
        assert!(!note.is_public());
        assert!(note.public_id().is_none());
        assert!(env.remote.public_note(&public_id).is_none());
        assert!(!env.remote.note("alice", note.id()).unwrap().is_public);
    }

    #[tokio::test]
    async fn test_publish_requires_network() {
        let env = TestEnv::offline();
        create::run(&env.session, "shared").await.unwrap();
        assert!(matches!(
            toggle(&env.session, "1").await,
            Err(QnoteError::Offline(_))
        ));
        assert!(!env.session.store().list()[0].is_public());
        assert_eq!(env.remote.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_oversized_note_is_not_published() {
        let config = QnoteConfig {
            content_ceiling: 10,
            ..QnoteConfig::default()
        };
        let env = TestEnv::new(NetworkStatus::Online, config);
        create::run(&env.session, "much longer than ten").await.unwrap();
        env.remote.reset_calls();

        assert!(matches!(
            toggle(&env.session, "1").await,
            Err(QnoteError::InvalidNote(_))
        ));
        assert_eq!(env.remote.calls().total(), 0);
        assert!(!env.session.store().list()[0].is_public());
    }

    #[tokio::test]
    async fn test_failed_publish_leaves_note_unchanged() {
        let env = TestEnv::online();
        create::run(&env.session, "shared").await.unwrap();
        env.remote.set_failing(true);

        assert!(matches!(
            toggle(&env.session, "1").await,
            Err(QnoteError::Remote(_))
        ));
        let note = env.session.store().list()[0].clone();
        assert!(!note.is_public());
        assert!(!note.needs_sync());
    }

    #[tokio::test]
    async fn test_failed_unpublish_keeps_note_public() {
        let env = TestEnv::online();
        create::run(&env.session, "shared").await.unwrap();
        toggle(&env.session, "1").await.unwrap();
        env.remote.set_failing(true);

        assert!(toggle(&env.session, "1").await.is_err());
        assert!(env.session.store().list()[0].is_public());
    }
}
