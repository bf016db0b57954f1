use crate::cache::LocalCache;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{QnoteError, Result};
use crate::remote::RemoteStore;
use crate::session::Session;

use super::helpers::{resolve_note, sync_and_report};

/// Flips a note's pinned flag. The timestamp is left alone, so unpinning puts
/// the note back where it was among the unpinned notes.
pub async fn toggle<C, R>(session: &Session<C, R>, selector: &str) -> Result<CmdResult>
where
    C: LocalCache + 'static,
    R: RemoteStore + 'static,
{
    let target = resolve_note(session, selector)?;
    let note_id = target.note.id().to_string();
    let updated = session
        .store()
        .update(&note_id, |note| {
            note.is_pinned = !note.is_pinned;
            note.mark_pending();
        })
        .ok_or_else(|| QnoteError::NoteNotFound(note_id.clone()))?;

    let mut result = CmdResult::default();
    let verb = if updated.is_pinned { "Pinned" } else { "Unpinned" };
    result.add_message(CmdMessage::success(format!(
        "{} note: {}",
        verb,
        updated.title()
    )));
    sync_and_report(session, &note_id, &mut result).await;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::create;
    use crate::index::DisplayIndex;
    use crate::model::SyncState;
    use crate::test_utils::TestEnv;

    #[tokio::test]
    async fn test_pinning_assigns_p_index() {
        let env = TestEnv::offline();
        create::run(&env.session, "A").await.unwrap();
        create::run(&env.session, "B").await.unwrap();

        let second = env.session.store().list()[1].clone();

        let result = toggle(&env.session, "2").await.unwrap();
        assert_eq!(result.affected_notes[0].index, DisplayIndex::Pinned(1));
        assert_eq!(result.affected_notes[0].note.id(), second.id());
        assert_eq!(env.session.store().list()[0].id(), second.id());
    }

    #[tokio::test]
    async fn test_toggle_keeps_timestamp_and_syncs() {
        let env = TestEnv::online();
        let created = create::run(&env.session, "A").await.unwrap();
        let before = created.affected_notes[0].note.timestamp;

        let pinned = toggle(&env.session, "1").await.unwrap();
        let note = &pinned.affected_notes[0].note;
        assert!(note.is_pinned);
        assert_eq!(note.timestamp, before);
        assert_eq!(note.sync_state(), SyncState::Synced);
        assert!(env.remote.note("alice", note.id()).unwrap().is_pinned);

        let unpinned = toggle(&env.session, "p1").await.unwrap();
        assert!(!unpinned.affected_notes[0].note.is_pinned);
        assert_eq!(unpinned.affected_notes[0].index, DisplayIndex::Regular(1));
    }
}
