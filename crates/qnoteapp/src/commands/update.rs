use crate::cache::LocalCache;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{QnoteError, Result};
use crate::remote::{PublicNote, RemoteStore};
use crate::session::Session;
use chrono::Utc;
use tracing::{debug, warn};

use super::helpers::{resolve_note, sync_and_report};

/// Replaces a note's content and stamps it with the current time.
///
/// Unchanged content is a no-op: nothing is written and nothing is pushed.
pub async fn run<C, R>(session: &Session<C, R>, selector: &str, content: &str) -> Result<CmdResult>
where
    C: LocalCache + 'static,
    R: RemoteStore + 'static,
{
    let target = resolve_note(session, selector)?;
    let content = content.trim();
    if content.is_empty() {
        return Err(QnoteError::InvalidNote(
            "Note content cannot be empty".to_string(),
        ));
    }

    let mut result = CmdResult::default();
    if target.note.content == content {
        result.add_message(CmdMessage::info(format!(
            "No changes to note {}",
            target.index
        )));
        return Ok(result.with_affected_notes(vec![target]));
    }

    let note_id = target.note.id().to_string();
    let updated = session
        .store()
        .update(&note_id, |note| note.edit(content, Utc::now()))
        .ok_or_else(|| QnoteError::NoteNotFound(note_id.clone()))?;
    debug!(note_id = %note_id, "Updated note");

    let ceiling = session.engine().settings().content_ceiling;
    if session.is_online() && !updated.exceeds_ceiling(ceiling) {
        if let Some(public) = PublicNote::from_note(&updated) {
            refresh_public_copy(session, public);
        }
    }

    result.add_message(CmdMessage::success(format!(
        "Updated note {}: {}",
        target.index,
        updated.title()
    )));
    sync_and_report(session, &note_id, &mut result).await;
    Ok(result)
}

fn refresh_public_copy<C, R>(session: &Session<C, R>, public: PublicNote)
where
    C: LocalCache + 'static,
    R: RemoteStore + 'static,
{
    let remote = session.remote().clone();
    session.spawn_background(async move {
        if let Err(e) = remote.publish_note(&public).await {
            warn!(public_id = %public.public_id, error = %e, "Could not refresh public copy");
        }
    });
}
