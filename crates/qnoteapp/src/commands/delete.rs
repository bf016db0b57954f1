use crate::cache::LocalCache;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{QnoteError, Result};
use crate::remote::RemoteStore;
use crate::session::Session;
use tracing::debug;

use super::helpers::{delete_message, drain_alerts, resolve_note};

/// Deletes a note locally and sends the deletion to the remote store.
///
/// The deletion is recorded as a tombstone first, so it survives going
/// offline or a failed request. A public copy is removed in the background.
pub async fn run<C, R>(session: &Session<C, R>, selector: &str) -> Result<CmdResult>
where
    C: LocalCache + 'static,
    R: RemoteStore + 'static,
{
    let target = resolve_note(session, selector)?;
    let note_id = target.note.id().to_string();
    let removed = session
        .store()
        .remove(&note_id)
        .ok_or_else(|| QnoteError::NoteNotFound(note_id.clone()))?;
    debug!(note_id = %note_id, "Deleted note locally");

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Deleted note {}: {}",
        target.index,
        removed.title()
    )));

    let outcome = session.engine().propagate_delete(&note_id).await;
    if let Some(message) = delete_message(&outcome) {
        result.add_message(message);
    }

    if let Some(public_id) = removed.public_id() {
        if session.is_online() {
            session.unpublish_in_background(public_id.to_string());
        } else {
            debug!(note_id = %note_id, public_id, "Offline; public copy left in place");
        }
    }

    drain_alerts(session, &mut result);
    Ok(result.with_affected_notes(vec![target]))
}
