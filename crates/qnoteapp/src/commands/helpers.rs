use super::{CmdMessage, CmdResult};
use crate::cache::LocalCache;
use crate::error::Result;
use crate::index::{index_notes, resolve, DisplayNote};
use crate::model::Note;
use crate::remote::RemoteStore;
use crate::session::Session;
use crate::sync::{DeleteOutcome, SyncOutcome};

/// The full list with canonical indexes.
pub fn indexed<C: LocalCache + 'static, R: RemoteStore + 'static>(
    session: &Session<C, R>,
) -> Vec<DisplayNote> {
    index_notes(session.store().list())
}

/// Resolves user input (index or id) to a note.
pub fn resolve_note<C: LocalCache + 'static, R: RemoteStore + 'static>(
    session: &Session<C, R>,
    selector: &str,
) -> Result<DisplayNote> {
    let all = indexed(session);
    resolve(&all, selector).cloned()
}

/// The current version of a note with its current index.
pub fn display_note<C: LocalCache + 'static, R: RemoteStore + 'static>(
    session: &Session<C, R>,
    note_id: &str,
) -> Option<DisplayNote> {
    indexed(session)
        .into_iter()
        .find(|dn| dn.note.id() == note_id)
}

/// The message a user should see for a push outcome, if any.
pub fn sync_message(outcome: &SyncOutcome, note: &Note, ceiling: usize) -> Option<CmdMessage> {
    match outcome {
        SyncOutcome::Synced | SyncOutcome::Coalesced | SyncOutcome::Skipped => None,
        SyncOutcome::Queued => Some(CmdMessage::info(
            "Saved on this device; it will sync when back online",
        )),
        SyncOutcome::Oversized => Some(CmdMessage::info(format!(
            "Note is too long to sync ({} characters, limit {}); it is kept on this device only",
            note.content_len(),
            ceiling
        ))),
        SyncOutcome::Failed(e) => Some(CmdMessage::warning(format!(
            "Could not sync \"{}\": {}. It will be retried",
            note.title(),
            e
        ))),
    }
}

pub fn delete_message(outcome: &DeleteOutcome) -> Option<CmdMessage> {
    match outcome {
        DeleteOutcome::Confirmed => None,
        DeleteOutcome::Queued => Some(CmdMessage::info(
            "Deletion will reach the server when back online",
        )),
        DeleteOutcome::Failed(e) => Some(CmdMessage::warning(format!(
            "Could not delete on the server: {}. It will be retried",
            e
        ))),
    }
}

/// Moves queued storage alerts into `result` as warnings.
pub fn drain_alerts<C: LocalCache + 'static, R: RemoteStore + 'static>(
    session: &Session<C, R>,
    result: &mut CmdResult,
) {
    for alert in session.store().take_alerts() {
        result.add_message(CmdMessage::warning(alert));
    }
}

/// Pushes a note and reports it as affected.
pub async fn sync_and_report<C, R>(
    session: &Session<C, R>,
    note_id: &str,
    result: &mut CmdResult,
) where
    C: LocalCache + 'static,
    R: RemoteStore + 'static,
{
    let outcome = session.engine().sync_note(note_id).await;
    if let Some(current) = display_note(session, note_id) {
        let ceiling = session.engine().settings().content_ceiling;
        if let Some(message) = sync_message(&outcome, &current.note, ceiling) {
            result.add_message(message);
        }
        result.affected_notes.push(current);
    }
    drain_alerts(session, result);
}
