use crate::cache::LocalCache;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{QnoteError, Result};
use crate::model::Note;
use crate::remote::RemoteStore;
use crate::session::Session;
use tracing::debug;

use super::helpers::sync_and_report;

/// Creates a note from `content` and tries to push it.
///
/// Content is trimmed; blank content is rejected.
pub async fn run<C, R>(session: &Session<C, R>, content: &str) -> Result<CmdResult>
where
    C: LocalCache + 'static,
    R: RemoteStore + 'static,
{
    let content = content.trim();
    if content.is_empty() {
        return Err(QnoteError::InvalidNote(
            "Note content cannot be empty".to_string(),
        ));
    }

    let note = Note::new(session.user_id(), content);
    let note_id = note.id().to_string();
    let title = note.title().to_string();
    session.store().upsert(note);
    debug!(note_id = %note_id, "Created note");

    let mut result = CmdResult::default();
    sync_and_report(session, &note_id, &mut result).await;
    if let Some(created) = result.affected_notes.first() {
        result.messages.insert(
            0,
            CmdMessage::success(format!("Created note {}: {}", created.index, title)),
        );
    }
    Ok(result)
}
