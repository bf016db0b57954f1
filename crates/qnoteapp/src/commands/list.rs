use crate::cache::LocalCache;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{QnoteError, Result};
use crate::model::SyncState;
use crate::remote::RemoteStore;
use crate::session::Session;
use std::collections::HashSet;

use super::helpers::{drain_alerts, indexed, resolve_note};

/// Lists notes in display order, optionally filtered by a search string.
///
/// Indexes always come from the full list, so a filtered view shows the same
/// index a note has everywhere else.
pub fn run<C, R>(session: &Session<C, R>, search: Option<&str>) -> Result<CmdResult>
where
    C: LocalCache + 'static,
    R: RemoteStore + 'static,
{
    let all = indexed(session);
    let listed = match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(term) => {
            let matching: HashSet<String> = session
                .store()
                .query(term)
                .into_iter()
                .map(|n| n.id().to_string())
                .collect();
            all.into_iter()
                .filter(|dn| matching.contains(dn.note.id()))
                .collect()
        }
        None => all,
    };

    let mut result = CmdResult::default();
    if listed.is_empty() {
        let message = match search {
            Some(term) if !term.trim().is_empty() => format!("No notes match \"{}\"", term.trim()),
            _ => "No notes yet".to_string(),
        };
        result.add_message(CmdMessage::info(message));
    }
    drain_alerts(session, &mut result);
    Ok(result.with_listed_notes(listed))
}

/// Shows one note in full.
pub fn view<C, R>(session: &Session<C, R>, selector: &str) -> Result<CmdResult>
where
    C: LocalCache + 'static,
    R: RemoteStore + 'static,
{
    let target = resolve_note(session, selector)?;
    Ok(CmdResult::default().with_listed_notes(vec![target]))
}

/// The per-note indicator a UI shows next to a note.
pub fn sync_indicator<C, R>(session: &Session<C, R>, selector: &str) -> Result<SyncState>
where
    C: LocalCache + 'static,
    R: RemoteStore + 'static,
{
    let target = resolve_note(session, selector)?;
    session
        .store()
        .get(target.note.id())
        .map(|n| n.sync_state())
        .ok_or_else(|| QnoteError::NoteNotFound(target.note.id().to_string()))
}
