use crate::cache::LocalCache;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::remote::RemoteStore;
use crate::session::Session;
use crate::sync::DeleteOutcome;

use super::helpers::drain_alerts;

/// Deletes every unpinned note, here and on the server.
///
/// Offline, the server side is remembered and sent before anything else at
/// the next reconciliation.
pub async fn unpinned<C, R>(session: &Session<C, R>) -> Result<CmdResult>
where
    C: LocalCache + 'static,
    R: RemoteStore + 'static,
{
    let report = session.engine().delete_unpinned().await;
    let mut result = CmdResult::default();

    if report.removed.is_empty() {
        result.add_message(CmdMessage::info("No unpinned notes to delete"));
    } else {
        result.add_message(CmdMessage::success(format!(
            "Deleted {} unpinned note(s)",
            report.removed.len()
        )));
    }

    match &report.outcome {
        DeleteOutcome::Confirmed => {}
        DeleteOutcome::Queued => result.add_message(CmdMessage::info(
            "The server will be updated when back online",
        )),
        DeleteOutcome::Failed(e) => result.add_message(CmdMessage::warning(format!(
            "Could not delete on the server: {}. It will be retried",
            e
        ))),
    }

    if session.is_online() {
        for public_id in report.removed.iter().filter_map(|n| n.public_id()) {
            session.unpublish_in_background(public_id.to_string());
        }
    }

    drain_alerts(session, &mut result);
    Ok(result)
}
