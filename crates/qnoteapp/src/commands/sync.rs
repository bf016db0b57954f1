use crate::cache::LocalCache;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::remote::RemoteStore;
use crate::session::Session;
use crate::sync::ReconcileReport;

use super::helpers::{drain_alerts, indexed};

/// Runs a reconciliation now instead of waiting for the next reconnect.
pub async fn sync_now<C, R>(session: &Session<C, R>) -> Result<CmdResult>
where
    C: LocalCache + 'static,
    R: RemoteStore + 'static,
{
    let report = session.engine().reconcile().await;
    let mut result = CmdResult::default();
    for message in reconcile_messages(&report) {
        result.add_message(message);
    }
    drain_alerts(session, &mut result);
    Ok(result)
}

/// Pulls the remote notes, then pushes whatever the pull left pending.
pub async fn refresh<C, R>(session: &Session<C, R>) -> Result<CmdResult>
where
    C: LocalCache + 'static,
    R: RemoteStore + 'static,
{
    let mut result = CmdResult::default();
    if !session.is_online() {
        result.add_message(CmdMessage::info("Offline; showing notes on this device"));
        drain_alerts(session, &mut result);
        return Ok(result.with_listed_notes(indexed(session)));
    }

    match session.engine().pull().await {
        Ok(pull) => {
            let merge = pull.merge;
            if merge.changed() == 0 {
                result.add_message(CmdMessage::info("Already up to date"));
            } else {
                result.add_message(CmdMessage::success(format!(
                    "Pulled {} new, {} updated, {} removed",
                    merge.inserted, merge.updated, merge.removed
                )));
            }
            if pull.malformed > 0 {
                result.add_message(CmdMessage::warning(format!(
                    "Skipped {} unreadable note(s) from the server",
                    pull.malformed
                )));
            }
        }
        Err(e) => {
            result.add_message(CmdMessage::warning(format!("Could not refresh: {}", e)));
        }
    }

    let report = session.engine().reconcile().await;
    if !report.is_idle() {
        for message in reconcile_messages(&report) {
            result.add_message(message);
        }
    }
    drain_alerts(session, &mut result);
    Ok(result.with_listed_notes(indexed(session)))
}

/// Human-readable summary of a reconciliation pass.
pub fn reconcile_messages(report: &ReconcileReport) -> Vec<CmdMessage> {
    if !report.ran {
        return vec![CmdMessage::info(
            "Offline; changes will sync when back online",
        )];
    }

    let mut messages = Vec::new();
    if let Some(removed) = report.bulk_removed {
        messages.push(CmdMessage::success(format!(
            "Removed {} unpinned note(s) from the server",
            removed
        )));
    }
    if report.pushed > 0 {
        messages.push(CmdMessage::success(format!(
            "Synced {} note(s)",
            report.pushed
        )));
    }
    if report.tombstones_flushed > 0 {
        messages.push(CmdMessage::success(format!(
            "Sent {} deletion(s)",
            report.tombstones_flushed
        )));
    }
    if report.oversized > 0 {
        messages.push(CmdMessage::info(format!(
            "{} note(s) too long to sync are kept on this device",
            report.oversized
        )));
    }
    for error in &report.errors {
        messages.push(CmdMessage::warning(format!(
            "Sync incomplete: {}. Will retry",
            error
        )));
    }
    if messages.is_empty() {
        messages.push(CmdMessage::info("Everything is in sync"));
    }
    messages
}
