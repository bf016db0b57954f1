//! # Rendering Module
//!
//! Turns `CmdResult` pieces into terminal text.
//!
//! Layout math (widths, truncation, padding) is done on plain strings with
//! `unicode-width` before any styling is applied, so ANSI codes never throw
//! off the columns.

use super::styles::{paint, StyleName};
use chrono::{DateTime, Utc};
use qnoteapp::commands::{CmdMessage, MessageLevel, StatusReport};
use qnoteapp::index::{DisplayIndex, DisplayNote};
use qnoteapp::model::{Note, SyncState};
use std::fmt::Write;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Configuration for list rendering.
pub const LINE_WIDTH: usize = 100;
pub const TIME_WIDTH: usize = 14;
pub const PIN_MARKER: &str = "⚲";
pub const PUBLIC_MARKER: &str = "⇗";
const ELLIPSIS: &str = "…";

/// One-character sync marker shown next to every listed note.
fn sync_marker(note: &Note) -> (&'static str, StyleName) {
    match note.sync_state() {
        SyncState::Synced => ("✓", StyleName::Synced),
        SyncState::Syncing => ("↻", StyleName::Pending),
        SyncState::NotSynced if note.needs_sync() => ("●", StyleName::Pending),
        SyncState::NotSynced => ("◌", StyleName::LocalOnly),
    }
}

/// Human label for a note's sync state, telling oversized notes apart.
pub fn sync_label(note: &Note) -> &'static str {
    match note.sync_state() {
        SyncState::Synced => "synced",
        SyncState::Syncing => "syncing",
        SyncState::NotSynced if note.needs_sync() => "waiting to sync",
        SyncState::NotSynced => "too long to sync; kept on this device",
    }
}

/// Cuts `text` to at most `max_width` columns, ending with an ellipsis when cut.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let room = max_width.saturating_sub(ELLIPSIS.width());
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > room {
            break;
        }
        out.push(c);
        used += w;
    }
    if max_width > 0 {
        out.push_str(ELLIPSIS);
    }
    out
}

pub fn render_note_list(notes: &[DisplayNote]) -> String {
    render_note_list_internal(notes, console::colors_enabled())
}

fn render_note_list_internal(notes: &[DisplayNote], color: bool) -> String {
    if notes.is_empty() {
        return "No notes found.\n".to_string();
    }

    let mut out = String::new();
    let mut last_was_pinned = false;

    for dn in notes {
        let is_pinned_section = matches!(dn.index, DisplayIndex::Pinned(_));
        if last_was_pinned && !is_pinned_section {
            out.push('\n');
        }
        last_was_pinned = is_pinned_section;

        let idx_str = match dn.index {
            DisplayIndex::Pinned(n) => format!("p{}. ", n),
            DisplayIndex::Regular(n) => format!("{:02}. ", n),
        };
        let left = if is_pinned_section {
            format!("{} ", paint(StyleName::Pinned, PIN_MARKER, color))
        } else {
            "  ".to_string()
        };
        let (marker, marker_style) = sync_marker(&dn.note);
        let public = if dn.note.is_public() { PUBLIC_MARKER } else { " " };

        // pin column + index + sync marker + public marker + time column
        let fixed = 2 + idx_str.width() + 2 + 2 + TIME_WIDTH;
        let available = LINE_WIDTH.saturating_sub(fixed);
        let title = truncate_to_width(dn.note.title(), available);
        let padding = " ".repeat(available.saturating_sub(title.width()));

        let index_style = if is_pinned_section {
            StyleName::Pinned
        } else {
            StyleName::ListIndex
        };
        let _ = writeln!(
            out,
            "{}{}{} {} {}{}{}",
            left,
            paint(index_style, &idx_str, color),
            paint(marker_style, marker, color),
            paint(StyleName::Public, public, color),
            paint(StyleName::Regular, &title, color),
            padding,
            paint(StyleName::Time, format_time_ago(dn.note.timestamp), color),
        );
    }
    out
}

pub fn render_full_notes(notes: &[DisplayNote]) -> String {
    render_full_notes_internal(notes, console::colors_enabled())
}

fn render_full_notes_internal(notes: &[DisplayNote], color: bool) -> String {
    if notes.is_empty() {
        return "No notes found.\n".to_string();
    }

    let mut out = String::new();
    for (i, dn) in notes.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(
            out,
            "{} {}",
            paint(StyleName::ListIndex, dn.index, color),
            paint(StyleName::Title, dn.note.title(), color)
        );
        let mut meta = vec![
            format_time_ago(dn.note.timestamp).trim().to_string(),
            sync_label(&dn.note).to_string(),
        ];
        if dn.note.is_pinned {
            meta.push("pinned".to_string());
        }
        if let Some(public_id) = dn.note.public_id() {
            meta.push(format!(
                "public at {}",
                qnoteapp::commands::publish::public_link(public_id)
            ));
        }
        let _ = writeln!(out, "{}", paint(StyleName::Muted, meta.join(" · "), color));
        out.push('\n');
        let _ = writeln!(out, "{}", dn.note.content);
    }
    out
}

pub fn render_messages(messages: &[CmdMessage]) -> String {
    render_messages_internal(messages, console::colors_enabled())
}

fn render_messages_internal(messages: &[CmdMessage], color: bool) -> String {
    let mut out = String::new();
    for msg in messages {
        let style = match msg.level {
            MessageLevel::Info => StyleName::Info,
            MessageLevel::Success => StyleName::Success,
            MessageLevel::Warning => StyleName::Warning,
            MessageLevel::Error => StyleName::Error,
        };
        let _ = writeln!(out, "{}", paint(style, &msg.content, color));
    }
    out
}

pub fn render_status(status: &StatusReport) -> String {
    render_status_internal(status, console::colors_enabled())
}

fn render_status_internal(status: &StatusReport, color: bool) -> String {
    let network_style = if status.network.is_online() {
        StyleName::Synced
    } else {
        StyleName::Pending
    };
    let mut rows = vec![
        ("user", status.user_id.clone(), StyleName::Title),
        ("network", status.network.to_string(), network_style),
        ("notes", status.total.to_string(), StyleName::Regular),
        ("pinned", status.pinned.to_string(), StyleName::Regular),
        ("public", status.public.to_string(), StyleName::Regular),
        ("synced", status.synced.to_string(), StyleName::Synced),
        ("waiting", status.pending.to_string(), pending_style(status.pending)),
        ("local only", status.local_only.to_string(), StyleName::LocalOnly),
        (
            "deletions",
            status.pending_deletions.to_string(),
            pending_style(status.pending_deletions),
        ),
    ];
    if status.bulk_deletion_pending {
        rows.push(("purge", "waiting to sync".to_string(), StyleName::Pending));
    }

    let label_width = rows.iter().map(|(label, _, _)| label.width()).max().unwrap_or(0);
    let mut out = String::new();
    for (label, value, style) in rows {
        let _ = writeln!(
            out,
            "{}  {}",
            paint(StyleName::Muted, format!("{:>width$}", label, width = label_width), color),
            paint(style, value, color)
        );
    }
    out
}

fn pending_style(count: usize) -> StyleName {
    if count > 0 {
        StyleName::Pending
    } else {
        StyleName::Regular
    }
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let formatter = timeago::Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());

    // Pad units to the width of "seconds" so the "ago" column lines up.
    let time_str = time_str
        .replace("hours ago", "  hours ago")
        .replace("hour ago", "   hour ago")
        .replace("days ago", "   days ago")
        .replace("day ago", "    day ago")
        .replace("weeks ago", "  weeks ago")
        .replace("week ago", "   week ago")
        .replace("months ago", " months ago")
        .replace("month ago", "  month ago")
        .replace("years ago", "  years ago")
        .replace("year ago", "   year ago");

    format!("{:>width$}", time_str, width = TIME_WIDTH)
}
