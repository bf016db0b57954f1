//! # Command Layer
//!
//! This module contains the business logic of qnote. Each command lives in its
//! own submodule as an async function over a [`Session`](crate::session::Session).
//!
//! ## Role and Responsibilities
//!
//! Commands:
//! - Validate input (trimming, empty content, unchanged content)
//! - Mutate the note store, then hand the note to the sync engine
//! - Translate sync outcomes into structured messages
//! - Are completely UI-agnostic
//!
//! ## What Commands Do NOT Do
//!
//! - **Any terminal I/O**: No stdout, stderr or formatting
//! - **Argument parsing**: That's the CLI layer's job
//! - **Session management**: Signing in and out belongs to the API facade
//!
//! ## Structured Returns
//!
//! Commands return [`CmdResult`], not strings:
//! - `affected_notes`: Notes that were modified, with their display index
//! - `listed_notes`: Notes to display
//! - `messages`: Messages with levels (info, success, warning, error)
//! - `status`: Sync status, for the `status` command
//!
//! Remote failures are never errors at this level. A push that fails leaves
//! the note pending and shows up as a warning message. Local storage failures
//! are drained from the store's alert queue into warnings the same way.
//!
//! ## Command Modules
//!
//! - [`create`]: Create a note
//! - [`update`]: Replace a note's content
//! - [`delete`]: Delete a note
//! - [`pinning`]: Toggle pinned state
//! - [`publish`]: Toggle the public copy
//! - [`list`]: List and search notes, view one note
//! - [`sync`]: Reconcile and pull
//! - [`purge`]: Delete all unpinned notes
//! - [`status`]: Summarize sync state
//! - [`helpers`]: Shared utilities

use crate::index::DisplayNote;
use serde::Serialize;

pub mod create;
pub mod delete;
pub mod helpers;
pub mod list;
pub mod pinning;
pub mod publish;
pub mod purge;
pub mod status;
pub mod sync;
pub mod update;

pub use status::StatusReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct CmdResult {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub affected_notes: Vec<DisplayNote>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub listed_notes: Vec<DisplayNote>,
    pub messages: Vec<CmdMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusReport>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected_notes(mut self, notes: Vec<DisplayNote>) -> Self {
        self.affected_notes = notes;
        self
    }

    pub fn with_listed_notes(mut self, notes: Vec<DisplayNote>) -> Self {
        self.listed_notes = notes;
        self
    }

    pub fn has_level(&self, level: MessageLevel) -> bool {
        self.messages.iter().any(|m| m.level == level)
    }
}
