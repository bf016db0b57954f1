//! # Note Identifiers: Id vs Display Index
//!
//! Notes are identified by a UUID string, which is the right choice for
//! syncing between devices and the wrong one for typing at a prompt.
//!
//! ## Display Indexes
//!
//! Every note also gets a short display index, derived from the canonical
//! order of the user's full note list (pinned first, newest first):
//!
//! - Pinned notes: `p1`, `p2`, ...
//! - Everything else: `1`, `2`, ...
//!
//! Indexes are always assigned from the full list, never from a filtered view,
//! so `qnote delete 2` means the same note whether or not the last listing was
//! a search.
//!
//! ## Selectors
//!
//! A [`NoteSelector`] is what a user types to name one note: a display index,
//! or a note id (a unique prefix is enough). Resolution tries an exact id
//! first, then the display index, then an id prefix.

use crate::error::{QnoteError, Result};
use crate::model::Note;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A user-facing index for a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayIndex {
    Pinned(usize),
    Regular(usize),
}

impl fmt::Display for DisplayIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayIndex::Pinned(i) => write!(f, "p{}", i),
            DisplayIndex::Regular(i) => write!(f, "{}", i),
        }
    }
}

impl FromStr for DisplayIndex {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parsed = match s.strip_prefix('p') {
            Some(rest) => rest.parse().map(DisplayIndex::Pinned),
            None => s.parse().map(DisplayIndex::Regular),
        };
        match parsed {
            Ok(DisplayIndex::Pinned(0)) | Ok(DisplayIndex::Regular(0)) => {
                Err(format!("Indexes start at 1: {}", s))
            }
            Ok(index) => Ok(index),
            Err(_) => Err(format!("Invalid index format: {}", s)),
        }
    }
}

impl Serialize for DisplayIndex {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A note paired with its canonical display index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayNote {
    pub index: DisplayIndex,
    pub note: Note,
}

/// Assigns display indexes to a list already in display order.
pub fn index_notes(notes: Vec<Note>) -> Vec<DisplayNote> {
    let mut pinned = 0;
    let mut regular = 0;
    notes
        .into_iter()
        .map(|note| {
            let index = if note.is_pinned {
                pinned += 1;
                DisplayIndex::Pinned(pinned)
            } else {
                regular += 1;
                DisplayIndex::Regular(regular)
            };
            DisplayNote { index, note }
        })
        .collect()
}

/// User input naming a single note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteSelector {
    Index(DisplayIndex),
    Id(String),
}

impl NoteSelector {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(QnoteError::Api("No note given".to_string()));
        }
        Ok(match input.parse::<DisplayIndex>() {
            Ok(index) => NoteSelector::Index(index),
            Err(_) => NoteSelector::Id(input.to_string()),
        })
    }
}

impl fmt::Display for NoteSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteSelector::Index(index) => write!(f, "{}", index),
            NoteSelector::Id(id) => write!(f, "{}", id),
        }
    }
}

/// Finds the note a raw selector names in an indexed list.
pub fn resolve<'a>(indexed: &'a [DisplayNote], input: &str) -> Result<&'a DisplayNote> {
    let trimmed = input.trim();
    if let Some(exact) = indexed.iter().find(|dn| dn.note.id() == trimmed) {
        return Ok(exact);
    }

    match NoteSelector::parse(trimmed)? {
        NoteSelector::Index(index) => indexed
            .iter()
            .find(|dn| dn.index == index)
            .ok_or_else(|| QnoteError::NoteNotFound(format!("Index {} not found", index))),
        NoteSelector::Id(prefix) => {
            let mut matches = indexed.iter().filter(|dn| dn.note.id().starts_with(&prefix));
            match (matches.next(), matches.next()) {
                (Some(found), None) => Ok(found),
                (None, _) => Err(QnoteError::NoteNotFound(format!("No note with id {}", prefix))),
                (Some(_), Some(_)) => Err(QnoteError::Api(format!(
                    "Id prefix {} matches more than one note",
                    prefix
                ))),
            }
        }
    }
}
