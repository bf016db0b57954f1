//! # Configuration
//!
//! Qnote configuration is managed by [`confique`], which handles layered loading
//! from a TOML file, environment variables and compiled defaults.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `QNOTE_CONTENT_CEILING`, `QNOTE_PAGE_SIZE`, etc.
//! 2. **Config file**: `qnote.toml` in the data directory.
//! 3. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `content_ceiling` | `800000` | Notes longer than this (in characters) never sync |
//! | `page_size` | `50` | Page size for incremental loading from the local cache |
//! | `pull_page_size` | `100` | Page size for cursor-paginated remote pulls |
//! | `push_concurrency` | `4` | Parallel pushes during reconciliation |

use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::model::DEFAULT_CONTENT_CEILING;

pub const CONFIG_FILENAME: &str = "qnote.toml";

/// Configuration for the sync core, stored in `qnote.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QnoteConfig {
    /// Notes longer than this many characters are kept local-only.
    #[config(default = 800000, env = "QNOTE_CONTENT_CEILING")]
    pub content_ceiling: usize,

    /// Number of notes read per page when loading from the local cache.
    #[config(default = 50, env = "QNOTE_PAGE_SIZE")]
    pub page_size: usize,

    /// Number of remote documents fetched per page when pulling.
    #[config(default = 100, env = "QNOTE_PULL_PAGE_SIZE")]
    pub pull_page_size: usize,

    /// Upper bound on concurrent pushes during reconciliation.
    #[config(default = 4, env = "QNOTE_PUSH_CONCURRENCY")]
    pub push_concurrency: usize,
}

impl Default for QnoteConfig {
    fn default() -> Self {
        Self {
            content_ceiling: DEFAULT_CONTENT_CEILING,
            page_size: 50,
            pull_page_size: 100,
            push_concurrency: 4,
        }
    }
}

impl QnoteConfig {
    /// Loads env overrides, then `qnote.toml` from `config_dir` if present, then defaults.
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config = QnoteConfig::builder()
            .env()
            .file(config_dir.as_ref().join(CONFIG_FILENAME))
            .load()?;
        Ok(config.normalized())
    }

    /// Zero sizes would stall pagination and concurrency; clamp them to one.
    pub fn normalized(mut self) -> Self {
        self.page_size = self.page_size.max(1);
        self.pull_page_size = self.pull_page_size.max(1);
        self.push_concurrency = self.push_concurrency.max(1);
        self
    }
}
