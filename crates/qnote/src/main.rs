//! # Qnote CLI
//!
//! The binary is intentionally thin: the CLI lives in `src/cli/`, while this
//! file only invokes `cli::run()` and handles process termination.
//!
//! ## Workspace Structure
//!
//! - `crates/qnoteapp/`: Core library with the UI-agnostic sync logic
//! - `crates/qnote/`: This CLI tool, depends on `qnoteapp`
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/qnote/src/cli/)                          │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Runtime, logging and API wiring (commands.rs)            │
//! │  - Terminal rendering with console styles (render.rs)       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (crates/qnoteapp/src/api.rs)                     │
//! │  - Session lifecycle, dispatch to command modules           │
//! │  - Returns structured `CmdResult` values                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything from `api.rs` inward is UI agnostic. The CLI layer owns every
//! user-facing concern: argument parsing, the tokio runtime, the tracing
//! subscriber, rendering and exit codes.
//!
//! ## The Remote Store
//!
//! The CLI syncs against a directory-backed remote store (`FsRemote`). Point
//! two data directories' `remote/` at the same shared folder and they behave
//! like two devices signed into the same account.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
