//! # CLI Behavior
//!
//! This is **one possible UI client** for qnote, not the application itself.
//! The CLI is the only place that knows about terminal I/O, exit codes, and
//! output formatting.
//!
//! ## Offline First
//!
//! Every command writes to the local cache before anything else, so commands
//! work the same with or without a network. `--offline` pins the connectivity
//! signal to offline for the whole invocation; pending work is then reported
//! and left for a later run.
//!
//! ### Naked Execution (`qnote`)
//!
//! Running `qnote` with no arguments defaults to `qnote list`.
//!
//! ### Create From Stdin
//!
//! `qnote create` with no words reads the note from stdin:
//! `echo "buy milk" | qnote create`.
//!
//! ### Addressing Notes
//!
//! Notes are addressed by display index (`p1`, `3`) or by id; an id prefix is
//! enough when it is unique.
//!
//! ## Module Structure
//!
//! - `commands`: Context setup, dispatch and printing
//! - `render`: Output formatting (lists, full notes, messages, status)
//! - `setup`: Argument parsing via clap, help text
//! - `styles`: Terminal styles

mod commands;
mod render;
pub mod setup;
mod styles;

pub use commands::run;
