use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_USER: &str = "default";

#[derive(Parser, Debug)]
#[command(
    name = "qnote",
    bin_name = "qnote",
    version,
    disable_help_subcommand = true,
    after_help = "Notes are saved on this device first and synced when online.\nRun `qnote status` to see what has not reached the server yet."
)]
#[command(about = "Offline-first notes for the terminal", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Account to sign in as
    #[arg(short, long, global = true, default_value = DEFAULT_USER, help_heading = "Options")]
    pub user: String,

    /// Work without the network; changes sync on a later run
    #[arg(long, global = true, help_heading = "Options")]
    pub offline: bool,

    /// Data directory (defaults to the platform data dir)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true, help_heading = "Options")]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create a note
    #[command(alias = "n", display_order = 1)]
    Create {
        /// Note text (read from stdin when omitted)
        #[arg(trailing_var_arg = true)]
        content: Vec<String>,
    },

    /// List notes
    #[command(alias = "ls", display_order = 2)]
    List {
        /// Only notes containing this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show a note in full
    #[command(alias = "v", display_order = 3)]
    View {
        /// Display index (e.g. 1, p1) or id
        note: String,
    },

    /// Replace a note's text
    #[command(alias = "e", display_order = 4)]
    Edit {
        /// Display index (e.g. 1, p1) or id
        note: String,

        /// New text (read from stdin when omitted)
        #[arg(trailing_var_arg = true)]
        content: Vec<String>,
    },

    /// Delete a note
    #[command(alias = "rm", display_order = 5)]
    Delete {
        /// Display index (e.g. 1, p1) or id
        note: String,
    },

    /// Pin or unpin a note
    #[command(alias = "p", display_order = 6)]
    Pin {
        /// Display index (e.g. 1, p1) or id
        note: String,
    },

    /// Share a note publicly, or stop sharing it
    #[command(display_order = 7)]
    Public {
        /// Display index (e.g. 1, p1) or id
        note: String,
    },

    /// Send pending changes to the server
    #[command(display_order = 20)]
    Sync,

    /// Pull changes from the server, then send pending ones
    #[command(display_order = 21)]
    Refresh,

    /// Delete every unpinned note
    #[command(name = "purge-unpinned", display_order = 22)]
    PurgeUnpinned,

    /// Show what has and has not synced
    #[command(display_order = 23)]
    Status,
}

impl Cli {
    /// Naked `qnote` lists.
    pub fn command_or_default(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::List { search: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_naked_invocation_lists() {
        let cli = parse(&["qnote"]);
        assert_eq!(cli.command_or_default(), Commands::List { search: None });
        assert_eq!(cli.user, DEFAULT_USER);
        assert!(!cli.offline);
    }

    #[test]
    fn test_create_joins_words() {
        let cli = parse(&["qnote", "create", "buy", "milk"]);
        assert_eq!(
            cli.command,
            Some(Commands::Create {
                content: vec!["buy".to_string(), "milk".to_string()]
            })
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["qnote", "list", "--offline", "--user", "bob", "--json"]);
        assert!(cli.offline);
        assert!(cli.json);
        assert_eq!(cli.user, "bob");
    }

    #[test]
    fn test_edit_takes_selector_and_text() {
        let cli = parse(&["qnote", "edit", "p1", "new", "text"]);
        assert_eq!(
            cli.command,
            Some(Commands::Edit {
                note: "p1".to_string(),
                content: vec!["new".to_string(), "text".to_string()]
            })
        );
    }

    #[test]
    fn test_purge_unpinned_name() {
        let cli = parse(&["qnote", "purge-unpinned"]);
        assert_eq!(cli.command, Some(Commands::PurgeUnpinned));
    }

    #[test]
    fn test_list_search_and_alias() {
        let cli = parse(&["qnote", "ls", "-s", "milk"]);
        assert_eq!(
            cli.command,
            Some(Commands::List {
                search: Some("milk".to_string())
            })
        );
    }
}
