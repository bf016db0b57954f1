//! # CLI Layer
//!
//! The CLI layer is the **only** place in the codebase that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Owns the tokio runtime and the tracing subscriber
//! - Handles argument parsing
//! - Formats output for human consumption
//!
//! ## Responsibilities
//!
//! 1. **Argument Parsing**: Convert shell arguments into typed commands via clap
//! 2. **Context Setup**: Resolve the data directory, load config, build the API
//! 3. **Dispatch**: Sign in, come online, run one command, sign out
//! 4. **Output Formatting**: Render the `CmdResult`, or print it as JSON

use super::render::{render_full_notes, render_messages, render_note_list, render_status};
use super::setup::{Cli, Commands};
use anyhow::{bail, Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use qnoteapp::api::QnoteApi;
use qnoteapp::cache::fs::FsCache;
use qnoteapp::commands::sync::reconcile_messages;
use qnoteapp::commands::{CmdMessage, CmdResult, MessageLevel};
use qnoteapp::config::QnoteConfig;
use qnoteapp::connectivity::{ConnectivitySignal, NetworkStatus};
use qnoteapp::remote::fs::FsRemote;
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

type Api = QnoteApi<FsCache, FsRemote>;

/// What a command produced, and how to show it.
enum Output {
    Messages(CmdResult),
    List(CmdResult),
    Full(CmdResult),
    Status(CmdResult),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Could not start the async runtime")?;
    runtime.block_on(run_async(cli))
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("qnote={},qnoteapp={}", level, level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_async(cli: Cli) -> Result<()> {
    let data_dir = resolve_data_dir(&cli)?;
    debug!(data_dir = %data_dir.display(), "Using data directory");
    let config = QnoteConfig::load(&data_dir).context("Could not load qnote.toml")?;

    let mut api = QnoteApi::new(
        Arc::new(FsCache::new(data_dir.join("cache"))),
        Arc::new(FsRemote::new(data_dir.join("remote"))),
        ConnectivitySignal::new(NetworkStatus::Offline),
        config,
    );
    let signed_in = api.sign_in(&cli.user).await?;
    // The first message only confirms the sign-in; the rest are load problems.
    let mut preamble: Vec<CmdMessage> = signed_in.messages.into_iter().skip(1).collect();

    if !cli.offline {
        // Coming online at launch sends whatever earlier offline runs left.
        api.connectivity().set(NetworkStatus::Online);
        if let Some(report) = api.next_reconcile_report().await {
            debug!(pushed = report.pushed, "Launch reconciliation finished");
            preamble.extend(
                reconcile_messages(&report)
                    .into_iter()
                    .filter(|m| m.level == MessageLevel::Warning),
            );
        }
    }

    let outcome = dispatch(&api, cli.command_or_default()).await;
    api.settle().await;
    api.sign_out().await?;
    let output = outcome?;

    if cli.json {
        print_json(&output)?;
    } else {
        print!("{}", render_messages(&preamble));
        print_output(&output);
    }
    Ok(())
}

fn resolve_data_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(dir) = &cli.data_dir {
        return Ok(dir.clone());
    }
    let dirs = ProjectDirs::from("com", "qnote", "qnote")
        .context("Could not determine a data directory; pass --data-dir")?;
    Ok(dirs.data_dir().to_path_buf())
}

async fn dispatch(api: &Api, command: Commands) -> Result<Output> {
    let output = match command {
        Commands::Create { content } => {
            let text = content_or_stdin(content)?;
            Output::Messages(api.create_note(&text).await?)
        }
        Commands::List { search } => Output::List(api.list_visible(search.as_deref())?),
        Commands::View { note } => Output::Full(api.view_note(&note)?),
        Commands::Edit { note, content } => {
            let text = content_or_stdin(content)?;
            Output::Messages(api.update_note(&note, &text).await?)
        }
        Commands::Delete { note } => Output::Messages(api.delete_note(&note).await?),
        Commands::Pin { note } => Output::Messages(api.toggle_pin(&note).await?),
        Commands::Public { note } => Output::Messages(api.toggle_public(&note).await?),
        Commands::Sync => Output::Messages(api.sync_now().await?),
        Commands::Refresh => Output::List(api.refresh().await?),
        Commands::PurgeUnpinned => Output::Messages(api.delete_unpinned().await?),
        Commands::Status => Output::Status(api.status()?),
    };
    Ok(output)
}

/// Joins argument words, or reads stdin when there are none and it is piped.
fn content_or_stdin(words: Vec<String>) -> Result<String> {
    if !words.is_empty() {
        return Ok(words.join(" "));
    }
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        bail!("No note text given; pass it as arguments or pipe it in");
    }
    let mut text = String::new();
    stdin
        .read_to_string(&mut text)
        .context("Could not read stdin")?;
    Ok(text)
}

fn print_output(output: &Output) {
    match output {
        Output::Messages(result) => print!("{}", render_messages(&result.messages)),
        Output::List(result) => {
            print!("{}", render_messages(&result.messages));
            print!("{}", render_note_list(&result.listed_notes));
        }
        Output::Full(result) => {
            print!("{}", render_messages(&result.messages));
            print!("{}", render_full_notes(&result.listed_notes));
        }
        Output::Status(result) => {
            if let Some(status) = &result.status {
                print!("{}", render_status(status));
            }
            print!("{}", render_messages(&result.messages));
        }
    }
}

fn print_json(output: &Output) -> Result<()> {
    let result = match output {
        Output::Messages(r) | Output::List(r) | Output::Full(r) | Output::Status(r) => r,
    };
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
