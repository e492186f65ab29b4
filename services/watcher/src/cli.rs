use crate::demo::{run_demo, DemoArgs};
use crate::export::{export_journal, list_journal, JournalExportArgs, JournalListArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use housewatch::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "housewatch",
    about = "Watch real-estate listings and get notified about new matches",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a single ingestion run and exit (default command)
    Run(RunArgs),
    /// Run periodically and serve health, metrics and history endpoints
    Watch(WatchArgs),
    /// Two offline rounds over built-in sample listings
    Demo(DemoArgs),
    /// Inspect the match journal
    Journal {
        #[command(subcommand)]
        command: JournalCommand,
    },
}

#[derive(Subcommand, Debug)]
enum JournalCommand {
    /// Print journal entries
    List(JournalListArgs),
    /// Write journal entries to a CSV file
    Export(JournalExportArgs),
}

/// Overrides shared by commands that touch the seen-set and journal.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct StorageArgs {
    /// Watch settings file (defaults to HOUSEWATCH_CONFIG)
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    /// Directory holding the seen-set and match journal (defaults to HOUSEWATCH_DATA_DIR)
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct RunArgs {
    #[command(flatten)]
    pub(crate) storage: StorageArgs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct WatchArgs {
    #[command(flatten)]
    pub(crate) storage: StorageArgs,
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seconds between runs (defaults to HOUSEWATCH_INTERVAL_SECS)
    #[arg(long)]
    pub(crate) interval_secs: Option<u64>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Run(RunArgs::default()));

    match command {
        Command::Run(args) => server::run_once(args).await,
        Command::Watch(args) => server::watch(args).await,
        Command::Demo(args) => run_demo(args).await,
        Command::Journal {
            command: JournalCommand::List(args),
        } => list_journal(args),
        Command::Journal {
            command: JournalCommand::Export(args),
        } => export_journal(args),
    }
}
