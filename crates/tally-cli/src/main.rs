//! CLI for structuring scanned fleet invoices.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{approve, batch, config, dataset, extract, pending, reset, suppliers, Context};

/// tally - Turn scanned supplier invoices into one reconciled dataset
#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the dataset and ledger (overrides the config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a draft record from one scanned invoice
    Extract(extract::ExtractArgs),

    /// Extract drafts for every pending scan of a supplier
    ExtractAll(batch::ExtractAllArgs),

    /// Approve a reviewed draft into the dataset
    Approve(approve::ApproveArgs),

    /// List scans not yet approved
    Pending(pending::PendingArgs),

    /// Fold a CSV of dataset rows into the dataset
    Merge(dataset::MergeArgs),

    /// Show per-supplier totals of the dataset
    Summary,

    /// Clear processed flags in the ledger (passphrase required)
    Reset(reset::ResetArgs),

    /// List known supplier layouts
    Suppliers,

    /// Manage configuration
    Config(config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let context = || Context::load(cli.config.as_deref(), cli.data_dir.clone());

    // Execute command
    match cli.command {
        Commands::Extract(args) => extract::run(args, &context()?),
        Commands::ExtractAll(args) => batch::run(args, &context()?),
        Commands::Approve(args) => approve::run(args, &context()?),
        Commands::Pending(args) => pending::run(args, &context()?),
        Commands::Merge(args) => dataset::merge(args, &context()?),
        Commands::Summary => dataset::summary(&context()?),
        Commands::Reset(args) => reset::run(args, &context()?),
        Commands::Suppliers => suppliers::run(&context()?),
        Commands::Config(args) => config::run(args, cli.config.as_deref()),
    }
}
