//! Roster sync: keep employee profile documents in line with the roster.
//!
//! # Usage
//!
//! ```text
//! roster sync [--roster <path>] [--profiles-root <path>] [--pattern <glob>]
//!             [--dry-run] [--jobs N] [--json] [--config <path>] [--no-state]
//! roster diff [--roster <path>] [--profiles-root <path>] [--pattern <glob>] [--config <path>]
//! roster report [--state-file <path>] [--json]
//! ```
//!
//! Logs go to stderr (`RUST_LOG`, or `--verbose` for debug); stdout carries
//! only the report.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{diff::DiffArgs, report::ReportArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "roster",
    version,
    about = "Sync employee profile documents from the roster table",
    long_about = None,
)]
struct Cli {
    /// Log debug detail to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Match profiles to roster records and update out-of-date fields.
    Sync(SyncArgs),

    /// Show unified diffs of what sync would change.
    Diff(DiffArgs),

    /// Show the summary recorded by the last sync.
    Report(ReportArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Report(args) => args.run(),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
