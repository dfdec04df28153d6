//! `roster sync`: match profiles to the roster and update changed fields.

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use colored::Colorize;

use roster_sync::{
    pipeline,
    report::ChangeRecord,
    state::{self, RunState},
    LocalStore, RunOutcome, RunReport,
};

use super::{state_path, SourceArgs};

/// Changes listed before the summary is cut off.
const CHANGES_SHOWN: usize = 10;

/// Arguments for `roster sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Report what would change without writing any profile.
    #[arg(long)]
    pub dry_run: bool,

    /// Worker threads for per-profile processing.
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Emit the full run report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Do not write the last-run state file.
    #[arg(long)]
    pub no_state: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let (config, mut options) = self.source.resolve()?;
        options = options.dry_run(self.dry_run);
        if let Some(jobs) = self.jobs {
            options = options.jobs(jobs);
        }

        let report = match pipeline::run(&LocalStore, &options) {
            Ok(report) => report,
            Err(fatal) => {
                if self.json {
                    print_json(&fatal.report)?;
                }
                return Err(anyhow!(fatal));
            }
        };

        if self.json {
            print_json(&report)?;
        } else {
            print_report(&report);
        }

        if !report.dry_run && !self.no_state {
            let path = state_path(&config)?;
            state::save(&path, &RunState::from_report(&report))
                .with_context(|| format!("failed to write state file {}", path.display()))?;
            tracing::debug!(path = %path.display(), "saved run state");
        }

        let errors = report.stats.errors.len();
        if errors > 0 {
            bail!("{errors} profile(s) could not be synced");
        }
        Ok(())
    }
}

fn print_json(report: &RunReport) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(report).context("failed to serialize run report")?
    );
    Ok(())
}

fn print_report(report: &RunReport) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    let stats = &report.stats;
    let outcome = report.outcome();

    let mark = match outcome {
        RunOutcome::NothingFound | RunOutcome::NoneMatched => "!".yellow().bold(),
        RunOutcome::InSync | RunOutcome::Updated => "✓".green().bold(),
    };
    match outcome {
        RunOutcome::Updated if report.dry_run => println!(
            "{prefix}{mark} would update {} profile(s), {} field(s)",
            stats.profiles_updated, stats.fields_changed
        ),
        RunOutcome::Updated => println!(
            "{prefix}{mark} updated {} profile(s), {} field(s)",
            stats.profiles_updated, stats.fields_changed
        ),
        other => println!("{prefix}{mark} {other}"),
    }
    println!(
        "  found {} · matched {} · in sync {} · skipped {} · errors {}",
        stats.profiles_found,
        stats.profiles_matched,
        stats.profiles_in_sync,
        stats.profiles_skipped.len(),
        stats.errors.len(),
    );

    if !report.changes.is_empty() {
        println!();
        println!("{}", "Changes".bold());
        for change in report.changes.iter().take(CHANGES_SHOWN) {
            println!("  ✎  {}", describe_change(change));
        }
        if report.changes.len() > CHANGES_SHOWN {
            println!("  ... and {} more", report.changes.len() - CHANGES_SHOWN);
        }
    }

    if !stats.profiles_skipped.is_empty() {
        println!();
        println!("{}", "Skipped".bold());
        for skipped in &stats.profiles_skipped {
            println!("  ·  {} ({})", skipped.path.display(), skipped.reason);
        }
    }

    if !stats.warnings.is_empty() {
        println!();
        println!("{}", "Warnings".yellow().bold());
        for warning in &stats.warnings {
            println!("  ~  {}: {}", warning.path.display(), warning.message);
        }
    }

    if !stats.errors.is_empty() {
        println!();
        println!("{}", "Errors".red().bold());
        for error in &stats.errors {
            println!("  ✗  {}: {}", error.path.display(), error.message);
        }
    }
}

fn describe_change(change: &ChangeRecord) -> String {
    format!(
        "{}: {} {} → {}",
        change.employee,
        change.field.label(),
        change.old_value.as_deref().unwrap_or("(empty)"),
        change.new_value
    )
}
