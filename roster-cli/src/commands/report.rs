//! `roster report`: show the summary the last sync recorded.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use roster_sync::state::{self, RunState};

use super::{load_config, state_path};

/// Arguments for `roster report`.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// State file to read instead of the configured one.
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Emit the state file as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ReportArgs {
    pub fn run(self) -> Result<()> {
        let path = match self.state_file {
            Some(path) => path,
            None => state_path(&load_config(None)?)?,
        };

        let Some(state) = state::load(&path)
            .with_context(|| format!("failed to read state file {}", path.display()))?
        else {
            println!("No sync recorded yet ({} does not exist).", path.display());
            return Ok(());
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&state).context("failed to serialize state")?
            );
            return Ok(());
        }

        print_summary(&state);
        Ok(())
    }
}

#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "employee")]
    employee: String,
    #[tabled(rename = "field")]
    field: String,
    #[tabled(rename = "old")]
    old: String,
    #[tabled(rename = "new")]
    new: String,
}

fn print_summary(state: &RunState) {
    let stats = &state.stats;
    println!(
        "Last sync {} ({}) | {}",
        format_age(state.timestamp),
        state.timestamp.to_rfc3339(),
        state.outcome,
    );
    println!(
        "  found {} · updated {} · fields {} · skipped {} · errors {}",
        stats.profiles_found,
        stats.profiles_updated,
        stats.fields_changed,
        stats.profiles_skipped.len(),
        state.errors_count,
    );

    if !state.changes.is_empty() {
        let rows: Vec<ChangeRow> = state
            .changes
            .iter()
            .map(|c| ChangeRow {
                employee: c.employee.clone(),
                field: c.field.label().to_string(),
                old: c.old_value.clone().unwrap_or_default(),
                new: c.new_value.clone(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        if state.changes_count > state.changes.len() {
            println!(
                "  (latest {} of {} changes)",
                state.changes.len(),
                state.changes_count
            );
        }
    }

    for error in &state.errors {
        println!(
            "  {}  {}: {}",
            "✗".red().bold(),
            error.path.display(),
            error.message
        );
    }
}

fn format_age(timestamp: DateTime<Utc>) -> String {
    let secs = Utc::now()
        .signed_duration_since(timestamp)
        .num_seconds()
        .max(0);
    match secs {
        0..=59 => format!("{secs}s ago"),
        60..=3_599 => format!("{}m ago", secs / 60),
        3_600..=86_399 => format!("{}h ago", secs / 3_600),
        _ => format!("{}d ago", secs / 86_400),
    }
}
