//! `roster diff`: show unified diffs for what sync would write.

use anyhow::{anyhow, bail, Result};
use clap::Args;
use colored::Colorize;

use roster_sync::{diff_profiles, DiffReport, LocalStore};

use super::SourceArgs;

/// Arguments for `roster diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let (_, options) = self.source.resolve()?;
        let DiffReport { diffs, report } =
            diff_profiles(&LocalStore, &options).map_err(|e| anyhow!(e))?;
        let errors = &report.stats.errors;

        if diffs.is_empty() && errors.is_empty() {
            println!(
                "No differences under {} ({}).",
                options.profiles_root.display(),
                report.outcome()
            );
            return Ok(());
        }

        for diff in &diffs {
            println!(
                "{} {} ({} match, {} field(s))",
                "#".bright_black(),
                diff.employee.bold(),
                diff.tier,
                diff.changes.len()
            );
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }

        if !errors.is_empty() {
            println!();
            println!("{}", "Errors".red().bold());
            for error in errors {
                println!("  ✗  {}: {}", error.path.display(), error.message);
            }
            bail!("{} profile(s) could not be diffed", errors.len());
        }

        Ok(())
    }
}
