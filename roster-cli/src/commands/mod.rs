pub mod diff;
pub mod report;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use roster_core::{config, SyncConfig};
use roster_sync::SyncOptions;

/// Where the roster and profiles live. Flags override `config.yaml`.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Markdown file holding the roster table.
    #[arg(long)]
    pub roster: Option<PathBuf>,

    /// Directory searched recursively for profile documents.
    #[arg(long)]
    pub profiles_root: Option<PathBuf>,

    /// Filename glob for profile documents (default `Profile*.md`).
    #[arg(long)]
    pub pattern: Option<String>,

    /// Config file to read instead of `~/.roster-sync/config.yaml`.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl SourceArgs {
    /// Merge flags over the config file into run options.
    pub fn resolve(&self) -> Result<(SyncConfig, SyncOptions)> {
        let config = load_config(self.config.as_ref())?;

        let roster = self
            .roster
            .clone()
            .or_else(|| config.roster_path.clone())
            .context("no roster given; pass --roster or set roster_path in config.yaml")?;
        let root = self
            .profiles_root
            .clone()
            .or_else(|| config.profiles_root.clone())
            .context("no profiles root given; pass --profiles-root or set profiles_root in config.yaml")?;
        let pattern = self
            .pattern
            .clone()
            .unwrap_or_else(|| config.pattern().to_string());

        let options = SyncOptions::new(roster, root)
            .pattern(pattern)
            .jobs(config.jobs.unwrap_or(1));
        Ok((config, options))
    }
}

pub fn load_config(path: Option<&PathBuf>) -> Result<SyncConfig> {
    match path {
        Some(path) => config::load_from(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => config::load_or_default().context("failed to load ~/.roster-sync/config.yaml"),
    }
}

/// State file from config, falling back to `~/.roster-sync/last_sync.json`.
pub fn state_path(config: &SyncConfig) -> Result<PathBuf> {
    match &config.state_file {
        Some(path) => Ok(path.clone()),
        None => config::default_state_path().context("could not determine home directory"),
    }
}
