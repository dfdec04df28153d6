//! Last-run state: a JSON summary of the most recent non-dry run.
//!
//! Persists a [`RunState`] document (default `~/.roster-sync/last_sync.json`)
//! so a scheduler can archive it and `roster report` can show it later.
//! Writes use the atomic `.tmp` + rename pattern.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, SyncError};
use crate::report::{ChangeRecord, ItemError, RunOutcome, RunReport, RunStatistics};

/// Most recent changes kept in the state file.
pub const MAX_RECORDED_CHANGES: usize = 50;

/// On-disk run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub timestamp: DateTime<Utc>,
    pub dry_run: bool,
    pub outcome: RunOutcome,
    pub stats: RunStatistics,
    pub changes_count: usize,
    pub errors_count: usize,
    /// The last [`MAX_RECORDED_CHANGES`] changes.
    pub changes: Vec<ChangeRecord>,
    pub errors: Vec<ItemError>,
}

impl RunState {
    pub fn from_report(report: &RunReport) -> Self {
        let skip = report.changes.len().saturating_sub(MAX_RECORDED_CHANGES);
        Self {
            timestamp: report.finished_at.unwrap_or_else(Utc::now),
            dry_run: report.dry_run,
            outcome: report.outcome(),
            stats: report.stats.clone(),
            changes_count: report.changes.len(),
            errors_count: report.stats.errors.len(),
            changes: report.changes[skip..].to_vec(),
            errors: report.stats.errors.clone(),
        }
    }
}

/// Save the state file atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn save(path: &Path, state: &RunState) -> Result<(), SyncError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }

    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

/// Load the state file. Returns `None` if no run has been recorded yet.
pub fn load(path: &Path) -> Result<Option<RunState>, SyncError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    Ok(Some(serde_json::from_str(&contents)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::FieldName;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn change(i: usize) -> ChangeRecord {
        ChangeRecord {
            path: PathBuf::from(format!("/Nov25/D/E{i}/Profile.md")),
            employee: format!("E{i}"),
            field: FieldName::Rate,
            old_value: Some("$1".into()),
            new_value: format!("${i}"),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn missing_file_loads_as_none() {
        let tmp = TempDir::new().unwrap();
        assert!(load(&tmp.path().join("last_sync.json")).unwrap().is_none());
    }

    #[test]
    fn roundtrip_save_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("last_sync.json");
        let mut report = RunReport::new(false);
        report.stats.profiles_found = 1;
        report.stats.profiles_matched = 1;
        report.stats.profiles_updated = 1;
        report.stats.fields_changed = 1;
        report.changes.push(change(1));
        report.finish();

        let state = RunState::from_report(&report);
        save(&path, &state).unwrap();
        let loaded = load(&path).unwrap().expect("state");
        assert_eq!(loaded, state);
        assert_eq!(loaded.outcome, RunOutcome::Updated);
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("last_sync.json");
        save(&path, &RunState::from_report(&RunReport::new(false))).unwrap();
        assert!(
            !path.with_extension("json.tmp").exists(),
            "tmp file should be removed after atomic rename"
        );
    }

    #[test]
    fn keeps_only_latest_changes() {
        let mut report = RunReport::new(false);
        report.changes = (0..60).map(change).collect();
        let state = RunState::from_report(&report);
        assert_eq!(state.changes_count, 60);
        assert_eq!(state.changes.len(), MAX_RECORDED_CHANGES);
        assert_eq!(state.changes[0].employee, "E10");
    }
}
