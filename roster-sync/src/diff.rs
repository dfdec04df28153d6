//! Dry-run unified diff support for `roster diff`.

use std::path::PathBuf;

use similar::TextDiff;

use roster_core::{FieldChange, MatchTier};

use crate::pipeline::{self, OutcomeKind, Plan, SyncOptions};
use crate::report::RunReport;
use crate::store::FileStore;
use crate::FatalError;

/// What a sync would change in one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDiff {
    pub path: PathBuf,
    pub employee: String,
    pub tier: MatchTier,
    pub changes: Vec<FieldChange>,
    pub unified_diff: String,
}

/// Diffs plus the dry-run report for the same profiles.
///
/// Skips, warnings, and per-item errors land in `report` exactly as they
/// would for `sync --dry-run`.
#[derive(Debug, Clone)]
pub struct DiffReport {
    pub diffs: Vec<ProfileDiff>,
    pub report: RunReport,
}

/// Compute the patch every out-of-sync profile would receive.
///
/// No files are written.
pub fn diff_profiles(
    store: &dyn FileStore,
    options: &SyncOptions,
) -> Result<DiffReport, FatalError> {
    let options = options.clone().dry_run(true);
    let Plan {
        mut report,
        roster,
        profiles,
    } = pipeline::plan(store, &options)?;
    let mut diffs = Vec::new();

    for location in &profiles {
        let (outcome, patch) = pipeline::prepare_profile(store, &roster, location);
        if let (Some(patch), Some((employee, tier)), OutcomeKind::Updated { changes }) =
            (&patch, &outcome.matched, &outcome.kind)
        {
            let relative = location
                .path
                .strip_prefix(&options.profiles_root)
                .unwrap_or(location.path.as_path());
            let old_header = format!("a/{}", relative.display());
            let new_header = format!("b/{}", relative.display());
            let unified = TextDiff::from_lines(&patch.original, &patch.patched)
                .unified_diff()
                .header(&old_header, &new_header)
                .context_radius(2)
                .to_string();

            diffs.push(ProfileDiff {
                path: location.path.clone(),
                employee: employee.clone(),
                tier: *tier,
                changes: changes.clone(),
                unified_diff: unified,
            });
        }
        pipeline::absorb(&mut report, outcome);
    }

    report.finish();
    Ok(DiffReport { diffs, report })
}
