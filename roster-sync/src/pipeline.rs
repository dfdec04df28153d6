//! Sync orchestration: parse → locate → match → reconcile → apply-or-report.
//!
//! Roster parsing and discovery run once, up front, and abort the run on
//! failure. Per-profile work never aborts the run; each profile produces a
//! [`ProfileOutcome`] that is folded into the [`RunReport`] in discovery
//! order, whether profiles were processed sequentially or on a worker pool.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::Utc;

use roster_core::{config::DEFAULT_PROFILE_PATTERN, FieldChange, FieldName, MatchTier, Roster};

use crate::error::{FatalError, Phase, SyncError};
use crate::locator::{self, Discovery, ProfileLocation};
use crate::matcher;
use crate::reconcile::{self, ProfileDocument};
use crate::report::{
    ChangeRecord, FieldWarning, ItemError, RunReport, TraceEvent, NO_MATCH_REASON, NO_NAME_REASON,
};
use crate::store::FileStore;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Inputs for one sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub roster_path: PathBuf,
    pub profiles_root: PathBuf,
    pub profile_pattern: String,
    /// Compute and report changes without writing anything.
    pub dry_run: bool,
    /// Worker threads for per-profile processing; `1` is sequential.
    pub jobs: usize,
}

impl SyncOptions {
    pub fn new(roster_path: impl Into<PathBuf>, profiles_root: impl Into<PathBuf>) -> Self {
        Self {
            roster_path: roster_path.into(),
            profiles_root: profiles_root.into(),
            profile_pattern: DEFAULT_PROFILE_PATTERN.to_string(),
            dry_run: false,
            jobs: 1,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.profile_pattern = pattern.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Per-profile outcome
// ---------------------------------------------------------------------------

/// How a single profile ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeKind {
    Skipped { reason: String },
    InSync,
    /// Written, or would have been written in dry-run mode.
    Updated { changes: Vec<FieldChange> },
    Failed { message: String },
}

/// Result of processing one profile, independent of every other profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileOutcome {
    pub location: ProfileLocation,
    /// Matched employee name and the tier that matched it.
    pub matched: Option<(String, MatchTier)>,
    /// Fields the roster has but the profile has no line for.
    pub missing: Vec<FieldName>,
    pub kind: OutcomeKind,
}

impl ProfileOutcome {
    fn new(location: &ProfileLocation, kind: OutcomeKind) -> Self {
        Self {
            location: location.clone(),
            matched: None,
            missing: Vec::new(),
            kind,
        }
    }
}

/// New text for a profile that is out of sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPatch {
    pub original: String,
    pub patched: String,
}

/// Match, read, and reconcile one profile without writing anything.
///
/// An [`OutcomeKind::Updated`] outcome comes with the patch that would be
/// written; every other outcome comes with `None`.
pub fn prepare_profile(
    store: &dyn FileStore,
    roster: &Roster,
    location: &ProfileLocation,
) -> (ProfileOutcome, Option<PendingPatch>) {
    let Some(name) = location.employee_name.as_deref() else {
        let kind = OutcomeKind::Skipped {
            reason: NO_NAME_REASON.to_string(),
        };
        return (ProfileOutcome::new(location, kind), None);
    };

    let result = matcher::match_name(name, roster.records());
    let Some(record) = result.record else {
        let reason = match result.ambiguity {
            Some(ambiguity) => ambiguity.note(),
            None => NO_MATCH_REASON.to_string(),
        };
        return (
            ProfileOutcome::new(location, OutcomeKind::Skipped { reason }),
            None,
        );
    };

    let mut outcome = ProfileOutcome::new(location, OutcomeKind::InSync);
    outcome.matched = Some((record.name.clone(), result.tier));

    let text = match store.read(&location.path) {
        Ok(text) => text,
        Err(e) => {
            outcome.kind = OutcomeKind::Failed {
                message: format!("read failed: {e}"),
            };
            return (outcome, None);
        }
    };

    let document = ProfileDocument::parse(&location.path, text);
    let reconciliation = reconcile::reconcile(&document.fields, record);
    outcome.missing = reconciliation.missing;
    if reconciliation.changes.is_empty() {
        return (outcome, None);
    }

    let patch = PendingPatch {
        patched: document.patched(&reconciliation.changes),
        original: document.raw_text,
    };
    outcome.kind = OutcomeKind::Updated {
        changes: reconciliation.changes,
    };
    (outcome, Some(patch))
}

/// Match, read, reconcile, and (unless dry-run) write one profile.
pub fn process_profile(
    store: &dyn FileStore,
    roster: &Roster,
    location: &ProfileLocation,
    dry_run: bool,
) -> ProfileOutcome {
    let (mut outcome, patch) = prepare_profile(store, roster, location);
    if dry_run {
        return outcome;
    }
    if let Some(patch) = patch {
        if let Err(e) = store.write(&location.path, &patch.patched) {
            outcome.kind = OutcomeKind::Failed {
                message: format!("write failed: {e}"),
            };
        }
    }
    outcome
}

// ---------------------------------------------------------------------------
// Upfront phases
// ---------------------------------------------------------------------------

/// Roster and profile list, ready for per-profile processing.
#[derive(Debug)]
pub struct Plan {
    pub report: RunReport,
    pub roster: Roster,
    pub profiles: Vec<ProfileLocation>,
}

fn fatal(phase: Phase, source: SyncError, mut report: RunReport) -> FatalError {
    tracing::error!(phase = %phase, error = %source, "sync aborted");
    report.finish();
    FatalError {
        phase,
        source,
        report: Box::new(report),
    }
}

/// Connect, parse the roster, and discover profiles.
pub fn plan(store: &dyn FileStore, options: &SyncOptions) -> Result<Plan, FatalError> {
    let mut report = RunReport::new(options.dry_run);
    report.record(TraceEvent::Connected {
        store: store.describe(),
        dry_run: options.dry_run,
    });

    let roster_path = &options.roster_path;
    let text = match store.read(roster_path) {
        Ok(text) => text,
        Err(source) => {
            let err = SyncError::RosterRead {
                path: roster_path.clone(),
                source,
            };
            return Err(fatal(Phase::Roster, err, report));
        }
    };
    let roster = match Roster::parse(&text) {
        Ok(roster) => roster,
        Err(source) => {
            let err = SyncError::RosterParse {
                path: roster_path.clone(),
                source,
            };
            return Err(fatal(Phase::Roster, err, report));
        }
    };
    report.record(TraceEvent::RosterParsed {
        path: roster_path.clone(),
        records: roster.len(),
    });
    for name in roster.duplicates() {
        report.record(TraceEvent::DuplicateName { name: name.clone() });
    }

    let Discovery { profiles, failures } =
        match locator::locate(store, &options.profiles_root, &options.profile_pattern) {
            Ok(discovery) => discovery,
            Err(err) => return Err(fatal(Phase::Discovery, err, report)),
        };
    report.stats.profiles_found = profiles.len();
    report.record(TraceEvent::ProfilesDiscovered {
        root: options.profiles_root.clone(),
        count: profiles.len(),
    });
    for (path, err) in failures {
        let message = err.to_string();
        report.stats.errors.push(ItemError {
            path: path.clone(),
            message: message.clone(),
        });
        report.record(TraceEvent::ListingFailed { path, message });
    }

    Ok(Plan {
        report,
        roster,
        profiles,
    })
}

// ---------------------------------------------------------------------------
// Worker pool
// ---------------------------------------------------------------------------

fn process_all(
    store: &dyn FileStore,
    roster: &Roster,
    profiles: &[ProfileLocation],
    options: &SyncOptions,
) -> Vec<ProfileOutcome> {
    let jobs = options.jobs.clamp(1, profiles.len().max(1));
    if jobs == 1 {
        return profiles
            .iter()
            .map(|location| process_profile(store, roster, location, options.dry_run))
            .collect();
    }

    let next = AtomicUsize::new(0);
    let slots: Vec<Mutex<Option<ProfileOutcome>>> =
        profiles.iter().map(|_| Mutex::new(None)).collect();

    std::thread::scope(|scope| {
        for _ in 0..jobs {
            scope.spawn(|| loop {
                let i = next.fetch_add(1, Ordering::Relaxed);
                let Some(location) = profiles.get(i) else {
                    break;
                };
                let outcome = process_profile(store, roster, location, options.dry_run);
                *slots[i].lock().unwrap_or_else(|e| e.into_inner()) = Some(outcome);
            });
        }
    });

    slots
        .into_iter()
        .filter_map(|slot| slot.into_inner().unwrap_or_else(|e| e.into_inner()))
        .collect()
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// Fold one profile's outcome into the run report.
pub fn absorb(report: &mut RunReport, outcome: ProfileOutcome) {
    let path = outcome.location.path;

    if let Some((employee, tier)) = &outcome.matched {
        report.stats.profiles_matched += 1;
        report.record(TraceEvent::Matched {
            path: path.clone(),
            employee: employee.clone(),
            tier: *tier,
        });
    }
    for field in outcome.missing {
        report.stats.warnings.push(FieldWarning {
            path: path.clone(),
            field,
            message: format!("no `{}` line in profile; field not synced", field.label()),
        });
        report.record(TraceEvent::FieldMissing {
            path: path.clone(),
            field,
        });
    }

    match outcome.kind {
        OutcomeKind::Skipped { reason } => report.skip(path, reason),
        OutcomeKind::Failed { message } => report.fail(path, message),
        OutcomeKind::InSync => {
            report.stats.profiles_in_sync += 1;
            report.record(TraceEvent::InSync { path });
        }
        OutcomeKind::Updated { changes } => {
            let employee = outcome.matched.map(|(name, _)| name).unwrap_or_default();
            let timestamp = Utc::now();
            report.stats.profiles_updated += 1;
            report.stats.fields_changed += changes.len();
            report
                .changes
                .extend(changes.iter().map(|change| ChangeRecord {
                    path: path.clone(),
                    employee: employee.clone(),
                    field: change.field,
                    old_value: change.old_value.clone(),
                    new_value: change.new_value.clone(),
                    timestamp,
                }));
            let dry_run = report.dry_run;
            report.record(TraceEvent::Updated {
                path,
                changes,
                dry_run,
            });
        }
    }
}

/// Run one full sync.
///
/// Fatal errors (unreadable/unparsable roster, unreachable profiles root)
/// return [`FatalError`] carrying the partial report. Everything else is
/// recorded in the returned report's statistics.
pub fn run(store: &dyn FileStore, options: &SyncOptions) -> Result<RunReport, FatalError> {
    let Plan {
        mut report,
        roster,
        profiles,
    } = plan(store, options)?;

    for outcome in process_all(store, &roster, &profiles, options) {
        absorb(&mut report, outcome);
    }

    report.finish();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RunOutcome;
    use crate::store::MemoryStore;

    const ROSTER: &str = "\
| Employee ID | Name | Status | Rate | Profession |
|---|---|---|---|---|
| 102 | Smith John | Work | $25/hr | Designer |
";

    fn store_with_roster() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert("/Finance/Employees.md", ROSTER);
        store.insert_dir("/Nov25");
        store
    }

    fn options() -> SyncOptions {
        SyncOptions::new("/Finance/Employees.md", "/Nov25")
    }

    #[test]
    fn empty_root_is_nothing_found() {
        let store = store_with_roster();
        let report = run(&store, &options()).expect("run");
        assert_eq!(report.outcome(), RunOutcome::NothingFound);
        assert!(store.writes().is_empty());
    }

    #[test]
    fn missing_roster_is_fatal_roster_phase() {
        let store = MemoryStore::new();
        store.insert_dir("/Nov25");
        let err = run(&store, &options()).unwrap_err();
        assert_eq!(err.phase, Phase::Roster);
        assert!(matches!(err.source, SyncError::RosterRead { .. }));
        assert!(matches!(
            err.report.trace.first(),
            Some(TraceEvent::Connected { .. })
        ));
    }

    #[test]
    fn missing_root_is_fatal_discovery_phase() {
        let store = MemoryStore::new();
        store.insert("/Finance/Employees.md", ROSTER);
        let err = run(&store, &options()).unwrap_err();
        assert_eq!(err.phase, Phase::Discovery);
        assert!(err.to_string().starts_with("profile discovery failed"));
        assert!(err
            .report
            .trace
            .iter()
            .any(|e| matches!(e, TraceEvent::RosterParsed { records: 1, .. })));
    }

    #[test]
    fn profile_without_name_dir_is_skipped() {
        let store = store_with_roster();
        store.insert("/Nov25/Profile.md", "**ID:** 1\n");
        let report = run(&store, &options()).expect("run");
        assert_eq!(report.stats.profiles_skipped[0].reason, NO_NAME_REASON);
        assert!(report.stats.errors.is_empty());
    }

    #[test]
    fn read_failure_is_per_item() {
        let store = store_with_roster();
        store.insert("/Nov25/D/Smith John/Profile.md", "**ID:** 1\n");
        store.deny_read("/Nov25/D/Smith John/Profile.md");
        let report = run(&store, &options()).expect("run");
        assert_eq!(report.stats.errors.len(), 1);
        assert!(report.stats.errors[0].message.starts_with("read failed"));
        assert_eq!(report.stats.profiles_updated, 0);
    }

    #[test]
    fn write_failure_is_per_item_and_not_counted() {
        let store = store_with_roster();
        store.insert("/Nov25/D/Smith John/Profile.md", "**ID:** 1\n");
        store.deny_write("/Nov25/D/Smith John/Profile.md");
        let report = run(&store, &options()).expect("run");
        assert_eq!(report.stats.errors.len(), 1);
        assert!(report.stats.errors[0].message.starts_with("write failed"));
        assert_eq!(report.stats.profiles_updated, 0);
        assert_eq!(report.stats.fields_changed, 0);
        assert_eq!(
            store.get("/Nov25/D/Smith John/Profile.md").as_deref(),
            Some("**ID:** 1\n")
        );
    }

    #[test]
    fn missing_field_lines_become_warnings() {
        let store = store_with_roster();
        store.insert("/Nov25/D/Smith John/Profile.md", "**ID:** 102\n");
        let report = run(&store, &options()).expect("run");
        let fields: Vec<_> = report.stats.warnings.iter().map(|w| w.field).collect();
        assert_eq!(
            fields,
            vec![FieldName::Rate, FieldName::Status, FieldName::Profession]
        );
        assert_eq!(report.stats.profiles_in_sync, 1);
        assert!(report.stats.errors.is_empty());
        assert_eq!(report.outcome(), RunOutcome::InSync);
    }

    #[test]
    fn listing_failure_is_item_error_and_run_continues() {
        let store = store_with_roster();
        store.insert("/Nov25/D/Smith John/Profile.md", "**ID:** 1\n");
        store.insert("/Nov25/Locked/Ann Lee/Profile.md", "**ID:** 2\n");
        store.deny_list("/Nov25/Locked");

        let report = run(&store, &options()).expect("run");

        assert_eq!(report.stats.profiles_found, 1);
        assert_eq!(report.stats.profiles_updated, 1);
        assert_eq!(report.stats.errors.len(), 1);
        assert_eq!(report.stats.errors[0].path, PathBuf::from("/Nov25/Locked"));
        assert!(report.stats.errors[0].message.contains("access denied"));
        assert!(report.trace.iter().any(|e| matches!(
            e,
            TraceEvent::ListingFailed { path, .. } if path == &PathBuf::from("/Nov25/Locked")
        )));
        assert_eq!(store.writes(), vec![PathBuf::from("/Nov25/D/Smith John/Profile.md")]);
    }

    #[test]
    fn truncated_roster_row_never_reaches_a_profile() {
        let store = MemoryStore::new();
        store.insert(
            "/Finance/Employees.md",
            "| Employee ID | Name | Status | Rate | Profession |\n|---|---|---|---|---|\n| 6 | Bo Chan |\n",
        );
        store.insert("/Nov25/D/Bo Chan/Profile.md", "**ID:** 5\n");

        let report = run(&store, &options()).expect("run");

        assert_eq!(report.stats.profiles_updated, 0);
        assert_eq!(report.stats.profiles_skipped[0].reason, NO_MATCH_REASON);
        assert_eq!(
            store.get("/Nov25/D/Bo Chan/Profile.md").as_deref(),
            Some("**ID:** 5\n")
        );
    }

    #[test]
    fn dry_run_prepares_patch_without_writing() {
        let store = store_with_roster();
        store.insert("/Nov25/D/Smith John/Profile.md", "**ID:** 1\n");
        let planned = plan(&store, &options()).expect("plan");

        let (outcome, patch) = prepare_profile(&store, &planned.roster, &planned.profiles[0]);
        assert!(matches!(outcome.kind, OutcomeKind::Updated { .. }));
        let patch = patch.expect("patch");
        assert_eq!(patch.original, "**ID:** 1\n");
        assert_eq!(patch.patched, "**ID:** 102\n");

        let dry = process_profile(&store, &planned.roster, &planned.profiles[0], true);
        assert_eq!(dry.kind, outcome.kind);
        assert!(store.writes().is_empty());
    }

    #[test]
    fn jobs_builder_never_drops_to_zero() {
        assert_eq!(options().jobs(0).jobs, 1);
    }
}
