//! Run statistics, execution trace, and change log.
//!
//! The orchestrator owns a single [`RunReport`] per run and folds every
//! per-profile outcome into it. Each [`TraceEvent`] is also logged through
//! `tracing` as it is recorded.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use roster_core::{FieldChange, FieldName, MatchTier};

/// Skip reason for profiles whose name is absent from the roster.
pub const NO_MATCH_REASON: &str = "no matching roster record";

/// Skip reason for profiles whose path yields no employee name.
pub const NO_NAME_REASON: &str = "cannot determine employee name from path";

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedProfile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldWarning {
    pub path: PathBuf,
    pub field: FieldName,
    pub message: String,
}

/// Aggregate counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub profiles_found: usize,
    /// Profiles written, or that would have been written in dry-run mode.
    pub profiles_updated: usize,
    pub profiles_skipped: Vec<SkippedProfile>,
    pub fields_changed: usize,
    pub errors: Vec<ItemError>,
    #[serde(default)]
    pub profiles_matched: usize,
    /// Matched with zero changes.
    #[serde(default)]
    pub profiles_in_sync: usize,
    #[serde(default)]
    pub warnings: Vec<FieldWarning>,
}

impl RunStatistics {
    pub fn outcome(&self) -> RunOutcome {
        if self.profiles_found == 0 {
            RunOutcome::NothingFound
        } else if self.profiles_matched == 0 {
            RunOutcome::NoneMatched
        } else if self.profiles_updated == 0 {
            RunOutcome::InSync
        } else {
            RunOutcome::Updated
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Operational state a run ended in. These are never collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// No profile documents were found.
    NothingFound,
    /// Profiles were found but none matched a roster record.
    NoneMatched,
    /// Matched profiles were already in sync.
    InSync,
    /// At least one profile was (or would be) updated.
    Updated,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::NothingFound => write!(f, "nothing to do: no profiles found"),
            RunOutcome::NoneMatched => write!(f, "profiles found but none matched the roster"),
            RunOutcome::InSync => write!(f, "all matched profiles already in sync"),
            RunOutcome::Updated => write!(f, "profiles updated"),
        }
    }
}

// ---------------------------------------------------------------------------
// Trace
// ---------------------------------------------------------------------------

/// One significant event in a run, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    Connected {
        store: String,
        dry_run: bool,
    },
    RosterParsed {
        path: PathBuf,
        records: usize,
    },
    DuplicateName {
        name: String,
    },
    ProfilesDiscovered {
        root: PathBuf,
        count: usize,
    },
    ListingFailed {
        path: PathBuf,
        message: String,
    },
    Matched {
        path: PathBuf,
        employee: String,
        tier: MatchTier,
    },
    Skipped {
        path: PathBuf,
        reason: String,
    },
    FieldMissing {
        path: PathBuf,
        field: FieldName,
    },
    InSync {
        path: PathBuf,
    },
    Updated {
        path: PathBuf,
        changes: Vec<FieldChange>,
        dry_run: bool,
    },
    Failed {
        path: PathBuf,
        message: String,
    },
    Finished {
        outcome: RunOutcome,
        profiles_found: usize,
        profiles_updated: usize,
        fields_changed: usize,
        errors: usize,
    },
}

impl TraceEvent {
    fn log(&self) {
        match self {
            TraceEvent::Connected { store, dry_run } => {
                info!(store = %store, dry_run, "connected to file store")
            }
            TraceEvent::RosterParsed { path, records } => {
                info!(path = %path.display(), records, "parsed roster")
            }
            TraceEvent::DuplicateName { name } => {
                warn!(name = %name, "duplicate roster name; first occurrence wins")
            }
            TraceEvent::ProfilesDiscovered { root, count } => {
                info!(root = %root.display(), count, "found profile files")
            }
            TraceEvent::ListingFailed { path, message } => {
                error!(path = %path.display(), error = %message, "cannot list directory")
            }
            TraceEvent::Matched {
                path,
                employee,
                tier,
            } => debug!(path = %path.display(), employee = %employee, tier = %tier, "matched"),
            TraceEvent::Skipped { path, reason } => {
                warn!(path = %path.display(), reason = %reason, "skipped")
            }
            TraceEvent::FieldMissing { path, field } => {
                warn!(path = %path.display(), field = %field, "field line missing; not synced")
            }
            TraceEvent::InSync { path } => debug!(path = %path.display(), "already in sync"),
            TraceEvent::Updated {
                path,
                changes,
                dry_run: true,
            } => info!(path = %path.display(), fields = changes.len(), "[dry-run] would update"),
            TraceEvent::Updated { path, changes, .. } => {
                info!(path = %path.display(), fields = changes.len(), "updated")
            }
            TraceEvent::Failed { path, message } => {
                error!(path = %path.display(), error = %message, "profile sync failed")
            }
            TraceEvent::Finished {
                outcome,
                profiles_found,
                profiles_updated,
                fields_changed,
                errors,
            } => info!(
                outcome = %outcome,
                profiles_found,
                profiles_updated,
                fields_changed,
                errors,
                "sync finished"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Change log
// ---------------------------------------------------------------------------

/// One applied (or would-be) field change, flattened for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub path: PathBuf,
    pub employee: String,
    pub field: FieldName,
    pub old_value: Option<String>,
    pub new_value: String,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

/// Everything a run produced. Returned on success and inside fatal errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stats: RunStatistics,
    pub trace: Vec<TraceEvent>,
    pub changes: Vec<ChangeRecord>,
}

impl RunReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            started_at: Utc::now(),
            finished_at: None,
            stats: RunStatistics::default(),
            trace: Vec::new(),
            changes: Vec::new(),
        }
    }

    /// Log and append a trace event.
    pub fn record(&mut self, event: TraceEvent) {
        event.log();
        self.trace.push(event);
    }

    pub fn skip(&mut self, path: PathBuf, reason: impl Into<String>) {
        let reason = reason.into();
        self.stats.profiles_skipped.push(SkippedProfile {
            path: path.clone(),
            reason: reason.clone(),
        });
        self.record(TraceEvent::Skipped { path, reason });
    }

    pub fn fail(&mut self, path: PathBuf, message: impl Into<String>) {
        let message = message.into();
        self.stats.errors.push(ItemError {
            path: path.clone(),
            message: message.clone(),
        });
        self.record(TraceEvent::Failed { path, message });
    }

    pub fn outcome(&self) -> RunOutcome {
        self.stats.outcome()
    }

    /// Stamp the finish time and record the summary event.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
        let event = TraceEvent::Finished {
            outcome: self.outcome(),
            profiles_found: self.stats.profiles_found,
            profiles_updated: self.stats.profiles_updated,
            fields_changed: self.stats.fields_changed,
            errors: self.stats.errors.len(),
        };
        self.record(event);
    }
}
