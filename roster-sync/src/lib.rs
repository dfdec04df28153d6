//! # roster-sync
//!
//! Matching-and-reconciliation engine that keeps per-employee profile
//! documents in line with a roster.
//!
//! Call [`pipeline::run`] with a [`FileStore`] and [`SyncOptions`] to perform
//! one sync, or [`diff_profiles`] to preview the patches without writing.

pub mod diff;
pub mod error;
pub mod locator;
pub mod matcher;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod state;
pub mod store;

pub use diff::{diff_profiles, DiffReport, ProfileDiff};
pub use error::{FatalError, Phase, StoreError, SyncError};
pub use pipeline::{run, SyncOptions};
pub use report::{RunOutcome, RunReport, RunStatistics, TraceEvent};
pub use store::{FileStore, LocalStore, MemoryStore};
