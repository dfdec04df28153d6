//! Error types for roster-sync.

use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;

use thiserror::Error;

use roster_core::ParseError;

use crate::report::RunReport;

/// Failures reported by a [`FileStore`](crate::store::FileStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {path}")]
    NotFound { path: PathBuf },

    #[error("access denied: {path}")]
    AccessDenied { path: PathBuf },

    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("content at {path} is not valid UTF-8")]
    InvalidUtf8 { path: PathBuf },

    /// Any other I/O failure, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Classify an I/O error against the store's error taxonomy.
pub(crate) fn store_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    let path = path.into();
    match source.kind() {
        ErrorKind::NotFound => StoreError::NotFound { path },
        ErrorKind::PermissionDenied => StoreError::AccessDenied { path },
        ErrorKind::InvalidData => StoreError::InvalidUtf8 { path },
        _ => StoreError::Io { path, source },
    }
}

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("cannot read roster {path}: {source}")]
    RosterRead {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error("cannot parse roster {path}: {source}")]
    RosterParse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("profiles root {path} is unreachable: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    #[error("invalid profile pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// An I/O error on the run state file, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Run state JSON serialization/deserialization error.
    #[error("run state JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Upfront phase that aborted a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Roster,
    Discovery,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Roster => write!(f, "roster parse"),
            Phase::Discovery => write!(f, "profile discovery"),
        }
    }
}

/// A fatal run failure, carrying whatever the run had recorded so far.
#[derive(Debug, Error)]
#[error("{phase} failed: {source}")]
pub struct FatalError {
    pub phase: Phase,
    #[source]
    pub source: SyncError,
    pub report: Box<RunReport>,
}
