//! Error types for roster-core.

use std::path::PathBuf;

use thiserror::Error;

/// The roster document as a whole could not be turned into records.
///
/// Individual malformed rows never produce this error; they are skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The document contains nothing but whitespace.
    #[error("roster document is empty")]
    Empty,

    /// No table row with a name column was found.
    #[error("roster document has no header row with a name column")]
    NoHeader,
}

/// All errors that can arise from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure while reading the config file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error, with the file path for context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`; `~/.roster-sync/` cannot be located.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}
