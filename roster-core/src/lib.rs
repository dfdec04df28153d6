//! Roster core library: domain types, roster parsing, configuration, errors.
//!
//! Public API surface:
//! - [`types`]: employee records, synced field names, match tiers, field changes
//! - [`roster`]: markdown roster table parser
//! - [`config`]: YAML configuration load / defaults
//! - [`error`]: [`ParseError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod roster;
pub mod types;

pub use config::SyncConfig;
pub use error::{ConfigError, ParseError};
pub use roster::Roster;
pub use types::{EmployeeRecord, FieldChange, FieldName, FieldValues, MatchTier};
