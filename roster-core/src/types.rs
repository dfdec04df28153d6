//! Domain types shared by the parser, matcher, and reconciler.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Synced fields
// ---------------------------------------------------------------------------

/// One of the four profile fields kept in sync with the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldName {
    Id,
    Rate,
    Status,
    Profession,
}

impl FieldName {
    /// Canonical order in which fields are compared and reported.
    pub const ALL: [FieldName; 4] = [
        FieldName::Id,
        FieldName::Rate,
        FieldName::Status,
        FieldName::Profession,
    ];

    /// Label text used in profile documents (`**ID:**`, `- **Rate:**`, ...).
    pub fn label(self) -> &'static str {
        match self {
            FieldName::Id => "ID",
            FieldName::Rate => "Rate",
            FieldName::Status => "Status",
            FieldName::Profession => "Profession",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldName::Id => write!(f, "id"),
            FieldName::Rate => write!(f, "rate"),
            FieldName::Status => write!(f, "status"),
            FieldName::Profession => write!(f, "profession"),
        }
    }
}

/// The four synced values, each optional.
///
/// On an [`EmployeeRecord`], `None` means the roster cell was empty and the
/// profile field must be left alone. On a profile, `None` means the field's
/// label line does not exist in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profession: Option<String>,
}

impl FieldValues {
    pub fn get(&self, field: FieldName) -> Option<&str> {
        match field {
            FieldName::Id => self.id.as_deref(),
            FieldName::Rate => self.rate.as_deref(),
            FieldName::Status => self.status.as_deref(),
            FieldName::Profession => self.profession.as_deref(),
        }
    }

    pub fn set(&mut self, field: FieldName, value: Option<String>) {
        let slot = match field {
            FieldName::Id => &mut self.id,
            FieldName::Rate => &mut self.rate,
            FieldName::Status => &mut self.status,
            FieldName::Profession => &mut self.profession,
        };
        *slot = value;
    }
}

// ---------------------------------------------------------------------------
// Roster records
// ---------------------------------------------------------------------------

/// One roster row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// Canonical display name; never empty.
    pub name: String,
    #[serde(flatten)]
    pub fields: FieldValues,
}

impl EmployeeRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: FieldValues::default(),
        }
    }

    /// Builder-style setter, mostly for tests and fixtures.
    pub fn with(mut self, field: FieldName, value: impl Into<String>) -> Self {
        self.fields.set(field, Some(value.into()));
        self
    }

    pub fn value(&self, field: FieldName) -> Option<&str> {
        self.fields.get(field)
    }
}

// ---------------------------------------------------------------------------
// Matching and changes
// ---------------------------------------------------------------------------

/// Which matcher tier paired a profile with a roster record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchTier {
    Exact,
    CaseInsensitive,
    NameParts,
    Unmatched,
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchTier::Exact => write!(f, "exact"),
            MatchTier::CaseInsensitive => write!(f, "case-insensitive"),
            MatchTier::NameParts => write!(f, "name-parts"),
            MatchTier::Unmatched => write!(f, "unmatched"),
        }
    }
}

/// A single field transition for one profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: FieldName,
    /// `None` when the label line exists but carries no value.
    pub old_value: Option<String>,
    pub new_value: String,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:?} -> {:?}",
            self.field,
            self.old_value.as_deref().unwrap_or(""),
            self.new_value
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_display_and_labels() {
        assert_eq!(FieldName::Id.to_string(), "id");
        assert_eq!(FieldName::Id.label(), "ID");
        assert_eq!(FieldName::Profession.label(), "Profession");
    }

    #[test]
    fn match_tier_serializes_kebab_case() {
        let yaml = serde_yaml::to_string(&MatchTier::CaseInsensitive).expect("serialize");
        assert_eq!(yaml.trim(), "case-insensitive");
        assert_eq!(MatchTier::NameParts.to_string(), "name-parts");
    }

    #[test]
    fn field_values_get_set() {
        let mut values = FieldValues::default();
        assert_eq!(values.get(FieldName::Rate), None);
        values.set(FieldName::Rate, Some("$25/hr".into()));
        assert_eq!(values.get(FieldName::Rate), Some("$25/hr"));
        assert_eq!(values.get(FieldName::Id), None);
    }

    #[test]
    fn record_builder_sets_fields() {
        let record = EmployeeRecord::new("Smith John")
            .with(FieldName::Id, "102")
            .with(FieldName::Status, "Work");
        assert_eq!(record.value(FieldName::Id), Some("102"));
        assert_eq!(record.value(FieldName::Status), Some("Work"));
        assert_eq!(record.value(FieldName::Profession), None);
    }
}
