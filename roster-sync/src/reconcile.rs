//! Field extraction, diffing, and in-place line patching.
//!
//! Profile documents carry the synced fields as labelled markdown lines:
//!
//! ```text
//! **ID:** 101
//! - **Rate:** $25/hr
//! - **Status:** Available
//! - **Profession:** Designer
//! ```
//!
//! Only the value portion of the first line carrying each label is ever
//! rewritten. Everything else, including the label, leading indentation, and
//! the line terminator, is kept byte-for-byte.
//!
//! A label that appears on more than one line is not rewritten everywhere:
//! later lines (an older profile pasted below, a changelog entry) keep their
//! old values, and only the first line is read and patched.

use std::ops::Range;
use std::path::PathBuf;

use roster_core::{EmployeeRecord, FieldChange, FieldName, FieldValues};

/// Marker that introduces a field's value on its line.
fn marker(field: FieldName) -> &'static str {
    match field {
        FieldName::Id => "**ID:**",
        FieldName::Rate => "- **Rate:**",
        FieldName::Status => "- **Status:**",
        FieldName::Profession => "- **Profession:**",
    }
}

/// Location of a field's value within the document text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldLine {
    /// Bytes after the marker up to (not including) the line terminator.
    value: Range<usize>,
}

fn find_field_line(text: &str, field: FieldName) -> Option<FieldLine> {
    let marker = marker(field);
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let content = line.strip_suffix('\n').unwrap_or(line);
        let content = content.strip_suffix('\r').unwrap_or(content);
        if let Some(pos) = content.find(marker) {
            let start = offset + pos + marker.len();
            let end = offset + content.len();
            return Some(FieldLine { value: start..end });
        }
        offset += line.len();
    }
    None
}

/// Current values of the four synced fields, `None` where the label is missing.
pub fn extract_fields(text: &str) -> FieldValues {
    let mut values = FieldValues::default();
    for field in FieldName::ALL {
        let value =
            find_field_line(text, field).map(|line| text[line.value].trim().to_string());
        values.set(field, value);
    }
    values
}

// ---------------------------------------------------------------------------
// ProfileDocument
// ---------------------------------------------------------------------------

/// A profile as read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDocument {
    pub path: PathBuf,
    pub raw_text: String,
    pub fields: FieldValues,
}

impl ProfileDocument {
    pub fn parse(path: impl Into<PathBuf>, raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        let fields = extract_fields(&raw_text);
        Self {
            path: path.into(),
            raw_text,
            fields,
        }
    }

    /// Document text with `changes` applied.
    pub fn patched(&self, changes: &[FieldChange]) -> String {
        apply(&self.raw_text, changes)
    }
}

// ---------------------------------------------------------------------------
// reconcile / apply
// ---------------------------------------------------------------------------

/// Changes to make plus the fields that could not be synced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// In canonical field order.
    pub changes: Vec<FieldChange>,
    /// Roster has a value but the profile has no line for it.
    pub missing: Vec<FieldName>,
}

impl Reconciliation {
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Compare a profile's current values against its roster record.
///
/// Fields absent from the roster are never touched. Fields whose label line
/// is missing from the profile are reported in `missing` instead of inserted.
pub fn reconcile(current: &FieldValues, record: &EmployeeRecord) -> Reconciliation {
    let mut result = Reconciliation::default();
    for field in FieldName::ALL {
        let Some(wanted) = record.value(field).map(str::trim) else {
            continue;
        };
        if wanted.is_empty() {
            continue;
        }
        match current.get(field).map(str::trim) {
            None => result.missing.push(field),
            Some(have) if have == wanted => {}
            Some(have) => result.changes.push(FieldChange {
                field,
                old_value: (!have.is_empty()).then(|| have.to_string()),
                new_value: wanted.to_string(),
            }),
        }
    }
    result
}

/// Rewrite the value portion of each changed field's line.
///
/// Whitespace between the label and the old value is kept; a label with no
/// separating whitespace gets a single space. Changes for labels that are not
/// present are ignored.
pub fn apply(text: &str, changes: &[FieldChange]) -> String {
    let mut out = text.to_string();
    for change in changes {
        let Some(line) = find_field_line(&out, change.field) else {
            continue;
        };
        let old = &out[line.value.clone()];
        let gap_len = old.len() - old.trim_start().len();
        let gap = if gap_len == 0 { " " } else { &old[..gap_len] };
        let replacement = format!("{gap}{}", change.new_value);
        out.replace_range(line.value, &replacement);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PROFILE: &str = "\
# Smith John

**ID:** 101
**Department:** Design

## Work
- **Rate:** $25/hr
- **Status:** Available
- **Profession:** Designer

Notes: rate review pending.
";

    fn smith_john() -> EmployeeRecord {
        EmployeeRecord::new("Smith John")
            .with(FieldName::Id, "102")
            .with(FieldName::Rate, "$25/hr")
            .with(FieldName::Status, "Work")
            .with(FieldName::Profession, "Designer")
    }

    #[test]
    fn extracts_all_four_fields() {
        let fields = extract_fields(PROFILE);
        assert_eq!(fields.id.as_deref(), Some("101"));
        assert_eq!(fields.rate.as_deref(), Some("$25/hr"));
        assert_eq!(fields.status.as_deref(), Some("Available"));
        assert_eq!(fields.profession.as_deref(), Some("Designer"));
    }

    #[test]
    fn reconcile_reports_only_differences_in_order() {
        let doc = ProfileDocument::parse("p.md", PROFILE);
        let result = reconcile(&doc.fields, &smith_john());
        assert_eq!(
            result.changes,
            vec![
                FieldChange {
                    field: FieldName::Id,
                    old_value: Some("101".into()),
                    new_value: "102".into(),
                },
                FieldChange {
                    field: FieldName::Status,
                    old_value: Some("Available".into()),
                    new_value: "Work".into(),
                },
            ]
        );
        assert!(result.missing.is_empty());
    }

    #[test]
    fn apply_touches_only_value_portions() {
        let doc = ProfileDocument::parse("p.md", PROFILE);
        let result = reconcile(&doc.fields, &smith_john());
        let patched = doc.patched(&result.changes);
        assert_eq!(patched, PROFILE.replace("**ID:** 101", "**ID:** 102").replace(
            "- **Status:** Available",
            "- **Status:** Work"
        ));
    }

    #[test]
    fn second_pass_is_noop() {
        let doc = ProfileDocument::parse("p.md", PROFILE);
        let first = reconcile(&doc.fields, &smith_john());
        let patched = ProfileDocument::parse("p.md", doc.patched(&first.changes));
        assert!(reconcile(&patched.fields, &smith_john()).is_noop());
    }

    #[test]
    fn roster_blank_fields_are_left_alone() {
        let record = EmployeeRecord::new("Smith John").with(FieldName::Rate, "$30/hr");
        let result = reconcile(&extract_fields(PROFILE), &record);
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].field, FieldName::Rate);
    }

    #[test]
    fn missing_label_is_reported_not_inserted() {
        let text = "**ID:** 101\n- **Rate:** $1\n";
        let result = reconcile(&extract_fields(text), &smith_john());
        assert_eq!(result.missing, vec![FieldName::Status, FieldName::Profession]);
        let patched = apply(text, &result.changes);
        assert_eq!(patched, "**ID:** 102\n- **Rate:** $25/hr\n");
    }

    #[test]
    fn empty_value_line_is_a_change() {
        let text = "- **Status:**\n";
        let record = EmployeeRecord::new("x").with(FieldName::Status, "Work");
        let result = reconcile(&extract_fields(text), &record);
        assert_eq!(result.changes[0].old_value, None);
        assert_eq!(apply(text, &result.changes), "- **Status:** Work\n");
    }

    #[test]
    fn crlf_and_indentation_survive() {
        let text = "  - **Rate:**\t$1  \r\n  - **Status:** Off\r\n";
        let changes = vec![FieldChange {
            field: FieldName::Rate,
            old_value: Some("$1".into()),
            new_value: "$2".into(),
        }];
        assert_eq!(
            apply(text, &changes),
            "  - **Rate:**\t$2\r\n  - **Status:** Off\r\n"
        );
    }

    #[test]
    fn only_first_occurrence_is_patched() {
        let text = "- **Rate:** $1\n- **Rate:** $1\n";
        let changes = vec![FieldChange {
            field: FieldName::Rate,
            old_value: Some("$1".into()),
            new_value: "$9".into(),
        }];
        assert_eq!(apply(text, &changes), "- **Rate:** $9\n- **Rate:** $1\n");
    }

    #[test]
    fn last_line_without_newline() {
        let text = "intro\n**ID:** 7";
        let changes = vec![FieldChange {
            field: FieldName::Id,
            old_value: Some("7".into()),
            new_value: "8".into(),
        }];
        assert_eq!(apply(text, &changes), "intro\n**ID:** 8");
    }
}
