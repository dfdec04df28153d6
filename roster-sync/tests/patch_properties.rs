//! Property tests for in-place profile patching.

use proptest::prelude::*;
use roster_core::{EmployeeRecord, FieldName};
use roster_sync::reconcile::{self, ProfileDocument};

const MARKERS: [(&str, FieldName); 4] = [
    ("**ID:**", FieldName::Id),
    ("- **Rate:**", FieldName::Rate),
    ("- **Status:**", FieldName::Status),
    ("- **Profession:**", FieldName::Profession),
];

fn filler() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,.#:()]{0,40}"
}

fn value() -> impl Strategy<Value = String> {
    "[A-Za-z0-9$/€]{1,12}"
}

/// Filler line, field line, filler line, ... ending with a filler line.
fn document(fillers: &[String], values: &[String], newline: &str) -> String {
    let mut text = String::new();
    for (i, (marker, _)) in MARKERS.iter().enumerate() {
        text.push_str(&fillers[i]);
        text.push_str(newline);
        text.push_str(&format!("{marker} {}", values[i]));
        text.push_str(newline);
    }
    text.push_str(&fillers[MARKERS.len()]);
    text.push_str(newline);
    text
}

fn record(values: &[String]) -> EmployeeRecord {
    MARKERS
        .iter()
        .zip(values)
        .fold(EmployeeRecord::new("Smith John"), |record, ((_, field), v)| {
            record.with(*field, v.clone())
        })
}

proptest! {
    #[test]
    fn patching_touches_only_field_values(
        fillers in prop::collection::vec(filler(), 5),
        old in prop::collection::vec(value(), 4),
        new in prop::collection::vec(value(), 4),
        crlf in any::<bool>(),
    ) {
        let newline = if crlf { "\r\n" } else { "\n" };
        let original = document(&fillers, &old, newline);
        let doc = ProfileDocument::parse("Profile.md", original.clone());
        let roster = record(&new);

        let result = reconcile::reconcile(&doc.fields, &roster);
        let patched = doc.patched(&result.changes);

        prop_assert_eq!(patched, document(&fillers, &new, newline));
    }

    #[test]
    fn patched_document_reconciles_to_noop(
        fillers in prop::collection::vec(filler(), 5),
        old in prop::collection::vec(value(), 4),
        new in prop::collection::vec(value(), 4),
    ) {
        let original = document(&fillers, &old, "\n");
        let roster = record(&new);
        let first = ProfileDocument::parse("Profile.md", original);
        let patched = first.patched(&reconcile::reconcile(&first.fields, &roster).changes);

        let second = ProfileDocument::parse("Profile.md", patched);
        prop_assert!(reconcile::reconcile(&second.fields, &roster).is_noop());
    }
}
