//! Markdown roster table parser.
//!
//! The roster is a pipe table:
//!
//! ```text
//! | Employee ID | Name       | Status | Rate   | Profession |
//! |-------------|------------|--------|--------|------------|
//! | 102         | Smith John | Work   | $25/hr | Designer   |
//! ```
//!
//! Column positions are fixed by the header row. Rows without a name, or
//! with fewer cells than the header maps, are skipped; the table ends at the
//! first non-pipe line after the header.

use std::collections::HashSet;

use tracing::debug;

use crate::error::ParseError;
use crate::types::{EmployeeRecord, FieldName};

// ---------------------------------------------------------------------------
// Header recognition
// ---------------------------------------------------------------------------

/// Column index of each recognised header label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    name: usize,
    id: Option<usize>,
    rate: Option<usize>,
    status: Option<usize>,
    profession: Option<usize>,
}

impl Columns {
    fn from_header(cells: &[&str]) -> Option<Self> {
        let find = |labels: &[&str]| {
            cells.iter().position(|cell| {
                let cell = cell.to_lowercase();
                labels.iter().any(|label| cell == *label)
            })
        };

        Some(Self {
            name: find(&["name", "employee name", "employee"])?,
            id: find(&["employee id", "id", "emp id"]),
            rate: find(&["rate", "hourly rate", "pay rate"]),
            status: find(&["status", "work status"]),
            profession: find(&["profession", "role", "title", "job title"]),
        })
    }

    fn index(&self, field: FieldName) -> Option<usize> {
        match field {
            FieldName::Id => self.id,
            FieldName::Rate => self.rate,
            FieldName::Status => self.status,
            FieldName::Profession => self.profession,
        }
    }

    /// Cells a row needs to cover every mapped column.
    fn width(&self) -> usize {
        [self.id, self.rate, self.status, self.profession]
            .into_iter()
            .flatten()
            .fold(self.name, usize::max)
            + 1
    }

    /// `None` for rows that are truncated or have no name.
    fn record(&self, cells: &[&str]) -> Option<EmployeeRecord> {
        if cells.len() < self.width() {
            return None;
        }
        let name = cells[self.name];
        if name.is_empty() {
            return None;
        }
        let mut record = EmployeeRecord::new(name);
        for field in FieldName::ALL {
            let value = self
                .index(field)
                .and_then(|i| cells.get(i))
                .filter(|v| !v.is_empty())
                .map(|v| v.to_string());
            record.fields.set(field, value);
        }
        Some(record)
    }
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

/// Split a pipe-table row into trimmed cells. Returns `None` for non-table lines.
fn split_row(line: &str) -> Option<Vec<&str>> {
    let line = line.trim();
    let inner = line.strip_prefix('|')?;
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    Some(inner.split('|').map(str::trim).collect())
}

fn is_separator(cells: &[&str]) -> bool {
    cells
        .iter()
        .all(|c| !c.is_empty() && c.chars().all(|ch| matches!(ch, '-' | ':' | ' ')))
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

/// Parse the roster document into records, in document order.
///
/// Duplicate names are kept; see [`Roster`] for first-wins de-duplication.
pub fn parse(text: &str) -> Result<Vec<EmployeeRecord>, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut columns: Option<Columns> = None;
    let mut records = Vec::new();

    for line in text.lines() {
        let cells = split_row(line);
        match (columns, cells) {
            (None, Some(cells)) => {
                columns = Columns::from_header(&cells);
            }
            (None, None) => {}
            (Some(_), None) => break,
            (Some(_), Some(cells)) if is_separator(&cells) => {}
            (Some(cols), Some(cells)) => match cols.record(&cells) {
                Some(record) => records.push(record),
                None => debug!(row = %line.trim(), "skipping truncated or nameless roster row"),
            },
        }
    }

    if columns.is_none() {
        return Err(ParseError::NoHeader);
    }
    Ok(records)
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// Parsed roster with first-occurrence-wins name de-duplication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    records: Vec<EmployeeRecord>,
    duplicates: Vec<String>,
}

impl Roster {
    /// Parse `text` and drop later rows whose name was already seen.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Ok(Self::from_records(parse(text)?))
    }

    pub fn from_records(all: Vec<EmployeeRecord>) -> Self {
        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(all.len());
        let mut duplicates = Vec::new();
        for record in all {
            if seen.insert(record.name.clone()) {
                records.push(record);
            } else {
                duplicates.push(record.name);
            }
        }
        Self {
            records,
            duplicates,
        }
    }

    /// Unique records in roster order.
    pub fn records(&self) -> &[EmployeeRecord] {
        &self.records
    }

    /// Names of rows dropped because an earlier row had the same name.
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_row_handles_missing_trailing_pipe() {
        assert_eq!(split_row("| a | b"), Some(vec!["a", "b"]));
        assert_eq!(split_row("  | a | b |  "), Some(vec!["a", "b"]));
        assert_eq!(split_row("not a row"), None);
    }

    #[test]
    fn separator_detection() {
        assert!(is_separator(&["---", ":--:", "---:"]));
        assert!(!is_separator(&["---", "x"]));
        assert!(!is_separator(&["", "---"]));
    }

    #[test]
    fn header_resolves_column_positions() {
        let cols = Columns::from_header(&["Employee ID", "Name", "Status", "Rate", "Profession"])
            .expect("header");
        assert_eq!(cols.name, 1);
        assert_eq!(cols.id, Some(0));
        assert_eq!(cols.status, Some(2));
        assert_eq!(cols.rate, Some(3));
        assert_eq!(cols.profession, Some(4));
    }

    #[test]
    fn header_without_name_is_rejected() {
        assert!(Columns::from_header(&["ID", "Rate"]).is_none());
    }

    #[test]
    fn roster_keeps_first_duplicate() {
        let roster = Roster::from_records(vec![
            EmployeeRecord::new("Ann Lee").with(FieldName::Id, "1"),
            EmployeeRecord::new("Bo Chan").with(FieldName::Id, "2"),
            EmployeeRecord::new("Ann Lee").with(FieldName::Id, "3"),
        ]);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.records()[0].value(FieldName::Id), Some("1"));
        assert_eq!(roster.duplicates(), &["Ann Lee".to_string()]);
    }
}
