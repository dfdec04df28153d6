//! Profile discovery.
//!
//! Profiles live at `<root>/[Department]/[Employee Name]/Profile*.md`. The
//! locator lists them through the store and derives the department and
//! employee name from the directory components; it never reads contents.

use std::path::{Component, Path, PathBuf};

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, SyncError};
use crate::store::FileStore;

/// One discovered profile document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileLocation {
    pub path: PathBuf,
    pub department: Option<String>,
    /// `None` when no name can be derived from the directory layout.
    pub employee_name: Option<String>,
}

/// Everything the locator found under a root.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Sorted by path, no duplicates.
    pub profiles: Vec<ProfileLocation>,
    /// Sub-directories that could not be listed.
    pub failures: Vec<(PathBuf, StoreError)>,
}

pub fn compile_pattern(pattern: &str) -> Result<Pattern, SyncError> {
    Pattern::new(pattern).map_err(|source| SyncError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// List profiles under `root` matching the filename glob `pattern`.
pub fn locate(store: &dyn FileStore, root: &Path, pattern: &str) -> Result<Discovery, SyncError> {
    let pattern = compile_pattern(pattern)?;
    let mut listing = store
        .list(root, &pattern)
        .map_err(|source| SyncError::Discovery {
            path: root.to_path_buf(),
            source,
        })?;

    listing.paths.sort();
    listing.paths.dedup();
    let profiles = listing
        .paths
        .into_iter()
        .map(|path| location_for(root, path))
        .collect();

    Ok(Discovery {
        profiles,
        failures: listing.failures,
    })
}

/// Derive department and employee name from `path` relative to `root`.
pub fn location_for(root: &Path, path: PathBuf) -> ProfileLocation {
    let relative = path.strip_prefix(root).unwrap_or(path.as_path());
    let dirs: Vec<String> = relative
        .parent()
        .map(|parent| {
            parent
                .components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    let employee_name = dirs.last().and_then(|d| employee_name_from_dir(d));
    let department = dirs
        .len()
        .checked_sub(2)
        .and_then(|i| dirs.get(i))
        .cloned();

    ProfileLocation {
        path,
        department,
        employee_name,
    }
}

/// Strip ordering prefixes such as `03 ` from an employee directory name.
pub fn employee_name_from_dir(dir: &str) -> Option<String> {
    let name = dir
        .trim_start_matches(|c: char| c.is_ascii_digit() || c.is_whitespace())
        .trim();
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rstest::rstest;

    #[rstest]
    #[case("Smith John", Some("Smith John"))]
    #[case("03 Jane Doe", Some("Jane Doe"))]
    #[case("  12  Bo Chan  ", Some("Bo Chan"))]
    #[case("2024", None)]
    #[case("", None)]
    fn strips_leading_digits(#[case] dir: &str, #[case] expected: Option<&str>) {
        assert_eq!(employee_name_from_dir(dir).as_deref(), expected);
    }

    #[test]
    fn department_and_name_from_layout() {
        let loc = location_for(
            Path::new("/Nov25"),
            PathBuf::from("/Nov25/Dept/Smith John/Profile.md"),
        );
        assert_eq!(loc.department.as_deref(), Some("Dept"));
        assert_eq!(loc.employee_name.as_deref(), Some("Smith John"));
    }

    #[test]
    fn name_directly_under_root_has_no_department() {
        let loc = location_for(
            Path::new("/Nov25"),
            PathBuf::from("/Nov25/Smith John/Profile.md"),
        );
        assert_eq!(loc.department, None);
        assert_eq!(loc.employee_name.as_deref(), Some("Smith John"));
    }

    #[test]
    fn file_at_root_has_no_employee_name() {
        let loc = location_for(Path::new("/Nov25"), PathBuf::from("/Nov25/Profile.md"));
        assert_eq!(loc.employee_name, None);
        assert_eq!(loc.department, None);
    }

    #[test]
    fn locate_missing_root_is_discovery_error() {
        let store = MemoryStore::new();
        let err = locate(&store, Path::new("/Nov25"), "Profile*.md").unwrap_err();
        assert!(matches!(err, SyncError::Discovery { .. }));
    }

    #[test]
    fn locate_rejects_bad_pattern() {
        let store = MemoryStore::new();
        store.insert_dir("/Nov25");
        let err = locate(&store, Path::new("/Nov25"), "Profile[.md").unwrap_err();
        assert!(matches!(err, SyncError::Pattern { .. }));
    }

    #[test]
    fn locate_orders_by_path() {
        let store = MemoryStore::new();
        store.insert("/Nov25/Z/Zed Zee/Profile.md", "");
        store.insert("/Nov25/A/Ann Lee/Profile.md", "");
        let discovery = locate(&store, Path::new("/Nov25"), "Profile*.md").unwrap();
        let names: Vec<_> = discovery
            .profiles
            .iter()
            .map(|p| p.employee_name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["Ann Lee", "Zed Zee"]);
    }
}
