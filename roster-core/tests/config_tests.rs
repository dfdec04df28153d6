//! Config load tests for `roster-core`.

use std::path::PathBuf;

use roster_core::{config, ConfigError, SyncConfig};
use tempfile::TempDir;

fn write_config(home: &TempDir, body: &str) -> PathBuf {
    let path = config::default_path_at(home.path());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn loads_all_keys() {
    let home = TempDir::new().unwrap();
    write_config(
        &home,
        "roster_path: /Finance Public/Employees.md\n\
         profiles_root: /Nov25\n\
         profile_pattern: \"Profile*.md\"\n\
         jobs: 4\n\
         state_file: /var/lib/roster/last_sync.json\n",
    );

    let loaded = config::load_or_default_at(home.path()).expect("load");
    assert_eq!(
        loaded,
        SyncConfig {
            roster_path: Some(PathBuf::from("/Finance Public/Employees.md")),
            profiles_root: Some(PathBuf::from("/Nov25")),
            profile_pattern: Some("Profile*.md".into()),
            jobs: Some(4),
            state_file: Some(PathBuf::from("/var/lib/roster/last_sync.json")),
        }
    );
}

#[test]
fn partial_config_leaves_other_keys_unset() {
    let home = TempDir::new().unwrap();
    write_config(&home, "profiles_root: /Nov25\n");
    let loaded = config::load_or_default_at(home.path()).expect("load");
    assert_eq!(loaded.profiles_root, Some(PathBuf::from("/Nov25")));
    assert!(loaded.roster_path.is_none());
    assert_eq!(loaded.pattern(), config::DEFAULT_PROFILE_PATTERN);
}

#[test]
fn unknown_key_is_a_parse_error_with_path() {
    let home = TempDir::new().unwrap();
    let path = write_config(&home, "roster: oops\n");
    let err = config::load_from(&path).unwrap_err();
    match err {
        ConfigError::Parse { path: p, .. } => assert_eq!(p, path),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn explicit_missing_file_is_io_error() {
    let home = TempDir::new().unwrap();
    let err = config::load_from(&home.path().join("nope.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
