//! Organizing through a relative root and undoing it from elsewhere.
//!
//! This lives in its own test binary because it changes the process working
//! directory, which would race with tests that run in parallel.

use std::env;
use std::fs;
use tempfile::TempDir;
use tidywatch::file_organizer::organize;
use tidywatch::journal::MoveJournal;
use tidywatch::{OrganizerConfig, UndoManager};

#[test]
fn test_undo_after_organizing_relative_root_from_other_directory() {
    let root_dir = TempDir::new().expect("Failed to create temp directory");
    let elsewhere = TempDir::new().expect("Failed to create temp directory");
    let root = fs::canonicalize(root_dir.path()).unwrap();
    fs::write(root.join("a.txt"), "notes").unwrap();
    let previous = env::current_dir().unwrap();

    env::set_current_dir(&root).unwrap();
    let result = organize(std::path::Path::new("."), &OrganizerConfig::default());
    env::set_current_dir(elsewhere.path()).unwrap();

    assert_eq!(result.expect("Pass failed").moved_count(), 1);
    assert!(root.join("Docs/a.txt").exists());
    let journal = MoveJournal::load(&root).expect("Failed to load journal");
    assert_eq!(journal.passes()[0].moves[0].from, root.join("a.txt"));

    let report = UndoManager::undo(&root).expect("Undo failed");
    env::set_current_dir(previous).unwrap();

    assert_eq!(report.restored_files, 1);
    assert!(report.is_complete_success());
    assert_eq!(fs::read_to_string(root.join("a.txt")).unwrap(), "notes");
    assert!(!MoveJournal::path(&root).exists());
}
