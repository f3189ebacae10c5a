//! Undo functionality for reverting organization passes.
//!
//! Each call reverts the most recent pass recorded in the move journal,
//! moving files back to where they were before that pass.

use crate::journal::{JournalError, MoveJournal, MoveRecord};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Errors that prevent an undo from starting.
#[derive(Debug, Error)]
pub enum UndoError {
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("No previous organization found to undo in {}", .0.display())]
    NothingToUndo(PathBuf),
    #[error(transparent)]
    Journal(#[from] JournalError),
}

/// Represents the result of an undo operation.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Number of files successfully restored.
    pub restored_files: usize,
    /// Files that failed to restore, with the reason.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Files that were skipped because they are no longer where the pass put them.
    pub skipped_files: Vec<(PathBuf, String)>,
    /// Files that occupied an original location and were renamed out of the way.
    pub backups: Vec<PathBuf>,
}

impl UndoReport {
    /// Returns true if every recorded move was reverted.
    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty() && self.skipped_files.is_empty()
    }
}

/// Manages undo operations for file organization.
pub struct UndoManager;

impl UndoManager {
    /// Reverts the most recent journaled pass under `root`.
    ///
    /// Moves are reverted newest first. The pass is removed from the journal
    /// only if at least one file came back and no restore failed, so a failed
    /// undo can be retried.
    ///
    /// # Edge Cases Handled
    ///
    /// * **File not found**: Skipped with a note that the file couldn't be found
    /// * **File name conflict**: The conflicting file is backed up with a timestamp suffix
    /// * **Permission denied**: Recorded as a failure with the error reason
    /// * **Missing history**: Returns [`UndoError::NothingToUndo`]
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tidywatch::undo::UndoManager;
    /// use std::path::Path;
    ///
    /// match UndoManager::undo(Path::new("/path/to/directory")) {
    ///     Ok(report) => println!("Restored {} files", report.restored_files),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(root: &Path) -> Result<UndoReport, UndoError> {
        if !root.is_dir() {
            return Err(UndoError::DirectoryNotFound(root.to_path_buf()));
        }

        let mut journal = MoveJournal::load(root)?;
        let pass = journal
            .pop()
            .ok_or_else(|| UndoError::NothingToUndo(root.to_path_buf()))?;
        info!(
            "Reverting {} moves from the pass at {}",
            pass.moves.len(),
            pass.timestamp.to_rfc3339()
        );

        let mut report = UndoReport::default();
        for record in pass.moves.iter().rev() {
            match Self::restore_file(record) {
                Ok(backup) => {
                    report.restored_files += 1;
                    report.backups.extend(backup);
                }
                Err(Restore::Skipped(path, reason)) => report.skipped_files.push((path, reason)),
                Err(Restore::Failed(path, reason)) => report.failed_restores.push((path, reason)),
            }
        }

        if !report.failed_restores.is_empty() {
            warn!("Some files could not be restored; the pass stays in the journal");
        } else if report.restored_files == 0 {
            warn!("No file of the pass was found; the pass stays in the journal");
        } else {
            journal.save(root)?;
        }

        Ok(report)
    }

    /// Restores a single file to its original location.
    ///
    /// Returns the backup path if an existing file had to be moved aside.
    fn restore_file(record: &MoveRecord) -> Result<Option<PathBuf>, Restore> {
        if !record.to.exists() {
            return Err(Restore::Skipped(
                record.to.clone(),
                "File not found at expected location".to_string(),
            ));
        }

        let backup = if record.from.exists() {
            let backup_path = Self::generate_backup_path(&record.from);
            fs::rename(&record.from, &backup_path).map_err(|e| {
                Restore::Failed(
                    record.from.clone(),
                    format!("Could not backup conflicting file: {}", e),
                )
            })?;
            warn!(
                "{} was occupied, moved the existing file to {}",
                record.from.display(),
                backup_path.display()
            );
            Some(backup_path)
        } else {
            None
        };

        fs::rename(&record.to, &record.from).map_err(|e| {
            Restore::Failed(record.to.clone(), format!("Failed to restore file: {}", e))
        })?;
        info!("Restored {}", record.from.display());

        Ok(backup)
    }

    /// Generates a backup path for a file by appending a timestamp.
    ///
    /// Example: `file.txt` becomes `file.txt.bak.20251109-143052`
    fn generate_backup_path(original_path: &Path) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let filename = original_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        original_path.with_file_name(format!("{}.bak.{}", filename, timestamp))
    }
}

enum Restore {
    Skipped(PathBuf, String),
    Failed(PathBuf, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OrganizerConfig;
    use crate::file_organizer::organize;
    use tempfile::TempDir;

    #[test]
    fn test_undo_no_history() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let result = UndoManager::undo(temp_dir.path());
        assert!(matches!(result, Err(UndoError::NothingToUndo(_))));
    }

    #[test]
    fn test_undo_invalid_base_path() {
        let result = UndoManager::undo(Path::new("/non/existent/path"));
        assert!(matches!(result, Err(UndoError::DirectoryNotFound(_))));
    }

    #[test]
    fn test_undo_reverts_last_pass_only() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        let config = OrganizerConfig::default();

        fs::write(root.join("first.txt"), "1").unwrap();
        organize(root, &config).expect("First pass failed");
        fs::write(root.join("second.mp3"), "2").unwrap();
        organize(root, &config).expect("Second pass failed");

        let report = UndoManager::undo(root).expect("Undo failed");

        assert_eq!(report.restored_files, 1);
        assert!(report.is_complete_success());
        assert!(root.join("second.mp3").exists());
        assert!(root.join("Docs").join("first.txt").exists());

        let report = UndoManager::undo(root).expect("Second undo failed");
        assert_eq!(report.restored_files, 1);
        assert!(root.join("first.txt").exists());
        assert!(!MoveJournal::path(root).exists());
    }

    #[test]
    fn test_undo_with_file_name_conflict() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        fs::write(root.join("test.txt"), "original content").unwrap();
        organize(root, &OrganizerConfig::default()).expect("Pass failed");
        fs::write(root.join("test.txt"), "new content").unwrap();

        let report = UndoManager::undo(root).expect("Undo failed");

        assert_eq!(report.restored_files, 1);
        assert_eq!(report.backups.len(), 1);
        assert_eq!(
            fs::read_to_string(root.join("test.txt")).unwrap(),
            "original content"
        );
        assert_eq!(fs::read_to_string(&report.backups[0]).unwrap(), "new content");
    }

    #[test]
    fn test_undo_with_missing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        fs::write(root.join("gone.txt"), "x").unwrap();
        organize(root, &OrganizerConfig::default()).expect("Pass failed");
        fs::remove_file(root.join("Docs").join("gone.txt")).unwrap();

        let report = UndoManager::undo(root).expect("Undo failed");

        assert_eq!(report.restored_files, 0);
        assert_eq!(report.skipped_files.len(), 1);
        assert_eq!(MoveJournal::load(root).unwrap().passes().len(), 1);
    }
}
