//! Move journal for reverting organization passes.
//!
//! Every pass that moved at least one file is appended to a hidden JSON file
//! in the organized directory. The journal keeps a bounded number of passes
//! and is the input of [`crate::undo::UndoManager`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the journal inside the organized directory.
pub const JOURNAL_FILE_NAME: &str = ".tidywatch_history.json";

/// Errors raised while reading or writing the journal.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Failed to read journal {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write journal {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid journal format in {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A single file relocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Where the file was before the pass.
    pub from: PathBuf,
    /// Where the pass put it.
    pub to: PathBuf,
    /// The category folder it was sorted into.
    pub category: String,
}

/// All moves performed by one organization pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassRecord {
    pub timestamp: DateTime<Utc>,
    pub moves: Vec<MoveRecord>,
}

impl PassRecord {
    pub fn new(moves: Vec<MoveRecord>) -> Self {
        Self {
            timestamp: Utc::now(),
            moves,
        }
    }
}

/// The on-disk journal: passes in chronological order, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveJournal {
    #[serde(default)]
    passes: Vec<PassRecord>,
}

impl MoveJournal {
    /// Returns the path of the journal for a given root directory.
    pub fn path(root: &Path) -> PathBuf {
        root.join(JOURNAL_FILE_NAME)
    }

    /// Loads the journal, returning an empty one if the file does not exist.
    pub fn load(root: &Path) -> Result<Self, JournalError> {
        let path = Self::path(root);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| JournalError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| JournalError::Format { path, source })
    }

    /// Writes the journal. An empty journal removes the file instead.
    pub fn save(&self, root: &Path) -> Result<(), JournalError> {
        let path = Self::path(root);

        if self.passes.is_empty() {
            if path.exists() {
                fs::remove_file(&path).map_err(|source| JournalError::Write { path, source })?;
            }
            return Ok(());
        }

        let json = serde_json::to_string_pretty(self).map_err(|source| JournalError::Format {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| JournalError::Write { path, source })
    }

    /// Appends a pass, dropping the oldest passes beyond `limit`.
    pub fn push(&mut self, pass: PassRecord, limit: usize) {
        self.passes.push(pass);
        if self.passes.len() > limit {
            let excess = self.passes.len() - limit;
            self.passes.drain(..excess);
        }
    }

    /// Removes and returns the most recent pass.
    pub fn pop(&mut self) -> Option<PassRecord> {
        self.passes.pop()
    }

    pub fn passes(&self) -> &[PassRecord] {
        &self.passes
    }

    /// Appends one pass to the journal stored under `root`.
    ///
    /// Does nothing when `moves` is empty or `limit` is 0.
    pub fn record_pass(
        root: &Path,
        moves: Vec<MoveRecord>,
        limit: usize,
    ) -> Result<(), JournalError> {
        if moves.is_empty() || limit == 0 {
            return Ok(());
        }
        let mut journal = Self::load(root)?;
        journal.push(PassRecord::new(moves), limit);
        journal.save(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(name: &str) -> MoveRecord {
        MoveRecord {
            from: PathBuf::from(name),
            to: PathBuf::from("Docs").join(name),
            category: "Docs".to_string(),
        }
    }

    #[test]
    fn test_load_missing_journal_is_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let journal = MoveJournal::load(temp_dir.path()).expect("Failed to load journal");
        assert!(journal.passes().is_empty());
    }

    #[test]
    fn test_record_pass_persists() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        MoveJournal::record_pass(root, vec![record("a.txt"), record("b.txt")], 10)
            .expect("Failed to record pass");

        let journal = MoveJournal::load(root).expect("Failed to load journal");
        assert_eq!(journal.passes().len(), 1);
        assert_eq!(journal.passes()[0].moves.len(), 2);
        assert_eq!(journal.passes()[0].moves[1], record("b.txt"));
    }

    #[test]
    fn test_record_pass_skips_empty_and_disabled() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        MoveJournal::record_pass(root, Vec::new(), 10).unwrap();
        MoveJournal::record_pass(root, vec![record("a.txt")], 0).unwrap();

        assert!(!MoveJournal::path(root).exists());
    }

    #[test]
    fn test_push_enforces_limit() {
        let mut journal = MoveJournal::default();
        for name in ["1.txt", "2.txt", "3.txt"] {
            journal.push(PassRecord::new(vec![record(name)]), 2);
        }

        assert_eq!(journal.passes().len(), 2);
        assert_eq!(journal.passes()[0].moves[0], record("2.txt"));
        assert_eq!(journal.pop().unwrap().moves[0], record("3.txt"));
    }

    #[test]
    fn test_save_empty_removes_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();

        MoveJournal::record_pass(root, vec![record("a.txt")], 10).unwrap();
        let mut journal = MoveJournal::load(root).unwrap();
        journal.pop();
        journal.save(root).unwrap();

        assert!(!MoveJournal::path(root).exists());
    }

    #[test]
    fn test_corrupt_journal_is_reported() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(MoveJournal::path(root), "not json").unwrap();

        assert!(matches!(
            MoveJournal::load(root),
            Err(JournalError::Format { .. })
        ));
    }
}
