//! tidywatch - keep a directory sorted into category folders
//!
//! This library classifies files by extension, moves them into per-category
//! subfolders, watches the directory so new files are sorted as they arrive,
//! and keeps a journal of moves so a pass can be undone.

pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod journal;
pub mod output;
pub mod undo;
pub mod watch;

pub use config::{CollisionPolicy, ConfigError, OrganizerConfig, Settings};
pub use file_category::{CategoryRule, CategoryTable, Classification, classify};
pub use file_organizer::{EntryOutcome, OrganizeError, ScanResult, organize, plan};
pub use journal::MoveJournal;
pub use undo::{UndoManager, UndoReport};
pub use watch::{WatchState, watch_directory};

pub use cli::{Command, run_cli};
