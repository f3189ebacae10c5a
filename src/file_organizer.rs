//! File organization system for moving files into category directories.
//!
//! One call to [`organize`] is one pass over the top level of a directory:
//! it makes sure every category folder exists, classifies each regular file
//! by extension and moves matches into their folder. Failures on individual
//! files are recorded in the returned [`ScanResult`] and never abort the pass.

use crate::config::{CollisionPolicy, OrganizerConfig};
use crate::file_category::{Classification, classify, split_extension};
use crate::journal::{JOURNAL_FILE_NAME, MoveJournal, MoveRecord};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors that abort a whole organization pass.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The root path does not exist or is not a directory.
    #[error("Directory not found: {}", .path.display())]
    DirectoryNotFound { path: PathBuf },
    /// Failed to create a category directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    CategoryDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Failed to list the root directory.
    #[error("Failed to read directory {}: {source}", .path.display())]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Failure to move one file into its category folder.
#[derive(Debug, Error)]
#[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
pub struct MoveError {
    pub from: PathBuf,
    pub to: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// What happened to one top-level entry during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Moved into its category folder.
    Moved {
        category: String,
        destination: PathBuf,
    },
    /// Dry run: would have been moved here.
    Planned {
        category: String,
        destination: PathBuf,
    },
    /// No category claims the file's extension; left in place.
    Unmatched,
    /// A directory or a category folder; never touched.
    SkippedDirectory,
    /// Filtered out by configuration, or a file the organizer owns.
    Excluded,
    /// The destination name was taken and the policy is to skip.
    Kept { category: String },
    /// The move failed; the file stays at the top level.
    Failed { category: String, reason: String },
}

/// One entry of a [`ScanResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryReport {
    pub name: String,
    pub outcome: EntryOutcome,
}

/// Everything one pass did, in file-name order.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    entries: Vec<EntryReport>,
}

impl ScanResult {
    pub fn entries(&self) -> &[EntryReport] {
        &self.entries
    }

    /// Looks up the outcome for a top-level name.
    pub fn outcome_of(&self, name: &str) -> Option<&EntryOutcome> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| &entry.outcome)
    }

    /// Number of files moved (or planned, for a dry run).
    pub fn moved_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| {
                matches!(
                    entry.outcome,
                    EntryOutcome::Moved { .. } | EntryOutcome::Planned { .. }
                )
            })
            .count()
    }

    /// Names of files that matched no category.
    pub fn unmatched(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|entry| entry.outcome == EntryOutcome::Unmatched)
            .map(|entry| entry.name.as_str())
    }

    /// Entries whose move failed.
    pub fn failures(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.outcome, EntryOutcome::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// Moved (or planned) files per category, sorted by category name.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            if let EntryOutcome::Moved { category, .. } | EntryOutcome::Planned { category, .. } =
                &entry.outcome
            {
                *counts.entry(category.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    fn push(&mut self, name: String, outcome: EntryOutcome) {
        self.entries.push(EntryReport { name, outcome });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassMode {
    Apply,
    DryRun,
}

/// Runs one organization pass over the top level of `root`.
///
/// Category folders are created first. Each regular file that passes the
/// filters and matches a category is moved to `root/<category>/<name>`,
/// following the configured collision policy. Moves are appended to the
/// journal when it is enabled, with absolute paths so an undo works no matter
/// how the root is spelled later.
///
/// # Errors
///
/// Returns [`OrganizeError::DirectoryNotFound`] without touching anything if
/// `root` is missing. Per-file failures are reported in the [`ScanResult`].
///
/// # Examples
///
/// ```no_run
/// use tidywatch::config::OrganizerConfig;
/// use tidywatch::file_organizer::organize;
/// use std::path::Path;
///
/// let config = OrganizerConfig::default();
/// match organize(Path::new("/home/me/Downloads"), &config) {
///     Ok(result) => println!("Moved {} files", result.moved_count()),
///     Err(e) => eprintln!("Organization failed: {}", e),
/// }
/// ```
pub fn organize(root: &Path, config: &OrganizerConfig) -> OrganizeResult<ScanResult> {
    let result = run_pass(root, config, PassMode::Apply)?;

    let moves = match fs::canonicalize(root) {
        Ok(base) => journal_moves(&base, &result),
        Err(e) => {
            warn!("Could not resolve {} for the move journal: {}", root.display(), e);
            Vec::new()
        }
    };

    if let Err(e) = MoveJournal::record_pass(root, moves, config.history_limit()) {
        warn!("Could not update move journal: {}", e);
    }

    Ok(result)
}

fn journal_moves(base: &Path, result: &ScanResult) -> Vec<MoveRecord> {
    result
        .entries
        .iter()
        .filter_map(|entry| match &entry.outcome {
            EntryOutcome::Moved {
                category,
                destination,
            } => Some(MoveRecord {
                from: base.join(&entry.name),
                to: base.join(category).join(destination.file_name()?),
                category: category.clone(),
            }),
            _ => None,
        })
        .collect()
}

/// Computes what [`organize`] would do without creating or moving anything.
pub fn plan(root: &Path, config: &OrganizerConfig) -> OrganizeResult<ScanResult> {
    run_pass(root, config, PassMode::DryRun)
}

fn run_pass(root: &Path, config: &OrganizerConfig, mode: PassMode) -> OrganizeResult<ScanResult> {
    if !root.is_dir() {
        return Err(OrganizeError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }

    let table = config.categories();
    if mode == PassMode::Apply {
        for folder in table.folder_names() {
            let path = root.join(folder);
            fs::create_dir_all(&path)
                .map_err(|source| OrganizeError::CategoryDirFailed { path, source })?;
        }
    }

    let mut entries: Vec<_> = fs::read_dir(root)
        .map_err(|source| OrganizeError::ReadDirFailed {
            path: root.to_path_buf(),
            source,
        })?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", root.display(), e);
                None
            }
        })
        .collect();
    entries.sort_by_key(|entry| entry.file_name());

    let mut result = ScanResult::default();
    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();

        if path.is_dir() || table.is_reserved(&name) {
            debug!("Skipping directory {}", name);
            result.push(name, EntryOutcome::SkippedDirectory);
            continue;
        }

        if name == JOURNAL_FILE_NAME || !config.filters().should_include(Path::new(&name)) {
            debug!("Excluded {}", name);
            result.push(name, EntryOutcome::Excluded);
            continue;
        }

        let rule = match classify(&name, table) {
            Classification::Category(rule) => rule,
            Classification::Unmatched => {
                info!("File {} does not match any category, left in place", name);
                result.push(name, EntryOutcome::Unmatched);
                continue;
            }
        };
        let category = rule.name().to_string();
        let category_dir = root.join(&category);

        let Some(destination) = resolve_destination(&category_dir, &name, config.on_collision())
        else {
            warn!(
                "{} already exists in {}, leaving the new file in place",
                name, category
            );
            result.push(name, EntryOutcome::Kept { category });
            continue;
        };

        let outcome = match mode {
            PassMode::DryRun => {
                info!("Would move {} to {}", name, category);
                EntryOutcome::Planned {
                    category,
                    destination,
                }
            }
            PassMode::Apply => match FileOrganizer::move_file(&path, &destination) {
                Ok(()) => {
                    info!("Moved {} to {}", name, category);
                    EntryOutcome::Moved {
                        category,
                        destination,
                    }
                }
                Err(e) => {
                    error!("{}", e);
                    EntryOutcome::Failed {
                        category,
                        reason: e.source.to_string(),
                    }
                }
            },
        };
        result.push(name, outcome);
    }

    Ok(result)
}

/// Picks the destination for `name` inside `category_dir`.
///
/// Returns `None` when the name is taken and the policy is [`CollisionPolicy::Skip`].
fn resolve_destination(category_dir: &Path, name: &str, policy: CollisionPolicy) -> Option<PathBuf> {
    let candidate = category_dir.join(name);
    if !occupied(&candidate) {
        return Some(candidate);
    }

    match policy {
        CollisionPolicy::Overwrite => Some(candidate),
        CollisionPolicy::Skip => None,
        CollisionPolicy::Rename => {
            let (stem, ext) = split_extension(name);
            let ext = ext.unwrap_or("");
            (1u64..)
                .map(|n| category_dir.join(format!("{} ({}){}", stem, n, ext)))
                .find(|path| !occupied(path))
        }
    }
}

fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Low-level file relocation.
pub struct FileOrganizer;

impl FileOrganizer {
    /// Moves a file to an exact destination path, replacing a regular file
    /// already there.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tidywatch::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let result = FileOrganizer::move_file(
    ///     Path::new("/path/to/base/image.png"),
    ///     Path::new("/path/to/base/Images/image.png"),
    /// );
    ///
    /// if let Err(e) = result {
    ///     eprintln!("{}", e);
    /// }
    /// ```
    pub fn move_file(from: &Path, to: &Path) -> Result<(), MoveError> {
        fs::rename(from, to).map_err(|source| MoveError {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source,
        })
    }
}
