//! Command orchestration for tidywatch.
//!
//! This module ties configuration loading, the organizer, the watch loop and
//! undo together behind one entry point per command, and prints the
//! end-of-run summaries for the one-shot commands.

use crate::config::OrganizerConfig;
use crate::file_organizer::{ScanResult, organize, plan};
use crate::output::OutputFormatter;
use crate::undo::{UndoManager, UndoReport};
use crate::watch::watch_directory;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Represents a command to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Organize once, then keep organizing on every change until interrupted.
    Watch,
    /// Organize once and exit.
    Organize {
        /// If true, report what would happen without making changes.
        dry_run: bool,
    },
    /// Revert the most recent journaled pass.
    Undo,
}

/// Runs `command` against `root`.
///
/// Configuration is loaded from `config_path` or the default locations
/// before anything touches the filesystem, so a bad configuration fails fast.
///
/// # Examples
///
/// ```no_run
/// use tidywatch::cli::{Command, run_cli};
/// use std::path::Path;
///
/// # async fn demo() -> anyhow::Result<()> {
/// run_cli(Command::Organize { dry_run: true }, Path::new("/home/me/Downloads"), None).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_cli(command: Command, root: &Path, config_path: Option<&Path>) -> Result<()> {
    match command {
        Command::Watch => {
            let config = Arc::new(load_config(config_path)?);
            let passes = watch_directory(root, config).await?;
            info!("Stopped watching directory after {} passes.", passes);
            Ok(())
        }
        Command::Organize { dry_run } => {
            let config = load_config(config_path)?;
            organize_directory(root, &config, dry_run).map(|_| ())
        }
        Command::Undo => undo_organization(root).map(|_| ()),
    }
}

/// Loads and compiles the configuration, adding the source to any error.
pub fn load_config(config_path: Option<&Path>) -> Result<OrganizerConfig> {
    OrganizerConfig::load(config_path).context("Error loading configuration")
}

/// Runs a single pass over `root` and prints a summary.
///
/// A missing root is an error here, unlike in watch mode where the pass is
/// simply skipped.
pub fn organize_directory(root: &Path, config: &OrganizerConfig, dry_run: bool) -> Result<ScanResult> {
    let result = if dry_run {
        OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", root.display()));
        plan(root, config)
    } else {
        info!("Organizing contents of: {}", root.display());
        organize(root, config)
    }
    .with_context(|| format!("Could not organize {}", root.display()))?;

    OutputFormatter::scan_summary(&result);

    if dry_run {
        OutputFormatter::dry_run_notice("No files were modified.");
    } else if result.has_failures() {
        OutputFormatter::warning("Some files could not be organized. Please review errors above.");
    } else if result.moved_count() > 0 && config.history_limit() > 0 {
        OutputFormatter::success(&format!(
            "Organization complete! Use 'tidywatch undo {}' to revert it.",
            root.display()
        ));
    } else {
        OutputFormatter::success("Organization complete!");
    }

    Ok(result)
}

/// Reverts the most recent journaled pass and prints what happened.
pub fn undo_organization(root: &Path) -> Result<UndoReport> {
    info!("Undoing previous organization in {}", root.display());
    let report = UndoManager::undo(root)?;
    OutputFormatter::undo_summary(&report);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_organize_directory_missing_root_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing");

        let result = organize_directory(&missing, &OrganizerConfig::default(), false);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_missing_explicit_file() {
        let result = load_config(Some(Path::new("/non/existent/config.toml")));
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("Error loading configuration"));
        assert!(message.contains("not found"));
    }

    #[tokio::test]
    async fn test_run_cli_dry_run() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "").unwrap();
        fs::write(temp_dir.path().join("a.mp4"), "video").unwrap();

        run_cli(
            Command::Organize { dry_run: true },
            temp_dir.path(),
            Some(&config_path),
        )
        .await
        .expect("dry run failed");

        assert!(temp_dir.path().join("a.mp4").exists());
    }
}
