//! Output formatting and styling module.
//!
//! Provides the coloured, human-facing summaries printed by the one-shot
//! commands. Per-file progress goes through `tracing`; this module only
//! renders the end-of-run view.

use crate::file_organizer::{EntryOutcome, ScanResult};
use crate::undo::UndoReport;
use colored::*;

/// Manages CLI summaries with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Prints a summary table of one pass: moved files per category, then
    /// the files that stayed behind and why.
    pub fn scan_summary(result: &ScanResult) {
        Self::header("SUMMARY");
        let counts = result.category_counts();

        let max_category_len = counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(8); // At least "Category" width

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in &counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count),
                width = max_category_len
            );
        }

        let total = result.moved_count();
        println!("{}", "-".repeat(max_category_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total.to_string().green().bold(),
            plural(total),
            width = max_category_len
        );

        for entry in result.entries() {
            match &entry.outcome {
                EntryOutcome::Unmatched => {
                    println!("  {} {}", "·".dimmed(), format!("{} (no category)", entry.name).dimmed())
                }
                EntryOutcome::Kept { category } => Self::warning(&format!(
                    "{} kept in place: name already taken in {}/",
                    entry.name, category
                )),
                EntryOutcome::Failed { category, reason } => Self::error(&format!(
                    "{} could not be moved to {}/: {}",
                    entry.name, category, reason
                )),
                _ => {}
            }
        }
    }

    /// Prints the outcome of an undo.
    pub fn undo_summary(report: &UndoReport) {
        Self::success(&format!("Restored: {}", report.restored_files));

        for backup in &report.backups {
            Self::warning(&format!("Existing file backed up as {}", backup.display()));
        }

        if !report.skipped_files.is_empty() {
            Self::warning(&format!("Skipped: {}", report.skipped_files.len()));
            for (path, reason) in &report.skipped_files {
                println!("    - {}: {}", path.display(), reason);
            }
        }

        if !report.failed_restores.is_empty() {
            Self::error(&format!("Failed: {}", report.failed_restores.len()));
            for (path, reason) in &report.failed_restores {
                eprintln!("    - {}: {}", path.display(), reason);
            }
            eprintln!("\nThe pass was kept in the journal. Fix the issues and try again.");
        }

        if report.restored_files == 0 && report.failed_restores.is_empty() {
            Self::warning("Nothing was restored, so the pass was kept in the journal.");
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
