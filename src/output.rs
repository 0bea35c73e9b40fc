//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output: coloured status
//! lines, progress bars, the per-category migration report and its summary.

use crate::executor::{MoveOutcome, Report};
use crate::planner::{Move, Plan};
use crate::undo::UndoReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::Path;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars for long runs
/// - The migration report and summary table
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use archsort::output::OutputFormatter;
    /// OutputFormatter::success("Migration complete");
    /// ```
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

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates and returns a progress bar for file operations.
    ///
    /// ```no_run
    /// use archsort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_with_message("Completed!");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints every move grouped by category, then the summary.
    pub fn migration_report(plan: &Plan, report: &Report) {
        if report.dry_run {
            Self::dry_run_notice("No files will be moved");
        } else {
            Self::header("MIGRATING");
        }

        for group in report
            .outcomes
            .chunk_by(|(a, _), (b, _)| a.category == b.category)
        {
            let category = &group[0].0.category;
            Self::header(&format!(
                "## {} ({} {})",
                category,
                group.len(),
                plural(group.len(), "file", "files")
            ));
            for (mv, outcome) in group {
                Self::move_line(plan, mv, outcome);
            }
        }

        Self::summary(report);
    }

    fn move_line(plan: &Plan, mv: &Move, outcome: &MoveOutcome) {
        let source = plan.relative_source(mv).display();
        let original = mv
            .duplicate_of
            .as_deref()
            .map(|path| relative_to(path, &plan.archive_root).display().to_string())
            .unwrap_or_default();

        if mv.is_identical_duplicate() {
            println!("  {} {}", "⏭ DUPLICATE (identical):".yellow(), source);
            println!("     = {}", original);
            return;
        }
        if mv.is_disambiguated() {
            println!("  {} {}", "⚠ DUPLICATE (different content):".yellow(), source);
            println!("     ≠ {}", original);
            let renamed = mv
                .destination
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!("     renamed to {}", renamed);
        }

        let destination = mv.destination.display();
        match outcome {
            MoveOutcome::Planned => {
                println!("  {}", source);
                println!("     → {}", destination);
            }
            MoveOutcome::Moved => {
                println!("  {} {} → {}", "✓".green(), source, destination);
            }
            MoveOutcome::DestinationExists => {
                println!("  {} Already exists: {}", "⚠".yellow(), destination);
            }
            MoveOutcome::Failed(reason) => {
                eprintln!("  {} {}: {}", "✗".red(), source, reason);
            }
            MoveOutcome::IdenticalSkipped => {}
        }
    }

    /// Prints the summary counts and the per-category table.
    pub fn summary(report: &Report) {
        Self::header("SUMMARY");
        for line in summary_lines(report) {
            Self::plain(&line);
        }

        let mut category_counts: HashMap<String, usize> = HashMap::new();
        for (mv, _) in &report.outcomes {
            *category_counts.entry(mv.category.clone()).or_insert(0) += 1;
        }
        if !category_counts.is_empty() {
            Self::summary_table(&category_counts, report.outcomes.len());
        }

        if !report.failures.is_empty() {
            Self::header("FAILURES");
            for (path, reason) in &report.failures {
                Self::error(&format!("{}: {}", path.display(), reason));
            }
        }
    }

    /// Prints a summary table with file statistics by category.
    pub fn summary_table(category_counts: &HashMap<String, usize>, total_files: usize) {
        let mut categories: Vec<_> = category_counts.iter().collect();
        categories.sort_by_key(|&(name, _)| name);

        let max_category_len = categories
            .iter()
            .map(|(name, _)| name.chars().count())
            .max()
            .unwrap_or(0)
            .max(8);

        println!();
        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in &categories {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(**count, "file", "files"),
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files, "file", "files"),
            width = max_category_len
        );
    }

    /// Prints the outcome of an undo.
    pub fn undo_report(report: &UndoReport) {
        Self::success(&format!(
            "Restored {} {}",
            report.restored_files,
            plural(report.restored_files, "file", "files")
        ));

        for backup in &report.backups {
            Self::info(&format!("Backed up conflicting file to {}", backup.display()));
        }

        if !report.skipped_files.is_empty() {
            Self::warning(&format!("Skipped: {}", report.skipped_files.len()));
            for (path, reason) in &report.skipped_files {
                Self::plain(&format!("    - {}: {}", path.display(), reason));
            }
        }

        if !report.failed_restores.is_empty() {
            Self::error(&format!("Failed: {}", report.failed_restores.len()));
            for (path, reason) in &report.failed_restores {
                Self::error(&format!("    - {}: {}", path.display(), reason));
            }
        }

        if !report.is_complete_success() {
            Self::warning("Journal was NOT deleted. Fix the issues above and run undo again.");
        }
    }
}

/// The summary counts as plain lines.
pub fn summary_lines(report: &Report) -> Vec<String> {
    let mut lines = vec![
        format!("Files considered:  {}", report.files_considered),
        format!("Classified:        {}", report.classified),
        format!("Unclassified:      {}", report.unclassified),
    ];
    if report.duplicates_skipped > 0 {
        lines.push(format!(
            "Identical duplicates skipped: {}",
            report.duplicates_skipped
        ));
    }
    if report.duplicates_disambiguated > 0 {
        lines.push(format!(
            "Duplicates renamed: {}",
            report.duplicates_disambiguated
        ));
    }

    if report.dry_run {
        lines.push(format!("Would move:        {}", report.pending()));
    } else {
        lines.push(format!("Moved:             {}", report.moved));
        if report.skipped_existing > 0 {
            lines.push(format!(
                "Already at destination: {}",
                report.skipped_existing
            ));
        }
    }

    if !report.failures.is_empty() {
        lines.push(format!("Failures:          {}", report.failures.len()));
    }
    lines
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

fn relative_to<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}
