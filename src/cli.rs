//! Command orchestration for archsort.
//!
//! This module wires configuration, planning, export, execution and undo
//! together and prints the results:
//! - `Migrate` plans the configured folders, optionally exports CSV, then
//!   either reports (dry run) or moves the files and saves a journal
//! - `Undo` reverts the most recent live migration

use crate::config::MigrationConfig;
use crate::executor::{Executor, Report};
use crate::export::export_csv;
use crate::journal::MoveJournal;
use crate::output::OutputFormatter;
use crate::planner::Planner;
use crate::undo::UndoManager;
use std::path::{Path, PathBuf};

/// Represents a CLI command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrateCommand {
    /// Plan and migrate the configured folders.
    Migrate {
        /// Report what would happen without moving anything.
        dry_run: bool,
        /// Export the plan as CSV. Without `dry_run`, nothing else happens.
        csv: Option<PathBuf>,
    },
    /// Undo the previous live migration.
    Undo,
}

/// Runs one command against `config`.
///
/// Failures of individual files are reported but do not make this return an
/// error; only configuration problems and a failed undo or CSV export do.
///
/// ```no_run
/// use archsort::cli::{run_cli, MigrateCommand};
/// use archsort::config::MigrationConfig;
///
/// let config = MigrationConfig::for_roots("/arkiv/900 Arkiv", "/arkiv");
/// let command = MigrateCommand::Migrate { dry_run: true, csv: None };
/// if let Err(e) = run_cli(command, &config) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(command: MigrateCommand, config: &MigrationConfig) -> Result<(), String> {
    match command {
        MigrateCommand::Migrate { dry_run, csv } => {
            migrate(config, dry_run, csv.as_deref()).map(|_| ())
        }
        MigrateCommand::Undo => undo_migration(config),
    }
}

/// Returns the run's report, or `None` when only a CSV was exported.
fn migrate(
    config: &MigrationConfig,
    dry_run: bool,
    csv: Option<&Path>,
) -> Result<Option<Report>, String> {
    let planner =
        Planner::new(config).map_err(|e| format!("Error loading configuration: {}", e))?;

    OutputFormatter::info(&format!("Source:      {}", planner.archive_root().display()));
    OutputFormatter::info(&format!(
        "Destination: {}",
        planner.destination_root().display()
    ));
    OutputFormatter::info(&format!("Folders:     {}", config.folders.join(", ")));

    let plan = planner.plan(&config.folders);
    for folder in &plan.missing_folders {
        OutputFormatter::warning(&format!("Folder does not exist: {}", folder));
    }

    if plan.is_empty() {
        OutputFormatter::warning("No files to move");
        let report = Executor::new(dry_run).execute(&plan);
        OutputFormatter::summary(&report);
        return Ok(Some(report));
    }

    if let Some(path) = csv {
        let rows = export_csv(&plan, path).map_err(|e| format!("Error: {}", e))?;
        OutputFormatter::success(&format!("Exported {} moves to {}", rows, path.display()));
        if !dry_run {
            return Ok(None);
        }
    }

    let mut executor = Executor::new(dry_run);
    if !dry_run {
        executor = executor.with_progress(OutputFormatter::create_progress_bar(
            plan.moves.len() as u64,
        ));
    }
    let report = executor.execute(&plan);
    OutputFormatter::migration_report(&plan, &report);

    if !report.journal.is_empty() {
        let journal = MoveJournal::new(
            plan.archive_root.clone(),
            plan.destination_root.clone(),
            report.journal.clone(),
        );
        match journal.save(&plan.destination_root) {
            Ok(()) => OutputFormatter::info("Journal saved. Use 'archsort undo' to revert."),
            Err(e) => OutputFormatter::warning(&format!(
                "Could not save journal, undo will not be available: {}",
                e
            )),
        }
    }

    if dry_run {
        OutputFormatter::plain("\nRun without --dry-run to perform the migration.");
    } else if report.has_failures() {
        OutputFormatter::warning("Some files could not be migrated. Please review errors above.");
    }

    Ok(Some(report))
}

fn undo_migration(config: &MigrationConfig) -> Result<(), String> {
    let destination_root = config
        .destination_root()
        .map_err(|e| format!("Error loading configuration: {}", e))?;

    OutputFormatter::info("Undoing previous migration...");
    let report = UndoManager::undo(&destination_root).map_err(|e| format!("Error: {}", e))?;
    OutputFormatter::undo_report(&report);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_migrate_without_roots_fails() {
        let command = MigrateCommand::Migrate {
            dry_run: true,
            csv: None,
        };
        let result = run_cli(command, &MigrationConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_undo_without_journal_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = MigrationConfig::for_roots(temp_dir.path(), temp_dir.path());
        let result = run_cli(MigrateCommand::Undo, &config);
        assert!(result.is_err());
    }

    #[test]
    fn test_unclassified_only_archive_still_reports() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let folder = temp_dir.path().join("Referat");
        std::fs::create_dir_all(&folder).expect("Failed to create folder");
        std::fs::write(folder.join("Kart.jpg"), "kart").expect("Failed to write file");
        std::fs::write(folder.join("Notat.txt"), "notat").expect("Failed to write file");

        let mut config = MigrationConfig::for_roots(temp_dir.path(), temp_dir.path());
        config.folders = vec!["Referat".to_string()];

        let report = migrate(&config, false, None)
            .expect("Migration failed")
            .expect("Report missing");
        assert_eq!(report.files_considered, 2);
        assert_eq!(report.classified, 0);
        assert_eq!(report.unclassified, 2);
        assert_eq!(report.moved, 0);
        assert!(report.journal.is_empty());
    }

    #[test]
    fn test_empty_archive_is_not_an_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = MigrationConfig::for_roots(temp_dir.path(), temp_dir.path());
        let command = MigrateCommand::Migrate {
            dry_run: false,
            csv: None,
        };
        assert!(run_cli(command, &config).is_ok());
    }
}
