/// Undo of the most recent live migration.
///
/// The journal written by a live run is replayed in reverse, moving every
/// file back to where it came from.
use crate::executor::{FileMover, MigrationError, MigrationResult};
use crate::journal::{JournalEntry, MoveJournal};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Represents the result of an undo operation.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Number of files successfully restored.
    pub restored_files: usize,
    /// Files that failed to restore, with the reason.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Files that were skipped because they are no longer where the run put them.
    pub skipped_files: Vec<(PathBuf, String)>,
    /// Files moved aside because they occupied an original location.
    pub backups: Vec<PathBuf>,
}

impl UndoReport {
    /// Returns the total number of journal entries processed.
    pub fn total_processed(&self) -> usize {
        self.restored_files + self.failed_restores.len() + self.skipped_files.len()
    }

    /// Returns true if the undo was completely successful.
    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty() && self.skipped_files.is_empty()
    }
}

enum RestoreError {
    Missing(PathBuf),
    Failed(PathBuf, String),
}

/// Manages undo operations for migrations.
pub struct UndoManager;

impl UndoManager {
    /// Undoes the most recent live migration into `destination_root`.
    ///
    /// # Edge Cases Handled
    ///
    /// * **File not found**: skipped, the journal is kept
    /// * **Original location occupied**: the occupant is backed up with a timestamp suffix
    /// * **Source folder removed**: recreated
    /// * **Missing journal**: returns [`MigrationError::NothingToUndo`]
    ///
    /// The journal is deleted only when every file was restored.
    pub fn undo(destination_root: &Path) -> MigrationResult<UndoReport> {
        if !destination_root.exists() {
            return Err(MigrationError::InvalidBasePath {
                path: destination_root.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "destination root does not exist",
                ),
            });
        }

        let journal =
            MoveJournal::load(destination_root)?.ok_or_else(|| MigrationError::NothingToUndo {
                destination_root: destination_root.to_path_buf(),
            })?;
        info!(
            timestamp = %journal.timestamp,
            entries = journal.entries.len(),
            "undoing migration"
        );

        let mut report = UndoReport::default();
        for entry in journal.entries.iter().rev() {
            match Self::restore_file(entry, &mut report.backups) {
                Ok(()) => report.restored_files += 1,
                Err(RestoreError::Missing(path)) => {
                    warn!(path = %path.display(), "moved file not found, skipping");
                    report
                        .skipped_files
                        .push((path, "File not found at expected location".to_string()));
                }
                Err(RestoreError::Failed(path, reason)) => {
                    warn!(path = %path.display(), %reason, "restore failed");
                    report.failed_restores.push((path, reason));
                }
            }
        }

        if report.is_complete_success()
            && let Err(e) = MoveJournal::delete(destination_root)
        {
            warn!(error = %e, "could not delete journal");
        }

        Ok(report)
    }

    /// Restores a single file to its original location.
    fn restore_file(entry: &JournalEntry, backups: &mut Vec<PathBuf>) -> Result<(), RestoreError> {
        if !entry.destination.exists() {
            return Err(RestoreError::Missing(entry.destination.clone()));
        }

        if let Some(parent) = entry.source.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                RestoreError::Failed(
                    parent.to_path_buf(),
                    format!("Could not recreate folder: {}", e),
                )
            })?;
        }

        if entry.source.exists() {
            let backup_path = Self::generate_backup_path(&entry.source);
            fs::rename(&entry.source, &backup_path).map_err(|e| {
                RestoreError::Failed(
                    entry.source.clone(),
                    format!("Could not backup conflicting file: {}", e),
                )
            })?;
            backups.push(backup_path);
        }

        FileMover::transfer(&entry.destination, &entry.source).map_err(|e| {
            RestoreError::Failed(
                entry.destination.clone(),
                format!("Failed to restore file: {}", e),
            )
        })
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

        let backup_name = format!("{}.bak.{}", filename, timestamp);

        match original_path.parent() {
            Some(parent) => parent.join(backup_name),
            None => PathBuf::from(backup_name),
        }
    }
}
