//! Execution of a [`Plan`].
//!
//! Moves run one at a time in category-then-destination order. A dry run
//! only records what would happen. A live run creates destination folders as
//! needed and relocates each file, refusing to overwrite anything already at
//! the destination. Per-file problems are collected in the [`Report`]; they
//! never stop the batch.

use crate::journal::JournalEntry;
use crate::planner::{Move, Plan};
use indicatif::ProgressBar;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Errors that can occur while moving files or handling the journal.
#[derive(Debug)]
pub enum MigrationError {
    /// Failed to create a destination directory.
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Something already occupies the destination.
    DestinationExists { path: PathBuf },
    /// The file to move is gone.
    SourceMissing { path: PathBuf },
    /// Failed to move a file to its destination.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: io::Error,
    },
    /// A root directory is invalid or doesn't exist.
    InvalidBasePath { path: PathBuf, source: io::Error },
    /// Failed to write or remove the journal.
    JournalWriteFailed { source: io::Error },
    /// Failed to read the journal.
    JournalReadFailed { source: io::Error },
    /// The journal has an invalid format.
    InvalidJournalFormat { reason: String },
    /// No journal to undo.
    NothingToUndo { destination_root: PathBuf },
    /// Failed to write the CSV export.
    CsvWriteFailed { path: PathBuf, reason: String },
}

impl std::fmt::Display for MigrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectoryCreationFailed { path, source } => {
                write!(f, "Failed to create directory {}: {}", path.display(), source)
            }
            Self::DestinationExists { path } => {
                write!(f, "Destination already exists: {}", path.display())
            }
            Self::SourceMissing { path } => {
                write!(f, "Source file not found: {}", path.display())
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::InvalidBasePath { path, source } => {
                write!(f, "Invalid base path {}: {}", path.display(), source)
            }
            Self::JournalWriteFailed { source } => {
                write!(f, "Failed to write journal: {}", source)
            }
            Self::JournalReadFailed { source } => {
                write!(f, "Failed to read journal: {}", source)
            }
            Self::InvalidJournalFormat { reason } => {
                write!(f, "Invalid journal format: {}", reason)
            }
            Self::NothingToUndo { destination_root } => {
                write!(
                    f,
                    "No previous migration found to undo in {}",
                    destination_root.display()
                )
            }
            Self::CsvWriteFailed { path, reason } => {
                write!(f, "Failed to write CSV {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for MigrationError {}

/// Result type for migration operations.
pub type MigrationResult<T> = Result<T, MigrationError>;

/// Relocates single files.
pub struct FileMover;

impl FileMover {
    /// Moves `source` to `destination`, creating the destination's parent
    /// directories and returning the journal entry for the move.
    ///
    /// Never overwrites: an existing destination yields
    /// [`MigrationError::DestinationExists`] and leaves both files alone.
    pub fn relocate(
        source: &Path,
        destination: &Path,
        category: &str,
    ) -> MigrationResult<JournalEntry> {
        if !source.exists() {
            return Err(MigrationError::SourceMissing {
                path: source.to_path_buf(),
            });
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| MigrationError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        if destination.exists() {
            return Err(MigrationError::DestinationExists {
                path: destination.to_path_buf(),
            });
        }

        Self::transfer(source, destination).map_err(|e| MigrationError::FileMoveFailure {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            source_error: e,
        })?;

        Ok(JournalEntry {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            category: category.to_string(),
        })
    }

    /// Renames `from` to `to`, falling back to copy and delete across
    /// filesystems.
    pub fn transfer(from: &Path, to: &Path) -> io::Result<()> {
        match fs::rename(from, to) {
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                debug!(from = %from.display(), to = %to.display(), "cross-device move, copying");
                Self::copy_then_remove(from, to)
            }
            result => result,
        }
    }

    /// Copies `from` to a staging file beside `to`, renames it into place
    /// and removes `from`. On failure nothing is left at `to` and `from` is
    /// kept.
    fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
        let staging = staging_path(to);
        if let Err(e) = fs::copy(from, &staging).and_then(|_| fs::rename(&staging, to)) {
            discard(&staging);
            return Err(e);
        }

        if let Err(e) = fs::remove_file(from) {
            // leave exactly one copy behind
            discard(to);
            return Err(e);
        }
        Ok(())
    }
}

/// `.<name>.archsort-partial` in the directory of `to`.
fn staging_path(to: &Path) -> PathBuf {
    let name = to
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    to.with_file_name(format!(".{name}.archsort-partial"))
}

/// Removes a leftover copy. A file that is already gone is fine.
fn discard(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove partial copy"),
    }
}

/// What happened to one move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Dry run: would be moved.
    Planned,
    /// Live run: moved.
    Moved,
    /// Same content as an earlier move; left at its source.
    IdenticalSkipped,
    /// Live run: the destination was already occupied.
    DestinationExists,
    /// Live run: the move failed.
    Failed(String),
}

/// Counts and per-move outcomes of one run.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub dry_run: bool,
    pub files_considered: usize,
    pub classified: usize,
    pub unclassified: usize,
    pub duplicates_skipped: usize,
    pub duplicates_disambiguated: usize,
    /// Live run only.
    pub moved: usize,
    /// Live run only.
    pub skipped_existing: usize,
    /// Planning and execution failures.
    pub failures: Vec<(PathBuf, String)>,
    /// Every move in execution order.
    pub outcomes: Vec<(Move, MoveOutcome)>,
    /// Moves actually performed, for undo.
    pub journal: Vec<JournalEntry>,
}

impl Report {
    /// Number of moves a dry run would perform.
    pub fn pending(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == MoveOutcome::Planned)
            .count()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Runs plans, either for real or as a dry run.
pub struct Executor {
    dry_run: bool,
    progress: Option<ProgressBar>,
}

impl Executor {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            progress: None,
        }
    }

    /// Advances `progress` once per move.
    pub fn with_progress(self, progress: ProgressBar) -> Self {
        Self {
            progress: Some(progress),
            ..self
        }
    }

    pub fn execute(&self, plan: &Plan) -> Report {
        let mut report = Report {
            dry_run: self.dry_run,
            files_considered: plan.files_considered,
            classified: plan.classified,
            unclassified: plan.unclassified.len(),
            duplicates_disambiguated: plan.duplicates_disambiguated(),
            failures: plan.failures.clone(),
            ..Report::default()
        };

        for mv in plan.sorted_moves() {
            let outcome = self.execute_move(plan, mv, &mut report.journal);
            match &outcome {
                MoveOutcome::IdenticalSkipped => report.duplicates_skipped += 1,
                MoveOutcome::Moved => report.moved += 1,
                MoveOutcome::DestinationExists => report.skipped_existing += 1,
                MoveOutcome::Failed(reason) => {
                    report.failures.push((mv.source.clone(), reason.clone()));
                }
                MoveOutcome::Planned => {}
            }
            if let Some(progress) = &self.progress {
                progress.inc(1);
            }
            report.outcomes.push((mv.clone(), outcome));
        }

        if let Some(progress) = &self.progress {
            progress.finish_and_clear();
        }

        report
    }

    fn execute_move(&self, plan: &Plan, mv: &Move, journal: &mut Vec<JournalEntry>) -> MoveOutcome {
        if mv.is_identical_duplicate() {
            debug!(source = %mv.source.display(), "identical duplicate, leaving in place");
            return MoveOutcome::IdenticalSkipped;
        }
        if self.dry_run {
            return MoveOutcome::Planned;
        }

        let destination = plan.absolute_destination(mv);
        match FileMover::relocate(&mv.source, &destination, &mv.category) {
            Ok(entry) => {
                info!(
                    source = %plan.relative_source(mv).display(),
                    destination = %mv.destination.display(),
                    "moved"
                );
                journal.push(entry);
                MoveOutcome::Moved
            }
            Err(MigrationError::DestinationExists { path }) => {
                warn!(destination = %path.display(), "destination exists, skipping");
                MoveOutcome::DestinationExists
            }
            Err(e) => {
                warn!(source = %mv.source.display(), error = %e, "move failed");
                MoveOutcome::Failed(e.to_string())
            }
        }
    }
}
