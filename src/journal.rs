//! Record of a live run, used by undo.
//!
//! A live run writes `.archsort_journal.json` to the destination root listing
//! every file it moved. The file is replaced on each live run that moves
//! something, so it always describes the most recent one.

use crate::executor::{MigrationError, MigrationResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One relocated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Where the file was before the run.
    pub source: PathBuf,
    /// Where the run put it.
    pub destination: PathBuf,
    pub category: String,
}

/// All moves performed by one live run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveJournal {
    /// RFC 3339 timestamp of the run.
    pub timestamp: String,
    pub archive_root: PathBuf,
    pub destination_root: PathBuf,
    pub entries: Vec<JournalEntry>,
}

impl MoveJournal {
    /// File name of the journal inside the destination root.
    pub const FILE_NAME: &'static str = ".archsort_journal.json";

    pub fn new(archive_root: PathBuf, destination_root: PathBuf, entries: Vec<JournalEntry>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            archive_root,
            destination_root,
            entries,
        }
    }

    /// Path of the journal for a destination root.
    pub fn path_in(destination_root: &Path) -> PathBuf {
        destination_root.join(Self::FILE_NAME)
    }

    /// Writes the journal to `destination_root`, replacing any previous one.
    pub fn save(&self, destination_root: &Path) -> MigrationResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            MigrationError::JournalWriteFailed {
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("JSON serialization failed: {}", e),
                ),
            }
        })?;

        fs::write(Self::path_in(destination_root), json)
            .map_err(|e| MigrationError::JournalWriteFailed { source: e })
    }

    /// Loads the journal from `destination_root`, if there is one.
    pub fn load(destination_root: &Path) -> MigrationResult<Option<Self>> {
        let path = Self::path_in(destination_root);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)
            .map_err(|e| MigrationError::JournalReadFailed { source: e })?;

        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| MigrationError::InvalidJournalFormat {
                reason: format!("JSON parse error: {}", e),
            })
    }

    /// Removes the journal from `destination_root`, if present.
    pub fn delete(destination_root: &Path) -> MigrationResult<()> {
        let path = Self::path_in(destination_root);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| MigrationError::JournalWriteFailed { source: e })?;
        }
        Ok(())
    }
}
