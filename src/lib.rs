//! archsort - sort a loosely organized document archive into a fixed taxonomy
//!
//! This library classifies archive files with an ordered rule table,
//! normalizes their names, resolves duplicate destinations by content hash,
//! and either reports, exports or performs the resulting moves. Live runs are
//! journaled so they can be undone.

pub mod classify;
pub mod cli;
pub mod config;
pub mod dates;
pub mod duplicates;
pub mod executor;
pub mod export;
pub mod journal;
pub mod normalize;
pub mod output;
pub mod planner;
pub mod taxonomy;
pub mod undo;

pub use classify::{Classification, Classifier, FileContext, Rule};
pub use config::{ConfigError, IgnoreFilter, IgnoreRules, MigrationConfig};
pub use executor::{Executor, MigrationError, MoveOutcome, Report};
pub use journal::{JournalEntry, MoveJournal};
pub use normalize::normalize_file_name;
pub use planner::{Move, Plan, Planner};
pub use taxonomy::Folder;
pub use undo::{UndoManager, UndoReport};

pub use cli::{MigrateCommand, run_cli};
