//! Migration configuration.
//!
//! The planner takes its roots, folder list and ignore rules from an explicit
//! [`MigrationConfig`] value, usually loaded from a TOML file:
//!
//! ```toml
//! archive_root = "/Volumes/Drive/Vel/900 Arkiv"
//! destination_root = "/Volumes/Drive/Vel"
//! folders = ["Referat", "Generalforsamling"]
//!
//! [ignore]
//! filenames = [".DS_Store", "Icon\r", "Icon", ".dropbox"]
//! prefixes = ["~$", "._"]
//! patterns = ["**/Backup/**"]
//! regex = []
//! ```
//!
//! Every key is optional. Missing keys take the built-in defaults.

use crate::journal::MoveJournal;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Archive folders processed when none are requested.
pub const DEFAULT_FOLDERS: [&str; 13] = [
    "Referat",
    "Generalforsamling",
    "Vårbrev, Årsberetning",
    "Avtaler og instruks",
    "Regnskap, budsjett",
    "Vedtekter, informasjon til hytteeierne",
    "Tomteinnløsning",
    "Ulovlighetsoppfølging PBE",
    "Frivillighetsregisteret MVA refusjon",
    "Renovasjon",
    "Skjøtsel, dugnad, trær, planter",
    "Anbud",
    "Fellesstyret for øyene",
];

/// Name of the configuration file looked up in the current directory.
pub const LOCAL_CONFIG_FILE: &str = ".archsortrc.toml";

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// IO error while reading configuration.
    IoError(String),
    /// A root directory was never set, by file or command line.
    RootNotConfigured(&'static str),
    /// The archive root does not exist.
    ArchiveRootMissing(PathBuf),
    /// The destination root does not exist.
    DestinationRootMissing(PathBuf),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
            ConfigError::RootNotConfigured(which) => {
                write!(f, "No {} configured", which)
            }
            ConfigError::ArchiveRootMissing(path) => {
                write!(f, "Archive root does not exist: {}", path.display())
            }
            ConfigError::DestinationRootMissing(path) => {
                write!(f, "Destination root does not exist: {}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Everything the planner needs to know about one archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Directory holding the source folders.
    pub archive_root: Option<PathBuf>,
    /// Directory the taxonomy folders are created in.
    pub destination_root: Option<PathBuf>,
    /// Top-level folders of the archive to process.
    pub folders: Vec<String>,
    /// Files skipped while scanning.
    pub ignore: IgnoreRules,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            archive_root: None,
            destination_root: None,
            folders: DEFAULT_FOLDERS.iter().map(|s| s.to_string()).collect(),
            ignore: IgnoreRules::default(),
        }
    }
}

impl MigrationConfig {
    /// A default configuration for the given roots.
    pub fn for_roots(archive_root: impl Into<PathBuf>, destination_root: impl Into<PathBuf>) -> Self {
        Self {
            archive_root: Some(archive_root.into()),
            destination_root: Some(destination_root.into()),
            ..Self::default()
        }
    }

    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.archsortrc.toml` in the current directory
    /// 3. Look for `~/.config/archsort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("archsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Applies command-line overrides. `None` and an empty folder list keep
    /// the loaded values.
    pub fn apply_overrides(
        &mut self,
        archive_root: Option<PathBuf>,
        destination_root: Option<PathBuf>,
        folders: Vec<String>,
    ) {
        if archive_root.is_some() {
            self.archive_root = archive_root;
        }
        if destination_root.is_some() {
            self.destination_root = destination_root;
        }
        if !folders.is_empty() {
            self.folders = folders;
        }
    }

    /// Both roots, checked to exist.
    pub fn roots(&self) -> Result<(PathBuf, PathBuf), ConfigError> {
        let archive_root = self
            .archive_root
            .clone()
            .ok_or(ConfigError::RootNotConfigured("archive root"))?;
        if !archive_root.is_dir() {
            return Err(ConfigError::ArchiveRootMissing(archive_root));
        }

        let destination_root = self.destination_root()?;
        Ok((archive_root, destination_root))
    }

    /// The destination root alone, checked to exist. Undo needs nothing else.
    pub fn destination_root(&self) -> Result<PathBuf, ConfigError> {
        let destination_root = self
            .destination_root
            .clone()
            .ok_or(ConfigError::RootNotConfigured("destination root"))?;
        if !destination_root.is_dir() {
            return Err(ConfigError::DestinationRootMissing(destination_root));
        }
        Ok(destination_root)
    }
}

/// Rules for files that are never migrated or counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreRules {
    /// Exact file names (e.g. ".DS_Store").
    pub filenames: Vec<String>,
    /// Name prefixes (e.g. "~$" for Office lock files).
    pub prefixes: Vec<String>,
    /// Glob patterns matched against the path relative to the archive root.
    pub patterns: Vec<String>,
    /// Regex patterns matched against the file name.
    pub regex: Vec<String>,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self {
            filenames: [".DS_Store", "Icon\r", "Icon", ".dropbox"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            prefixes: vec!["~$".to_string(), "._".to_string()],
            patterns: Vec::new(),
            regex: Vec::new(),
        }
    }
}

impl IgnoreRules {
    /// Compiles the rules for matching.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile(&self) -> Result<IgnoreFilter, ConfigError> {
        let patterns = self
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let regexes = self
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut filenames: HashSet<String> = self.filenames.iter().cloned().collect();
        filenames.insert(MoveJournal::FILE_NAME.to_string());

        Ok(IgnoreFilter {
            filenames,
            prefixes: self.prefixes.clone(),
            patterns,
            regexes,
        })
    }
}

/// Compiled [`IgnoreRules`].
#[derive(Debug, Clone)]
pub struct IgnoreFilter {
    filenames: HashSet<String>,
    prefixes: Vec<String>,
    patterns: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl IgnoreFilter {
    /// True if the entry at `relative_path` (relative to the archive root)
    /// should be skipped.
    pub fn should_ignore(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        self.filenames.contains(file_name.as_ref())
            || self
                .prefixes
                .iter()
                .any(|prefix| file_name.starts_with(prefix.as_str()))
            || self
                .patterns
                .iter()
                .any(|pattern| pattern.matches_path(relative_path))
            || self.regexes.iter().any(|regex| regex.is_match(&file_name))
    }
}
