//! Migration planning: scan, classify and resolve duplicates.
//!
//! Planning never touches the filesystem beyond reading directory entries and
//! file contents. The result is a [`Plan`] that can be rendered as a report,
//! exported as CSV, or handed to the [`Executor`](crate::executor::Executor).

use crate::classify::Classifier;
use crate::config::{ConfigError, IgnoreFilter, MigrationConfig};
use crate::duplicates::resolve_duplicates;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// One planned relocation.
///
/// `source` is absolute; `destination` is relative to the destination root.
/// A move is never edited after planning; duplicate resolution replaces it
/// with an annotated copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub category: String,
    /// Source of the move this one collided with.
    pub duplicate_of: Option<PathBuf>,
    /// Whether the content matched `duplicate_of`.
    pub identical_content: Option<bool>,
}

impl Move {
    pub fn new(source: PathBuf, destination: PathBuf, category: impl Into<String>) -> Self {
        Self {
            source,
            destination,
            category: category.into(),
            duplicate_of: None,
            identical_content: None,
        }
    }

    /// Marks this move as colliding with `original`.
    pub fn into_duplicate(self, original: PathBuf, identical: bool) -> Self {
        Self {
            duplicate_of: Some(original),
            identical_content: Some(identical),
            ..self
        }
    }

    pub fn with_destination(self, destination: PathBuf) -> Self {
        Self {
            destination,
            ..self
        }
    }

    /// Same content as an earlier move to the same destination; never executed.
    pub fn is_identical_duplicate(&self) -> bool {
        self.identical_content == Some(true)
    }

    /// Renamed because an earlier move had the same destination.
    pub fn is_disambiguated(&self) -> bool {
        self.identical_content == Some(false)
    }
}

/// The outcome of planning one or more archive folders.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub archive_root: PathBuf,
    pub destination_root: PathBuf,
    /// Classified moves after duplicate resolution, ordered by source path.
    pub moves: Vec<Move>,
    /// Files no rule accepted.
    pub unclassified: Vec<PathBuf>,
    /// Requested folders that do not exist under the archive root.
    pub missing_folders: Vec<String>,
    /// Files that could not be scanned or hashed.
    pub failures: Vec<(PathBuf, String)>,
    /// Files found, excluding ignored ones.
    pub files_considered: usize,
    /// Files a rule accepted.
    pub classified: usize,
}

impl Plan {
    /// `mv.source` relative to the archive root.
    pub fn relative_source<'a>(&self, mv: &'a Move) -> &'a Path {
        mv.source
            .strip_prefix(&self.archive_root)
            .unwrap_or(&mv.source)
    }

    /// `mv.destination` under the destination root.
    pub fn absolute_destination(&self, mv: &Move) -> PathBuf {
        self.destination_root.join(&mv.destination)
    }

    /// Moves in report order: by category, then destination.
    pub fn sorted_moves(&self) -> Vec<&Move> {
        let mut moves: Vec<&Move> = self.moves.iter().collect();
        moves.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| a.destination.cmp(&b.destination))
        });
        moves
    }

    pub fn duplicates_skipped(&self) -> usize {
        self.moves
            .iter()
            .filter(|mv| mv.is_identical_duplicate())
            .count()
    }

    pub fn duplicates_disambiguated(&self) -> usize {
        self.moves.iter().filter(|mv| mv.is_disambiguated()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Builds plans for one archive.
#[derive(Debug, Clone)]
pub struct Planner {
    archive_root: PathBuf,
    destination_root: PathBuf,
    ignore: IgnoreFilter,
    classifier: Classifier,
}

impl Planner {
    /// Creates a planner with the standard rule table.
    ///
    /// # Errors
    ///
    /// Fails if a root is unset or missing, or an ignore pattern is invalid.
    pub fn new(config: &MigrationConfig) -> Result<Self, ConfigError> {
        let (archive_root, destination_root) = config.roots()?;
        Ok(Self {
            archive_root,
            destination_root,
            ignore: config.ignore.compile()?,
            classifier: Classifier::default(),
        })
    }

    pub fn with_classifier(self, classifier: Classifier) -> Self {
        Self { classifier, ..self }
    }

    pub fn archive_root(&self) -> &Path {
        &self.archive_root
    }

    pub fn destination_root(&self) -> &Path {
        &self.destination_root
    }

    /// Plans the given top-level archive folders. Repeated names are
    /// processed once; missing folders are recorded and skipped.
    pub fn plan<S: AsRef<str>>(&self, folders: &[S]) -> Plan {
        let mut plan = Plan {
            archive_root: self.archive_root.clone(),
            destination_root: self.destination_root.clone(),
            ..Plan::default()
        };
        let mut seen = HashSet::new();
        let mut scanned: HashSet<PathBuf> = HashSet::new();
        let mut moves = Vec::new();

        for folder in folders {
            let folder: &str = folder.as_ref();
            if !seen.insert(folder) {
                continue;
            }

            let dir = self.archive_root.join(folder);
            if !dir.is_dir() {
                warn!(folder, "source folder does not exist, skipping");
                plan.missing_folders.push(folder.to_string());
                continue;
            }

            let (files, failures) = self.collect_files(&dir);
            info!(folder, files = files.len(), "scanned folder");
            plan.failures.extend(failures);

            for file in files {
                // overlapping folder requests reach the same file twice
                if !scanned.insert(file.clone()) {
                    continue;
                }
                plan.files_considered += 1;
                let relative = file.strip_prefix(&self.archive_root).unwrap_or(&file);
                match self.classifier.classify(relative) {
                    Some(hit) => {
                        let mv = Move::new(file.clone(), hit.destination, hit.category);
                        moves.push(mv);
                    }
                    None => {
                        debug!(file = %relative.display(), "no rule matched");
                        plan.unclassified.push(file);
                    }
                }
            }
        }

        moves.sort_by(|a, b| a.source.cmp(&b.source));
        plan.classified = moves.len();

        let resolution = resolve_duplicates(moves);
        plan.moves = resolution.moves;
        plan.failures.extend(resolution.failures);
        plan
    }

    /// Every non-ignored regular file under `dir`, in name order, plus the
    /// entries that could not be read.
    pub fn collect_files(&self, dir: &Path) -> (Vec<PathBuf>, Vec<(PathBuf, String)>) {
        let mut files = Vec::new();
        let mut failures = Vec::new();

        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_ignored(entry.path()));

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
                    warn!(path = %path.display(), error = %e, "cannot read entry");
                    failures.push((path, e.to_string()));
                }
            }
        }

        (files, failures)
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.archive_root).unwrap_or(path);
        self.ignore.should_ignore(relative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Rule;
    use std::fs;
    use tempfile::TempDir;

    struct Archive {
        _temp_dir: TempDir,
        config: MigrationConfig,
    }

    impl Archive {
        fn new() -> Self {
            let temp_dir = TempDir::new().expect("Failed to create temp directory");
            let archive = temp_dir.path().join("900 Arkiv");
            let destination = temp_dir.path().join("Vel");
            fs::create_dir_all(&archive).expect("Failed to create archive root");
            fs::create_dir_all(&destination).expect("Failed to create destination root");
            Self {
                config: MigrationConfig::for_roots(archive, destination),
                _temp_dir: temp_dir,
            }
        }

        fn file(&self, relative: &str, contents: &str) -> PathBuf {
            let root = self.config.archive_root.as_ref().expect("archive root");
            let path = root.join(relative);
            fs::create_dir_all(path.parent().expect("Failed to get parent"))
                .expect("Failed to create directory");
            fs::write(&path, contents).expect("Failed to write file");
            path
        }

        fn planner(&self) -> Planner {
            Planner::new(&self.config).expect("Failed to create planner")
        }
    }

    #[test]
    fn test_move_annotations() {
        let mv = Move::new(PathBuf::from("/a/x.pdf"), PathBuf::from("x.pdf"), "C");
        assert!(!mv.is_identical_duplicate() && !mv.is_disambiguated());

        let dup = mv.clone().into_duplicate(PathBuf::from("/b/x.pdf"), true);
        assert!(dup.is_identical_duplicate());
        assert_eq!(dup.source, mv.source);

        let renamed = mv
            .into_duplicate(PathBuf::from("/b/x.pdf"), false)
            .with_destination(PathBuf::from("x (a).pdf"));
        assert!(renamed.is_disambiguated());
        assert_eq!(renamed.destination, PathBuf::from("x (a).pdf"));
    }

    #[test]
    fn test_planner_requires_roots() {
        assert!(Planner::new(&MigrationConfig::default()).is_err());
    }

    #[test]
    fn test_plan_classifies_and_counts() {
        let archive = Archive::new();
        archive.file("Referat/styrereferat 04.11.2025.docx", "a");
        archive.file("Referat/Kart.jpg", "b");
        archive.file("Referat/.DS_Store", "c");
        archive.file("Referat/~$yrereferat.docx", "d");

        let plan = archive.planner().plan(&["Referat"]);

        assert_eq!(plan.files_considered, 2);
        assert_eq!(plan.classified, 1);
        assert_eq!(plan.unclassified.len(), 1);
        assert_eq!(plan.moves.len(), 1);
        assert_eq!(
            plan.relative_source(&plan.moves[0]),
            Path::new("Referat/styrereferat 04.11.2025.docx")
        );
        assert!(plan.failures.is_empty());
    }

    #[test]
    fn test_missing_folder_is_recorded() {
        let archive = Archive::new();
        archive.file("Referat/Styrereferat 2024.pdf", "a");

        let plan = archive.planner().plan(&["Referat", "Finnes ikke", "Referat"]);

        assert_eq!(plan.missing_folders, vec!["Finnes ikke"]);
        assert_eq!(plan.files_considered, 1);
        assert_eq!(plan.moves.len(), 1);
    }

    #[test]
    fn test_overlapping_folders_scan_each_file_once() {
        let archive = Archive::new();
        archive.file("Referat/Sub/Styrereferat 2024.pdf", "a");

        let plan = archive.planner().plan(&["Referat", "Referat/Sub"]);

        assert_eq!(plan.files_considered, 1);
        assert_eq!(plan.moves.len(), 1);
        assert_eq!(plan.duplicates_skipped(), 0);
    }

    #[test]
    fn test_ignored_directories_are_not_descended() {
        let mut archive = Archive::new();
        archive.config.ignore.patterns = vec!["**/Gammelt".to_string()];
        archive.file("Referat/Gammelt/Styrereferat 2019.pdf", "a");
        archive.file("Referat/Styrereferat 2020.pdf", "b");

        let plan = archive.planner().plan(&["Referat"]);
        assert_eq!(plan.files_considered, 1);
    }

    #[test]
    fn test_first_source_in_path_order_is_original() {
        let archive = Archive::new();
        archive.file("Referat/B/Styrereferat 2024.pdf", "same");
        archive.file("Referat/A/Styrereferat 2024.pdf", "same");

        let plan = archive.planner().plan(&["Referat"]);

        assert_eq!(plan.moves.len(), 2);
        assert!(plan.moves[0].source.ends_with("A/Styrereferat 2024.pdf"));
        assert!(plan.moves[1].is_identical_duplicate());
        assert_eq!(plan.duplicates_skipped(), 1);
        assert_eq!(plan.duplicates_disambiguated(), 0);
    }

    #[test]
    fn test_sorted_moves_by_category_then_destination() {
        let archive = Archive::new();
        archive.file("Referat/Styrereferat 2024.pdf", "a");
        archive.file("Referat/Medlemsmøte 2022.pdf", "b");
        archive.file("Referat/Medlemsmøte 2021.pdf", "c");

        let plan = archive.planner().plan(&["Referat"]);
        let order: Vec<_> = plan
            .sorted_moves()
            .iter()
            .map(|mv| mv.category.as_str())
            .collect();
        assert_eq!(order, vec!["Medlemsmøte", "Medlemsmøte", "Styrereferat"]);
        assert!(plan.sorted_moves()[0]
            .destination
            .starts_with("010 Generalforsamling/2021 Generalforsamling"));
    }

    #[test]
    fn test_custom_classifier() {
        let archive = Archive::new();
        archive.file("Diverse/Kart.jpg", "a");

        let everything = Rule::new("all", "Alt", |_| true, |ctx| {
            Some(PathBuf::from("999 Alt").join(&ctx.file_name))
        });
        let plan = archive
            .planner()
            .with_classifier(Classifier::new(vec![everything]))
            .plan(&["Diverse"]);

        assert_eq!(plan.moves.len(), 1);
        assert_eq!(
            plan.absolute_destination(&plan.moves[0]),
            plan.destination_root.join("999 Alt/Kart.jpg")
        );
    }
}
