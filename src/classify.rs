//! Rule-based classification of archive files into the taxonomy.
//!
//! Classification is a declarative, ordered table of [`Rule`]s. Each rule is
//! a predicate over a [`FileContext`] plus a destination builder and a
//! category label; the first rule whose predicate holds *and* whose builder
//! produces a destination wins. A builder may decline (for example when a
//! year-aware rule finds no year), in which case evaluation continues with
//! the next rule. Files no rule accepts stay unclassified.
//!
//! Order matters: several predicates overlap, so more specific rules sit
//! before general ones.
//!
//! # Examples
//!
//! ```
//! use archsort::classify::Classifier;
//! use std::path::{Path, PathBuf};
//!
//! let classifier = Classifier::default();
//! let hit = classifier
//!     .classify(Path::new("Referat/styrereferat 04.11.2025.docx"))
//!     .unwrap();
//! assert_eq!(hit.category, "Styrereferat");
//! assert_eq!(
//!     hit.destination,
//!     PathBuf::from("021 Styremøter/2025-11-04 Styremøte 4. november 2025/2025-11-04 styrereferat 04.11.2025.docx")
//! );
//! ```

use crate::dates::{self, MeetingDate};
use crate::normalize::normalize_file_name;
use crate::taxonomy::{self, Folder};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

/// Extensions the accounts/budget rule accepts.
const FINANCIAL_EXTENSIONS: [&str; 5] = ["xlsx", "xls", "pdf", "docx", "doc"];

/// Everything a rule may look at for one file.
///
/// Names are converted to Unicode NFC, since some filesystems hand out
/// decomposed names. `raw_segments` keeps the path as found on disk for
/// rules that preserve the source folder structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContext {
    /// File name, NFC.
    pub file_name: String,
    /// Lowercased `file_name`.
    pub name_lower: String,
    /// First segment of the path relative to the archive root, NFC.
    pub top_folder: String,
    /// Folders between `top_folder` and the file, NFC.
    pub subfolders: Vec<String>,
    /// All path segments, unmodified.
    pub raw_segments: Vec<String>,
    /// Lowercased extension without the dot.
    pub extension: Option<String>,
}

fn nfc(text: &str) -> String {
    text.nfc().collect()
}

impl FileContext {
    /// Builds the context for a path relative to the archive root.
    pub fn new(relative_path: &Path) -> Self {
        let raw_segments: Vec<String> = relative_path
            .iter()
            .map(|segment| segment.to_string_lossy().into_owned())
            .collect();

        let file_name = raw_segments.last().map(|s| nfc(s)).unwrap_or_default();
        let top_folder = raw_segments.first().map(|s| nfc(s)).unwrap_or_default();
        let subfolders = match raw_segments.len() {
            0..=2 => Vec::new(),
            len => raw_segments[1..len - 1].iter().map(|s| nfc(s)).collect(),
        };
        let extension = Path::new(&file_name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase());

        Self {
            name_lower: file_name.to_lowercase(),
            file_name,
            top_folder,
            subfolders,
            raw_segments,
            extension,
        }
    }

    /// True if the lowercased file name contains any of `needles`.
    pub fn name_contains_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|needle| self.name_lower.contains(needle))
    }

    /// True if the lowercased top folder contains `needle`.
    pub fn top_folder_contains(&self, needle: &str) -> bool {
        self.top_folder.to_lowercase().contains(needle)
    }

    /// First `20xx` year in the subfolders, then the top folder, then the
    /// file name.
    pub fn context_year(&self) -> Option<u32> {
        self.subfolders
            .iter()
            .map(String::as_str)
            .chain([self.top_folder.as_str(), self.file_name.as_str()])
            .find_map(dates::find_year)
    }

    /// First `20xx` year in the file name alone.
    pub fn name_year(&self) -> Option<u32> {
        dates::find_year(&self.file_name)
    }

    /// The raw folders between the top folder and the file, as a path.
    pub fn preserved_subpath(&self) -> PathBuf {
        match self.raw_segments.len() {
            0..=2 => PathBuf::new(),
            len => self.raw_segments[1..len - 1].iter().collect(),
        }
    }

    /// The full relative path, lowercased.
    pub fn path_lower(&self) -> String {
        self.raw_segments.join("/").to_lowercase()
    }

    /// The normalized destination file name.
    pub fn normalized_name(&self) -> String {
        normalize_file_name(&self.file_name)
    }
}

/// Decides whether a rule applies to a file.
pub type Predicate = fn(&FileContext) -> bool;

/// Builds the destination, relative to the destination root. `None` means
/// the rule declines and classification moves on.
pub type DestinationBuilder = fn(&FileContext) -> Option<PathBuf>;

/// One entry of the classification table.
#[derive(Clone, Copy)]
pub struct Rule {
    /// Short identifier used in logs.
    pub name: &'static str,
    /// Category label for reporting.
    pub category: &'static str,
    pub predicate: Predicate,
    pub destination: DestinationBuilder,
}

impl Rule {
    pub const fn new(
        name: &'static str,
        category: &'static str,
        predicate: Predicate,
        destination: DestinationBuilder,
    ) -> Self {
        Self {
            name,
            category,
            predicate,
            destination,
        }
    }

    /// Applies this rule alone to a file.
    pub fn apply(&self, context: &FileContext) -> Option<Classification> {
        if !(self.predicate)(context) {
            return None;
        }
        (self.destination)(context).map(|destination| Classification {
            destination,
            category: self.category,
        })
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

/// Where a file goes and under which category it is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Destination path relative to the destination root.
    pub destination: PathBuf,
    pub category: &'static str,
}

/// Evaluates an ordered rule table.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Classifier {
    /// Creates a classifier over `rules`, evaluated in the given order.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Classifies a file by its path relative to the archive root.
    pub fn classify(&self, relative_path: &Path) -> Option<Classification> {
        self.classify_context(&FileContext::new(relative_path))
    }

    pub fn classify_context(&self, context: &FileContext) -> Option<Classification> {
        self.rules.iter().find_map(|rule| {
            let hit = rule.apply(context)?;
            debug!(rule = rule.name, file = %context.file_name, "rule matched");
            Some(hit)
        })
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(standard_rules())
    }
}

/// The archive's routing table, most specific rules first.
pub fn standard_rules() -> Vec<Rule> {
    vec![
        Rule::new("vat-refund", "MVA-refusjon", is_vat_refund, |ctx| {
            Some(preserving(Folder::VatRefund, ctx))
        }),
        Rule::new(
            "board-minutes",
            "Styrereferat",
            is_board_minutes,
            into_board_meeting,
        ),
        Rule::new(
            "general-assembly",
            "Generalforsamling",
            is_general_assembly,
            into_assembly_of_context_year,
        ),
        Rule::new(
            "member-meeting",
            "Medlemsmøte",
            |ctx| ctx.name_contains_any(&["medlemsmøte"]),
            into_assembly_of_context_year,
        ),
        Rule::new(
            "assembly-notice",
            "Innkalling GF",
            |ctx| ctx.name_contains_any(&["innkalling"]) && ctx.name_contains_any(&["general"]),
            into_assembly_of_context_year,
        ),
        Rule::new(
            "annual-report",
            "Årsberetning",
            |ctx| ctx.name_contains_any(&["årsberetning"]),
            into_following_assembly,
        ),
        Rule::new("joint-board", "Fellesstyret", is_joint_board, into_joint_board),
        Rule::new(
            "assembly-attachment",
            "GF-vedlegg",
            |ctx| ctx.name_contains_any(&["saksliste", "valgkomite"]),
            into_assembly_of_context_year,
        ),
        Rule::new(
            "extraordinary-assembly",
            "Ekstraordinær GF",
            |ctx| ctx.top_folder_contains("ekstraordinær") || ctx.name_contains_any(&["ex.ord"]),
            into_extraordinary_assembly,
        ),
        Rule::new(
            "state-property",
            "Statsbygg",
            |ctx| {
                ctx.name_contains_any(&["statsbygg"])
                    && ctx.name_contains_any(&["referat", "rapport"])
            },
            |ctx| Some(flat(Folder::StateProperty, ctx)),
        ),
        Rule::new(
            "statutes-history",
            "Vedtekter (historikk)",
            |ctx| is_statutes(ctx) && is_historical(ctx),
            |ctx| {
                Some(
                    Folder::Statutes
                        .path()
                        .join(taxonomy::STATUTES_HISTORY)
                        .join(ctx.normalized_name()),
                )
            },
        ),
        Rule::new(
            "statutes",
            "Vedtekter",
            is_statutes,
            |ctx| Some(flat(Folder::Statutes, ctx)),
        ),
        Rule::new(
            "accounts",
            "Regnskap/Budsjett",
            is_financial_statement,
            into_following_assembly,
        ),
        Rule::new(
            "spring-letter",
            "Vårbrev",
            |ctx| ctx.name_contains_any(&["vårbrev"]),
            |ctx| ctx.name_year().map(|_| flat(Folder::MemberLetters, ctx)),
        ),
        Rule::new(
            "agreements",
            "Avtaler",
            |ctx| ctx.name_lower.starts_with("avtale ") || ctx.name_lower.starts_with("kontrakt "),
            |ctx| Some(flat(Folder::Agreements, ctx)),
        ),
        Rule::new(
            "instructions",
            "Instrukser",
            |ctx| ctx.name_lower.starts_with("instruks "),
            |ctx| Some(flat(Folder::Agreements, ctx)),
        ),
        Rule::new(
            "land-redemption",
            "Tomteinnløsning",
            |ctx| ctx.top_folder == "Tomteinnløsning",
            |ctx| Some(preserving(Folder::LandRedemption, ctx)),
        ),
        Rule::new(
            "illegal-construction",
            "Ulovlighetsoppfølging",
            |ctx| ctx.top_folder_contains("ulovlighetsoppfølging"),
            |ctx| Some(preserving(Folder::IllegalConstruction, ctx)),
        ),
        Rule::new(
            "waste-collection",
            "Renovasjon",
            |ctx| ctx.top_folder == "Renovasjon",
            |ctx| Some(flat(Folder::WasteCollection, ctx)),
        ),
        Rule::new(
            "stewardship-rules",
            "Skjøtsel (regler)",
            |ctx| {
                ctx.top_folder_contains("skjøtsel")
                    && ctx.name_contains_any(&["regler", "instruks", "flytdiagram", "sjekkliste"])
            },
            |ctx| Some(flat(Folder::Agreements, ctx)),
        ),
        Rule::new(
            "stewardship",
            "Skjøtsel",
            |ctx| ctx.top_folder_contains("skjøtsel"),
            |ctx| Some(flat(Folder::Stewardship, ctx)),
        ),
        Rule::new(
            "caretaker-cabin",
            "Vaktmesterhytta",
            |ctx| ctx.top_folder_contains("anbud") && ctx.path_lower().contains("vaktmester"),
            |ctx| Some(preserving(Folder::CaretakerCabin, ctx)),
        ),
    ]
}

/// `<folder>/<normalized name>`.
fn flat(folder: Folder, ctx: &FileContext) -> PathBuf {
    folder.path().join(ctx.normalized_name())
}

/// `<folder>/<source subfolders>/<normalized name>`.
fn preserving(folder: Folder, ctx: &FileContext) -> PathBuf {
    folder
        .path()
        .join(ctx.preserved_subpath())
        .join(ctx.normalized_name())
}

fn is_vat_refund(ctx: &FileContext) -> bool {
    ctx.top_folder_contains("mva") || ctx.top_folder_contains("frivillighetsregister")
}

fn is_board_minutes(ctx: &FileContext) -> bool {
    ctx.name_contains_any(&["styrereferat", "referat styremøte"])
}

/// One folder per dated meeting, or the unsorted folder without a date.
fn into_board_meeting(ctx: &FileContext) -> Option<PathBuf> {
    let meeting = match MeetingDate::from_file_name(&ctx.file_name) {
        Some(date) => format!("{} Styremøte {}", date.iso(), date.long_form()),
        None => taxonomy::UNSORTED_MEETINGS.to_string(),
    };
    Some(
        Folder::BoardMeetings
            .path()
            .join(meeting)
            .join(ctx.normalized_name()),
    )
}

fn is_general_assembly(ctx: &FileContext) -> bool {
    ctx.name_contains_any(&["generalforsamling", "protokoll gf", "protokoll fra gf"])
}

fn into_assembly_of_context_year(ctx: &FileContext) -> Option<PathBuf> {
    let year = ctx.context_year()?;
    Some(Folder::assembly_year(year).join(ctx.normalized_name()))
}

/// Reports and accounts for year X are presented at the assembly in X+1.
fn into_following_assembly(ctx: &FileContext) -> Option<PathBuf> {
    let year = ctx.name_year()?;
    Some(Folder::assembly_year(year + 1).join(ctx.normalized_name()))
}

fn is_joint_board(ctx: &FileContext) -> bool {
    ctx.name_contains_any(&["fellesstyret", "fellestyret"]) || ctx.top_folder_contains("fellesstyret")
}

/// Keeps the first subfolder when the file comes from the joint board's own
/// archive folder.
fn into_joint_board(ctx: &FileContext) -> Option<PathBuf> {
    let base = Folder::JointBoard.path();
    if ctx.top_folder_contains("fellesstyret")
        && let Some(subfolder) = ctx.subfolders.first()
    {
        return Some(base.join(subfolder).join(ctx.normalized_name()));
    }
    Some(base.join(ctx.normalized_name()))
}

fn into_extraordinary_assembly(ctx: &FileContext) -> Option<PathBuf> {
    let year = ctx.context_year()?;
    Some(
        Folder::assembly_year(year)
            .join(taxonomy::EXTRAORDINARY_ASSEMBLY)
            .join(ctx.normalized_name()),
    )
}

fn is_statutes(ctx: &FileContext) -> bool {
    ctx.name_contains_any(&["vedtekter"])
}

/// Dated, revised or otherwise superseded statutes.
fn is_historical(ctx: &FileContext) -> bool {
    ctx.name_year().is_some() || ctx.name_contains_any(&["revidert", "gammel", "utgått", "tidligere"])
}

fn is_financial_statement(ctx: &FileContext) -> bool {
    ctx.name_contains_any(&["regnskap", "budsjett"])
        && ctx
            .extension
            .as_deref()
            .is_some_and(|ext| FINANCIAL_EXTENSIONS.contains(&ext))
}
