//! File name normalization.
//!
//! Every destination file name passes through [`normalize_file_name`]:
//! invisible characters are dropped, a date found in the name is moved to the
//! front as a `YYYY-MM-DD` (or `YYYY`) prefix, and names written mostly in
//! capitals are rewritten to sentence case. Normalizing twice is a no-op.
//!
//! ```
//! use archsort::normalize::normalize_file_name;
//!
//! assert_eq!(
//!     normalize_file_name("STYRETS ÅRSBERETNING 2023.pdf"),
//!     "2023 Styrets årsberetning 2023.pdf"
//! );
//! ```

use crate::dates::{DateMatch, extract_date};
use regex::Regex;
use std::sync::LazyLock;

/// Zero-width and other invisible characters that sneak into names copied
/// from documents.
const INVISIBLE: [char; 5] = ['\u{2060}', '\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'];

/// Share of uppercase letters above which a name counts as "shouting".
pub const UPPERCASE_THRESHOLD: f64 = 0.7;

static DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}(?:-[0-9]{2}){0,2}\s+").expect("valid regex"));
static PREFIX_AND_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^([0-9]{4}(?:-[0-9]{2}){0,2}\s+)?(.+)$").expect("valid regex")
});

/// Normalizes a file name for its destination.
pub fn normalize_file_name(name: &str) -> String {
    let visible: String = name.chars().filter(|c| !INVISIBLE.contains(c)).collect();
    let dated = prefix_date(visible.trim());

    let (stem, extension) = split_extension(&dated);
    join_extension(&sentence_case_if_shouting(stem), extension)
}

/// Moves a date found in the name to the front.
///
/// A name that already starts with a date keeps it (with separators
/// rewritten to `-`); a name that already starts with a year is unchanged.
pub fn prefix_date(name: &str) -> String {
    let (stem, extension) = split_extension(name);

    let stem = match extract_date(stem) {
        Some(DateMatch::LeadingDate { date, rest }) => format!("{date}{rest}"),
        Some(DateMatch::Embedded(stamp)) => format!("{stamp} {stem}"),
        Some(DateMatch::LeadingYear(_)) | None => stem.to_string(),
    };

    join_extension(&stem, extension)
}

/// Splits at the last `.`; the extension excludes the dot.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, extension)) => (stem, Some(extension)),
        None => (name, None),
    }
}

fn join_extension(stem: &str, extension: Option<&str>) -> String {
    match extension {
        Some(extension) if !extension.is_empty() => format!("{stem}.{extension}"),
        _ => stem.to_string(),
    }
}

/// Rewrites the text after any date prefix to sentence case when more than
/// [`UPPERCASE_THRESHOLD`] of its letters are uppercase.
fn sentence_case_if_shouting(stem: &str) -> String {
    let text = DATE_PREFIX.replace(stem, "");
    if !is_mostly_uppercase(&text) {
        return stem.to_string();
    }

    match PREFIX_AND_TEXT.captures(stem) {
        Some(caps) => {
            let prefix = caps.get(1).map_or("", |m| m.as_str());
            format!("{prefix}{}", sentence_case(&caps[2]))
        }
        None => stem.to_string(),
    }
}

/// Fraction of alphabetic characters that are uppercase, or `None` when the
/// text has no letters.
pub fn uppercase_ratio(text: &str) -> Option<f64> {
    let (letters, upper) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(letters, upper), c| {
            (letters + 1, upper + usize::from(c.is_uppercase()))
        });

    (letters > 0).then(|| upper as f64 / letters as f64)
}

fn is_mostly_uppercase(text: &str) -> bool {
    uppercase_ratio(text).is_some_and(|ratio| ratio > UPPERCASE_THRESHOLD)
}

/// First character uppercased, everything else lowercased.
pub fn sentence_case(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
