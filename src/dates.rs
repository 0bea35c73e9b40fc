//! Date and year detection inside archive file names.
//!
//! Archive file names carry dates in several competing formats. The
//! extractor tries them in a fixed priority order and the first valid hit wins:
//!
//! 1. a leading `YYYY-MM-DD` (dash or space separated)
//! 2. a leading bare year followed by whitespace
//! 3. an isolated 8-digit `YYYYMMDD` run
//! 4. `D.M.Y` with a two- or four-digit year
//! 5. `YYYY-MM-DD` anywhere in the name
//! 6. a bare year in 2000..=2030 that is not one end of a `YYYY-YYYY` range
//!
//! # Examples
//!
//! ```
//! use archsort::dates::{extract_date, DateStamp};
//!
//! let found = extract_date("Referat 20180528").map(|m| m.stamp());
//! assert_eq!(found, Some(DateStamp::Date("2018-05-28".to_string())));
//! assert_eq!(extract_date("Årsmøte 2017-2018 plan"), None);
//! ```

use regex::Regex;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

/// Years accepted when a bare four-digit number is the only date hint.
pub const YEAR_RANGE: RangeInclusive<u32> = 2000..=2030;

const MONTH_NAMES: [&str; 12] = [
    "januar",
    "februar",
    "mars",
    "april",
    "mai",
    "juni",
    "juli",
    "august",
    "september",
    "oktober",
    "november",
    "desember",
];

static LEADING_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^([0-9]{4})[-\s]([0-9]{2})[-\s]([0-9]{2})(.*)$").expect("valid regex")
});
static LEADING_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}\s").expect("valid regex"));
static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));
static DAY_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{1,2})\.([0-9]{1,2})\.([0-9]{2,4})").expect("valid regex")
});
static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{4})-([0-9]{2})-([0-9]{2})").expect("valid regex"));
static MEETING_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{4})[-\s_]?([0-9]{2})[-\s_]?([0-9]{2})").expect("valid regex")
});
static YEAR_LIKE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"20[0-9]{2}").expect("valid regex"));

/// A date or year found in a file name, in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateStamp {
    /// Full calendar date, `YYYY-MM-DD`.
    Date(String),
    /// Bare year, `YYYY`.
    Year(String),
}

impl DateStamp {
    pub fn as_str(&self) -> &str {
        match self {
            DateStamp::Date(value) | DateStamp::Year(value) => value,
        }
    }
}

impl fmt::Display for DateStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where in the stem a date was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateMatch<'a> {
    /// The stem already opens with a full date. `date` has its separators
    /// rewritten to `-`; `rest` is everything after the date.
    LeadingDate { date: String, rest: &'a str },
    /// The stem already opens with a bare year followed by whitespace.
    LeadingYear(&'a str),
    /// A date found somewhere inside the stem.
    Embedded(DateStamp),
}

impl DateMatch<'_> {
    /// Returns the canonical date or year regardless of position.
    pub fn stamp(&self) -> DateStamp {
        match self {
            DateMatch::LeadingDate { date, .. } => DateStamp::Date(date.clone()),
            DateMatch::LeadingYear(year) => DateStamp::Year((*year).to_string()),
            DateMatch::Embedded(stamp) => stamp.clone(),
        }
    }

    /// True if the stem already starts with this date.
    pub fn is_leading(&self) -> bool {
        !matches!(self, DateMatch::Embedded(_))
    }
}

/// Finds a date or year in a file name stem (the name without extension).
///
/// Returns `None` when no pattern qualifies. Year ranges such as
/// `2017-2018` never yield a year.
pub fn extract_date(stem: &str) -> Option<DateMatch<'_>> {
    if let Some(caps) = LEADING_DATE.captures(stem) {
        let rest = caps.get(4).map_or("", |m| m.as_str());
        let date = format!("{}-{}-{}", &caps[1], &caps[2], &caps[3]);
        return Some(DateMatch::LeadingDate { date, rest });
    }

    if LEADING_YEAR.is_match(stem) {
        return Some(DateMatch::LeadingYear(&stem[..4]));
    }

    compact_date(stem)
        .or_else(|| day_month_year(stem))
        .or_else(|| iso_date(stem))
        .map(DateStamp::Date)
        .or_else(|| standalone_year(stem).map(DateStamp::Year))
        .map(DateMatch::Embedded)
}

/// Returns the first `20xx` number in `text`, without any boundary checks.
///
/// Year-aware classification rules use this looser search on folder and
/// file names.
pub fn find_year(text: &str) -> Option<u32> {
    YEAR_LIKE.find(text).and_then(|m| m.as_str().parse().ok())
}

fn valid_month_day(month: &str, day: &str) -> bool {
    matches!(month.parse::<u32>(), Ok(1..=12)) && matches!(day.parse::<u32>(), Ok(1..=31))
}

fn expand_year(year: &str) -> Option<String> {
    match year.len() {
        2 => Some(format!("20{year}")),
        4 => Some(year.to_string()),
        _ => None,
    }
}

/// First isolated 8-digit run, read as `YYYYMMDD`.
fn compact_date(stem: &str) -> Option<String> {
    let run = DIGIT_RUN.find_iter(stem).find(|m| m.as_str().len() == 8)?;
    let digits = run.as_str();
    let (year, month, day) = (&digits[..4], &digits[4..6], &digits[6..]);
    valid_month_day(month, day).then(|| format!("{year}-{month}-{day}"))
}

fn day_month_year(stem: &str) -> Option<String> {
    let caps = DAY_MONTH_YEAR.captures(stem)?;
    let (day, month) = (&caps[1], &caps[2]);
    let year = expand_year(&caps[3])?;
    valid_month_day(month, day).then(|| format!("{year}-{month:0>2}-{day:0>2}"))
}

fn iso_date(stem: &str) -> Option<String> {
    let caps = ISO_DATE.captures(stem)?;
    let (year, month, day) = (&caps[1], &caps[2], &caps[3]);
    valid_month_day(month, day).then(|| format!("{year}-{month}-{day}"))
}

fn standalone_year(stem: &str) -> Option<String> {
    let bytes = stem.as_bytes();
    DIGIT_RUN
        .find_iter(stem)
        .filter(|m| m.as_str().len() == 4)
        .filter(|m| {
            m.as_str()
                .parse::<u32>()
                .is_ok_and(|year| YEAR_RANGE.contains(&year))
        })
        .find(|m| !is_range_endpoint(bytes, m.start(), m.end()))
        .map(|m| m.as_str().to_string())
}

/// True if the four digits at `start..end` are joined by `-` to another
/// four-digit year on either side.
fn is_range_endpoint(bytes: &[u8], start: usize, end: usize) -> bool {
    let four_digits = |s: &[u8]| s.len() == 4 && s.iter().all(u8::is_ascii_digit);

    let closes_range =
        start >= 5 && bytes[start - 1] == b'-' && four_digits(&bytes[start - 5..start - 1]);
    let opens_range =
        bytes.get(end) == Some(&b'-') && bytes.get(end + 1..end + 5).is_some_and(four_digits);

    closes_range || opens_range
}

/// The date of a board meeting, read from a minutes file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeetingDate {
    pub year: u32,
    pub month: u32,
    pub day: u32,
}

impl MeetingDate {
    /// Reads `YYYY[-_ ]MM[-_ ]DD` (separators optional) or `D.M.Y`.
    ///
    /// The first pattern that appears decides; a month outside 1..=12 or a
    /// day outside 1..=31 yields `None` rather than trying the next pattern.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (year, month, day): (u32, u32, u32) = if let Some(caps) = MEETING_DATE.captures(name) {
            (
                caps[1].parse().ok()?,
                caps[2].parse().ok()?,
                caps[3].parse().ok()?,
            )
        } else {
            let caps = DAY_MONTH_YEAR.captures(name)?;
            (
                expand_year(&caps[3])?.parse().ok()?,
                caps[2].parse().ok()?,
                caps[1].parse().ok()?,
            )
        };

        ((1..=12).contains(&month) && (1..=31).contains(&day)).then_some(Self { year, month, day })
    }

    /// `YYYY-MM-DD`.
    pub fn iso(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }

    /// Spelled-out form, e.g. `4. november 2025`.
    pub fn long_form(&self) -> String {
        let month = MONTH_NAMES[(self.month - 1) as usize];
        format!("{}. {} {}", self.day, month, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp(stem: &str) -> Option<String> {
        extract_date(stem).map(|m| m.stamp().to_string())
    }

    #[test]
    fn test_priority_table() {
        let cases = [
            ("2018-05-28 Referat", Some("2018-05-28")),
            ("2018 05 28 Referat", Some("2018-05-28")),
            ("2019 Budsjett", Some("2019")),
            ("Referat 20180528", Some("2018-05-28")),
            ("styrereferat 04.11.2025", Some("2025-11-04")),
            ("Referat 4.3.19", Some("2019-03-04")),
            ("Notat 2021-06-30 endelig", Some("2021-06-30")),
            ("Vedtekter 2015", Some("2015")),
            ("Årsmøte 2017-2018 plan", None),
            ("Kontrakt", None),
        ];

        for (stem, expected) in cases {
            assert_eq!(stamp(stem).as_deref(), expected, "stem: {stem}");
        }
    }

    #[test]
    fn test_leading_date_stops_search() {
        let found = extract_date("2020 01 15 Møte 20190101").expect("date expected");
        assert!(found.is_leading());
        assert_eq!(
            found,
            DateMatch::LeadingDate {
                date: "2020-01-15".to_string(),
                rest: " Møte 20190101",
            }
        );
    }

    #[test]
    fn test_leading_year_kept_as_is() {
        assert_eq!(
            extract_date("2016 Anbud 20160301"),
            Some(DateMatch::LeadingYear("2016"))
        );
    }

    #[test]
    fn test_compact_date_must_be_isolated() {
        // nine digits is not a date
        assert_eq!(stamp("Faktura 201805281"), None);
        assert_eq!(stamp("Faktura 201805281 og 2019"), Some("2019".to_string()));
    }

    #[test]
    fn test_invalid_month_falls_through_to_next_pattern() {
        // 20181328 has month 13; the trailing year is still found
        assert_eq!(stamp("Skjema 20181328 rev 2020"), Some("2020".to_string()));
        assert_eq!(stamp("Skjema 32.01.2020"), Some("2020".to_string()));
    }

    #[test]
    fn test_year_out_of_range_is_ignored() {
        assert_eq!(stamp("Kart 1998"), None);
        assert_eq!(stamp("Plan 2031"), None);
        assert_eq!(stamp("Kart 1998 rev 2004"), Some("2004".to_string()));
    }

    #[test]
    fn test_range_exclusion_only_affects_range_endpoints() {
        assert_eq!(stamp("Plan 2017-2018 og 2020"), Some("2020".to_string()));
        assert_eq!(stamp("2017-2018"), None);
        // a year followed by a short number is not a range
        assert_eq!(stamp("Sak 2019-05"), Some("2019".to_string()));
    }

    #[test]
    fn test_find_year_searches_loosely() {
        assert_eq!(find_year("GF 2018"), Some(2018));
        assert_eq!(find_year("Protokoll20191"), Some(2019));
        assert_eq!(find_year("Generalforsamling"), None);
    }

    #[test]
    fn test_meeting_date_formats() {
        assert_eq!(
            MeetingDate::from_file_name("styrereferat 04.11.2025.docx"),
            Some(MeetingDate {
                year: 2025,
                month: 11,
                day: 4
            })
        );
        assert_eq!(
            MeetingDate::from_file_name("Referat styremøte 2019_03_12.pdf"),
            Some(MeetingDate {
                year: 2019,
                month: 3,
                day: 12
            })
        );
        assert_eq!(
            MeetingDate::from_file_name("Styrereferat 5.6.18.pdf").map(|d| d.iso()),
            Some("2018-06-05".to_string())
        );
        assert_eq!(MeetingDate::from_file_name("Styrereferat 2024.pdf"), None);
        assert_eq!(MeetingDate::from_file_name("Styrereferat 20241312.pdf"), None);
    }

    #[test]
    fn test_meeting_date_long_form() {
        let date = MeetingDate {
            year: 2025,
            month: 11,
            day: 4,
        };
        assert_eq!(date.iso(), "2025-11-04");
        assert_eq!(date.long_form(), "4. november 2025");
    }
}
