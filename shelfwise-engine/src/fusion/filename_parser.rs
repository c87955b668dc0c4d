//! Filename-derived metadata estimation
//!
//! Infers author, series, title and series number from a relative path.
//!
//! # Filename decomposition
//! Patterns are tried in order; the first match wins:
//! 1. Leading (optionally zero-padded) number + separator + title (`01 - Prologue`)
//! 2. `Book N` / `Vol N` + separator + title (`Book 3 - The Return`)
//! 3. Title + trailing number (`Chapter 12`)
//! 4. Title + `#N` (`Foundation #2`)
//!
//! Unmatched stems become a title-only estimate without a series number.
//!
//! # Confidence
//! - Base 0.3
//! - +0.2 for an `Authors/<author>/<series>` directory shape
//! - otherwise +0.1 for a plausible author-looking parent directory
//! - +0.1 when a numbered pattern was parsed from the filename

use crate::types::{MetadataEstimate, Provenance};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

const BASE_CONFIDENCE: f32 = 0.3;
const AUTHORS_TREE_BONUS: f32 = 0.2;
const AUTHOR_PARENT_BONUS: f32 = 0.1;
const NUMBERED_BONUS: f32 = 0.1;

/// Directory segment that roots an `Authors/<author>/<series>` tree
pub const AUTHORS_SEGMENT: &str = "Authors";

/// Directory segment that roots a `Series/<series>` tree
pub const SERIES_SEGMENT: &str = "Series";

static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)(?:\s*[-_.]\s*|\s+)(\S.*)$").expect("valid regex"));
static BOOK_OR_VOLUME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:book|vol(?:ume)?\.?)\s*(\d+)(?:\s*[-_:.]\s*|\s+)(\S.*)$")
        .expect("valid regex")
});
static TRAILING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?\S)[\s_-]+(\d+)$").expect("valid regex"));
static HASH_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?\S)\s*#(\d+)$").expect("valid regex"));

static FIRST_LAST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z][\w.'\-]*(?:\s+[A-Z][\w.'\-]*){1,2}$").expect("valid regex")
});
static LAST_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z][\w'\-]*,\s*[A-Z][\w.'\-]*(?:\s+[A-Z][\w.'\-]*)?$").expect("valid regex")
});
static TWO_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s\d]+\s+[^\s\d]+$").expect("valid regex"));

/// Which filename pattern matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenamePattern {
    LeadingNumber,
    BookOrVolume,
    TrailingNumber,
    HashNumber,
}

/// Result of decomposing a filename stem
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFilename {
    pub parsed_title: String,
    pub series_number: Option<u32>,
    pub pattern: Option<FilenamePattern>,
}

/// Decompose a filename (with or without extension) into title and number
pub fn decompose_filename(file_name: &str) -> ParsedFilename {
    let stem = strip_extension(file_name).trim();

    let attempts: [(&Lazy<Regex>, FilenamePattern, bool); 4] = [
        (&LEADING_NUMBER, FilenamePattern::LeadingNumber, true),
        (&BOOK_OR_VOLUME, FilenamePattern::BookOrVolume, true),
        (&TRAILING_NUMBER, FilenamePattern::TrailingNumber, false),
        (&HASH_NUMBER, FilenamePattern::HashNumber, false),
    ];

    for (regex, pattern, number_first) in attempts {
        let Some(caps) = regex.captures(stem) else {
            continue;
        };
        let (number, title) = if number_first {
            (&caps[1], &caps[2])
        } else {
            (&caps[2], &caps[1])
        };
        // Numbers too large for u32 are not series positions
        let Ok(series_number) = number.parse::<u32>() else {
            continue;
        };

        return ParsedFilename {
            parsed_title: title.trim().to_string(),
            series_number: Some(series_number),
            pattern: Some(pattern),
        };
    }

    ParsedFilename {
        parsed_title: stem.to_string(),
        series_number: None,
        pattern: None,
    }
}

/// Strip a short alphanumeric extension (`.mp3`, `.m4b`), leaving dotted names intact
fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => {
            let ext = &file_name[idx + 1..];
            if !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                &file_name[..idx]
            } else {
                file_name
            }
        }
        _ => file_name,
    }
}

/// Heuristic: does a directory segment look like a person's name?
///
/// Accepts "First Last", "Last, First" and generic two-token segments.
pub fn looks_like_author(segment: &str) -> bool {
    let segment = segment.trim();
    if segment.is_empty() {
        return false;
    }
    FIRST_LAST.is_match(segment) || LAST_FIRST.is_match(segment) || TWO_TOKEN.is_match(segment)
}

/// Directory structure recognized above a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryShape {
    /// `Authors/<author>/<series>`
    AuthorsTree { author: String, series: String },
    /// Author-looking parent directory, optionally followed by a series directory
    AuthorParent {
        author: String,
        series: Option<String>,
    },
    /// Nothing recognized
    Unrecognized,
}

impl DirectoryShape {
    fn bonus(&self) -> f32 {
        match self {
            DirectoryShape::AuthorsTree { .. } => AUTHORS_TREE_BONUS,
            DirectoryShape::AuthorParent { .. } => AUTHOR_PARENT_BONUS,
            DirectoryShape::Unrecognized => 0.0,
        }
    }
}

/// Recognize the directory shape of a list of directory segments
pub fn detect_directory_shape(dirs: &[&str]) -> DirectoryShape {
    if let Some(idx) = dirs
        .iter()
        .position(|d| d.eq_ignore_ascii_case(AUTHORS_SEGMENT))
    {
        match (dirs.get(idx + 1), dirs.get(idx + 2)) {
            (Some(author), Some(series)) => {
                return DirectoryShape::AuthorsTree {
                    author: author.to_string(),
                    series: series.to_string(),
                };
            }
            (Some(author), None) => {
                return DirectoryShape::AuthorParent {
                    author: author.to_string(),
                    series: None,
                };
            }
            _ => {}
        }
    }

    let n = dirs.len();
    if n >= 2 && looks_like_author(dirs[n - 2]) {
        return DirectoryShape::AuthorParent {
            author: dirs[n - 2].to_string(),
            series: Some(dirs[n - 1].to_string()),
        };
    }
    if n >= 1 && looks_like_author(dirs[n - 1]) {
        return DirectoryShape::AuthorParent {
            author: dirs[n - 1].to_string(),
            series: None,
        };
    }

    DirectoryShape::Unrecognized
}

/// Split a relative path into non-empty segments (either slash style)
fn segments(relative_path: &str) -> Vec<&str> {
    relative_path
        .split(['/', '\\'])
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// Estimate metadata for a file from its relative path
pub fn analyze_file_path(relative_path: &str) -> MetadataEstimate {
    let segs = segments(relative_path);
    let Some((file_name, dirs)) = segs.split_last() else {
        return MetadataEstimate::empty(Provenance::Filename, BASE_CONFIDENCE);
    };

    let parsed = decompose_filename(file_name);
    build_estimate(dirs, Some(parsed), relative_path)
}

/// Estimate metadata for a directory from its relative path
///
/// Every segment is treated as a directory, so
/// `Authors/<author>/<series>` yields author and series with no title.
pub fn analyze_directory_path(relative_path: &str) -> MetadataEstimate {
    let dirs = segments(relative_path);
    build_estimate(&dirs, None, relative_path)
}

fn build_estimate(dirs: &[&str], parsed: Option<ParsedFilename>, path: &str) -> MetadataEstimate {
    let shape = detect_directory_shape(dirs);
    let numbered = parsed
        .as_ref()
        .map(|p| p.pattern.is_some())
        .unwrap_or(false);

    let mut confidence = BASE_CONFIDENCE + shape.bonus();
    if numbered {
        confidence += NUMBERED_BONUS;
    }

    let mut estimate = MetadataEstimate::empty(Provenance::Filename, confidence);

    match &shape {
        DirectoryShape::AuthorsTree { author, series } => {
            estimate.author = Some(author.clone());
            estimate.series = Some(series.clone());
        }
        DirectoryShape::AuthorParent { author, series } => {
            estimate.author = Some(author.clone());
            estimate.series = series.clone();
        }
        DirectoryShape::Unrecognized => {}
    }

    if let Some(parsed) = parsed {
        if !parsed.parsed_title.is_empty() {
            estimate.title = Some(parsed.parsed_title);
        }
        estimate.series_number = parsed.series_number;
    }

    debug!(
        path = %path,
        shape = ?shape,
        numbered = numbered,
        confidence = estimate.confidence,
        "Filename-derived estimate"
    );

    estimate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompose_book_prefix() {
        let parsed = decompose_filename("Book 3 - The Return.mp3");
        assert_eq!(parsed.parsed_title, "The Return");
        assert_eq!(parsed.series_number, Some(3));
        assert_eq!(parsed.pattern, Some(FilenamePattern::BookOrVolume));
    }

    #[test]
    fn test_decompose_zero_padded_prefix() {
        let parsed = decompose_filename("01 - Chapter One.mp3");
        assert_eq!(parsed.parsed_title, "Chapter One");
        assert_eq!(parsed.series_number, Some(1));
        assert_eq!(parsed.pattern, Some(FilenamePattern::LeadingNumber));

        let parsed = decompose_filename("007_prologue.m4b");
        assert_eq!(parsed.parsed_title, "prologue");
        assert_eq!(parsed.series_number, Some(7));
    }

    #[test]
    fn test_decompose_volume_prefix() {
        let parsed = decompose_filename("Vol. 2 - Shadows.mp3");
        assert_eq!(parsed.parsed_title, "Shadows");
        assert_eq!(parsed.series_number, Some(2));
    }

    #[test]
    fn test_decompose_trailing_number() {
        let parsed = decompose_filename("Chapter 12.mp3");
        assert_eq!(parsed.parsed_title, "Chapter");
        assert_eq!(parsed.series_number, Some(12));
        assert_eq!(parsed.pattern, Some(FilenamePattern::TrailingNumber));
    }

    #[test]
    fn test_decompose_hash_number() {
        let parsed = decompose_filename("Foundation #2.m4b");
        assert_eq!(parsed.parsed_title, "Foundation");
        assert_eq!(parsed.series_number, Some(2));
        assert_eq!(parsed.pattern, Some(FilenamePattern::HashNumber));
    }

    #[test]
    fn test_decompose_unmatched_is_title_only() {
        let parsed = decompose_filename("The Hobbit.mp3");
        assert_eq!(parsed.parsed_title, "The Hobbit");
        assert_eq!(parsed.series_number, None);
        assert_eq!(parsed.pattern, None);
    }

    #[test]
    fn test_decompose_keeps_dotted_names() {
        let parsed = decompose_filename("J.R.R. Tolkien");
        assert_eq!(parsed.parsed_title, "J.R.R. Tolkien");
    }

    #[test]
    fn test_looks_like_author() {
        assert!(looks_like_author("Frank Herbert"));
        assert!(looks_like_author("J.R.R. Tolkien"));
        assert!(looks_like_author("Herbert, Frank"));
        assert!(looks_like_author("brandon sanderson"));
        assert!(!looks_like_author("Lord of the Rings"));
        assert!(!looks_like_author("Book 3"));
        assert!(!looks_like_author("Incoming"));
    }

    #[test]
    fn test_authors_tree_directory() {
        let estimate = analyze_directory_path("Authors/J.R.R. Tolkien/Lord of the Rings");
        assert_eq!(estimate.author.as_deref(), Some("J.R.R. Tolkien"));
        assert_eq!(estimate.series.as_deref(), Some("Lord of the Rings"));
        assert_eq!(estimate.provenance, Provenance::Filename);
        assert!(estimate.confidence >= 0.5);
    }

    #[test]
    fn test_authors_tree_file_with_number() {
        let estimate = analyze_file_path(
            "Authors/Frank Herbert/Dune Chronicles/Book 3 - Children of Dune.mp3",
        );
        assert_eq!(estimate.author.as_deref(), Some("Frank Herbert"));
        assert_eq!(estimate.series.as_deref(), Some("Dune Chronicles"));
        assert_eq!(estimate.title.as_deref(), Some("Children of Dune"));
        assert_eq!(estimate.series_number, Some(3));
        assert!((estimate.confidence - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_author_parent_directory() {
        let estimate = analyze_file_path("Incoming/Ursula Le Guin/Earthsea/01 - A Wizard.mp3");
        assert_eq!(estimate.author.as_deref(), Some("Ursula Le Guin"));
        assert_eq!(estimate.series.as_deref(), Some("Earthsea"));
        assert!((estimate.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_bare_filename_base_confidence() {
        let estimate = analyze_file_path("The Hobbit.mp3");
        assert_eq!(estimate.title.as_deref(), Some("The Hobbit"));
        assert!(estimate.author.is_none());
        assert!((estimate.confidence - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_backslash_paths() {
        let estimate = analyze_file_path("Authors\\Frank Herbert\\Dune\\Dune.mp3");
        assert_eq!(estimate.author.as_deref(), Some("Frank Herbert"));
        assert_eq!(estimate.series.as_deref(), Some("Dune"));
    }
}
