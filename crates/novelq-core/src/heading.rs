//! Chapter heading recognition.
//!
//! One table of heading families feeds two matchers of deliberately different
//! strictness:
//!
//! - [`match_title`] is used by the EPUB and PDF extractors on the first lines
//!   of a content part. A line only counts when the whole line parses as
//!   `marker separator title`.
//! - [`is_boundary`] is used by the fallback segmenter on every line of the
//!   full text. Any line that merely *begins* with a marker counts.
//!
//! Callers rely on each behaving exactly as it does today, so the two must not
//! be merged.

use once_cell::sync::Lazy;
use regex::Regex;

/// How many leading lines of a block [`match_title`] inspects.
pub const TITLE_SCAN_LINES: usize = 5;

/// A heading family: the whole-line title form and the looser prefix form.
pub struct HeadingFamily {
    pub title: &'static str,
    pub boundary: &'static str,
}

pub const HEADING_FAMILIES: [HeadingFamily; 4] = [
    HeadingFamily {
        title: r"^\s*第\s*[一二三四五六七八九十百千万零\d]+\s*[章节卷集部篇]\s*[：:\s]+(.+)$",
        boundary: r"^第[一二三四五六七八九十百千万零\d]+[章节卷集部篇]",
    },
    HeadingFamily {
        title: r"^\s*Chapter\s*\d+\s*[:\s]+(.+)$",
        boundary: r"^Chapter\s*\d+",
    },
    HeadingFamily {
        title: r"^\s*CHAPTER\s*\d+\s*[:\s]+(.+)$",
        boundary: r"^CHAPTER\s*\d+",
    },
    HeadingFamily {
        title: r"^\s*\d+\.\s+(.+)$",
        boundary: r"^\d+\.\s+\w+",
    },
];

static TITLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| compile(|family| family.title));
static BOUNDARY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| compile(|family| family.boundary));

fn compile(pick: impl Fn(&HeadingFamily) -> &'static str) -> Vec<Regex> {
    HEADING_FAMILIES
        .iter()
        .map(|family| Regex::new(pick(family)).unwrap())
        .collect()
}

/// Find a chapter title among the first [`TITLE_SCAN_LINES`] lines of `block`.
///
/// The whole trimmed line is returned, marker included, not just the text
/// after the separator.
pub fn match_title(block: &str) -> Option<String> {
    block
        .split('\n')
        .take(TITLE_SCAN_LINES)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find(|line| TITLE_PATTERNS.iter().any(|re| re.is_match(line)))
        .map(str::to_string)
}

/// Whether `line` starts with a chapter marker.
pub fn is_boundary(line: &str) -> bool {
    BOUNDARY_PATTERNS.iter().any(|re| re.is_match(line))
}
