//! Fallback chapter segmentation for documents without a usable table of
//! contents.

use crate::document::{Chapter, ChapterUnit};
use crate::heading::is_boundary;
use tracing::debug;

/// Title of the implicit chapter holding text before the first heading.
pub const SENTINEL_TITLE: &str = "start";

/// Split `text` into chapters at lines that start with a chapter marker.
///
/// Chapter starts are 0-based line indices. Blank lines are skipped and
/// belong to no chapter. The implicit [`SENTINEL_TITLE`] chapter is kept only
/// when something precedes the first heading.
pub fn segment(text: &str) -> Vec<Chapter> {
    let mut chapters = vec![Chapter::new(SENTINEL_TITLE, 0, ChapterUnit::Line)];

    for (index, line) in text.split('\n').enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_boundary(line) {
            chapters.push(Chapter::new(line, index, ChapterUnit::Line).with_content(line));
        } else if let Some(open) = chapters.last_mut() {
            open.content.push(line.to_string());
        }
    }

    if chapters[0].content.is_empty() {
        chapters.remove(0);
    }
    debug!(chapters = chapters.len(), "Segmented text by heading lines");
    chapters
}
