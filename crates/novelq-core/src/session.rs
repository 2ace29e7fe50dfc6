//! An opened document and its chapter list.
//!
//! A session owns the extractor output for one file. Chapters come from the
//! format's own table of contents when it has one, otherwise from the line
//! segmenter, run once on first request.

use crate::document::{Chapter, ChapterUnit, FileType, Metadata, NormalizedDocument};
use crate::error::{DocumentError, Result};
use crate::{extract, segmenter};
use once_cell::unsync::OnceCell;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

const UNKNOWN_ENCODING: &str = "unknown";

/// Serializable view of an open document for UI callers.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot<'a> {
    pub source_path: String,
    pub source_name: &'a str,
    pub file_type: FileType,
    pub encoding: &'a str,
    pub total_chars: usize,
    pub metadata: &'a Metadata,
    pub chapters: &'a [Chapter],
}

/// One opened document.
///
/// Opening another file means building a new session; nothing is mutated
/// in place apart from the lazily computed fallback chapters.
#[derive(Debug)]
pub struct DocumentSession {
    source_path: PathBuf,
    source_name: String,
    file_type: FileType,
    encoding: Option<String>,
    document: NormalizedDocument,
    fallback_chapters: OnceCell<Vec<Chapter>>,
}

impl DocumentSession {
    /// Open `path`, dispatching on its extension.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let source_path = path.as_ref().to_path_buf();
        if !source_path.exists() {
            return Err(DocumentError::NotFound(source_path));
        }
        let file_type = FileType::from_path(&source_path)?;
        info!(path = %source_path.display(), %file_type, "Opening document");

        let extraction = extract::extract(&source_path, file_type)?;
        let source_name = source_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("book")
            .to_string();

        Ok(Self {
            source_path,
            source_name,
            file_type,
            encoding: extraction.encoding,
            document: extraction.document,
            fallback_chapters: OnceCell::new(),
        })
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn text(&self) -> &str {
        &self.document.text
    }

    pub fn metadata(&self) -> &Metadata {
        &self.document.metadata
    }

    /// Detected text encoding, or `"unknown"` for container formats.
    pub fn encoding(&self) -> &str {
        self.encoding.as_deref().unwrap_or(UNKNOWN_ENCODING)
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    /// Chapters from the extractor, or from the fallback segmenter when the
    /// extractor found none. The fallback runs at most once per session.
    pub fn chapters(&self) -> &[Chapter] {
        if !self.document.chapters.is_empty() {
            return &self.document.chapters;
        }
        self.fallback_chapters.get_or_init(|| {
            let chapters = segmenter::segment(&self.document.text);
            info!(
                path = %self.source_path.display(),
                chapters = chapters.len(),
                "Segmented document without table of contents"
            );
            chapters
        })
    }

    /// Index of the chapter containing the char offset `position`: the last
    /// chapter starting at or before it once `position` is converted to the
    /// chapters' own unit.
    pub fn chapter_index_at(&self, position: usize) -> Option<usize> {
        let chapters = self.chapters();
        let unit = chapters.first()?.unit;
        let target = self.position_in(unit, position);
        let after = chapters.partition_point(|chapter| chapter.start <= target);
        after.checked_sub(1)
    }

    /// Express a char offset as a char index, a 0-based line index, or a
    /// 1-based page number.
    fn position_in(&self, unit: ChapterUnit, position: usize) -> usize {
        match unit {
            ChapterUnit::Char => position,
            ChapterUnit::Line => self
                .document
                .text
                .chars()
                .take(position)
                .filter(|&ch| ch == '\n')
                .count(),
            ChapterUnit::Page => self
                .document
                .page_offsets
                .partition_point(|&start| start <= position),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        SessionSnapshot {
            source_path: self.source_path.display().to_string(),
            source_name: &self.source_name,
            file_type: self.file_type,
            encoding: self.encoding(),
            total_chars: self.document.text.chars().count(),
            metadata: self.metadata(),
            chapters: self.chapters(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::SENTINEL_TITLE;

    fn session_with(text: &str, chapters: Vec<Chapter>) -> DocumentSession {
        DocumentSession {
            source_path: PathBuf::from("/tmp/test.txt"),
            source_name: "test.txt".to_string(),
            file_type: FileType::Text,
            encoding: None,
            document: NormalizedDocument {
                text: text.to_string(),
                metadata: Metadata::new(),
                chapters,
                page_offsets: Vec::new(),
            },
            fallback_chapters: OnceCell::new(),
        }
    }

    #[test]
    fn fallback_chapters_are_computed_once() {
        let session = session_with("前言\n第一章 开端\n正文", Vec::new());
        let first = session.chapters();
        let second = session.chapters();

        assert!(std::ptr::eq(first, second));
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].title, SENTINEL_TITLE);
        assert_eq!(first[1].start, 1);
    }

    #[test]
    fn extractor_chapters_take_precedence() {
        let toc = vec![Chapter::new("Contents", 0, ChapterUnit::Char)];
        let session = session_with("第一章 开端\n正文", toc.clone());
        assert_eq!(session.chapters(), toc.as_slice());
    }

    #[test]
    fn chapter_index_follows_starts() {
        // Lines begin at chars 0, 6, 16, 18, 20 and 30.
        let session = session_with("intro\nChapter 1\na\nb\nChapter 2\nc", Vec::new());
        assert_eq!(session.chapter_index_at(0), Some(0));
        assert_eq!(session.chapter_index_at(5), Some(0));
        assert_eq!(session.chapter_index_at(6), Some(1));
        assert_eq!(session.chapter_index_at(19), Some(1));
        assert_eq!(session.chapter_index_at(20), Some(2));
        assert_eq!(session.chapter_index_at(99), Some(2));

        let headless = session_with("Chapter 5\nbody", Vec::new());
        assert_eq!(headless.chapter_index_at(0), Some(0));

        let empty = session_with("", Vec::new());
        assert_eq!(empty.chapter_index_at(0), None);
    }

    #[test]
    fn long_lines_do_not_skip_ahead_a_chapter() {
        let text = format!("Chapter 1\n{}\nChapter 2\nbody\n", "x".repeat(100));
        let session = session_with(&text, Vec::new());
        assert_eq!(session.chapters()[1].start, 2);

        assert_eq!(session.chapter_index_at(50), Some(0));
        assert_eq!(session.chapter_index_at(110), Some(0));
        assert_eq!(session.chapter_index_at(111), Some(1));
    }

    #[test]
    fn char_chapters_compare_offsets_directly() {
        let toc = vec![
            Chapter::new("One", 0, ChapterUnit::Char),
            Chapter::new("Two", 40, ChapterUnit::Char),
        ];
        let session = session_with(&"y".repeat(80), toc);
        assert_eq!(session.chapter_index_at(39), Some(0));
        assert_eq!(session.chapter_index_at(40), Some(1));
    }

    #[test]
    fn page_chapters_use_page_offsets() {
        let outline = vec![
            Chapter::new("Front", 1, ChapterUnit::Page),
            Chapter::new("Middle", 3, ChapterUnit::Page),
        ];
        let mut session = session_with("page one\npage two\npage three", outline);
        session.document.page_offsets = vec![0, 8, 17];

        assert_eq!(session.chapter_index_at(0), Some(0));
        assert_eq!(session.chapter_index_at(16), Some(0));
        assert_eq!(session.chapter_index_at(17), Some(1));
        assert_eq!(session.chapter_index_at(25), Some(1));
    }

    #[test]
    fn encoding_defaults_to_unknown() {
        assert_eq!(session_with("", Vec::new()).encoding(), "unknown");
    }

    #[test]
    fn missing_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = DocumentSession::open(dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, DocumentError::NotFound(_)));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.mobi");
        std::fs::write(&path, b"MOBI").unwrap();
        let err = DocumentSession::open(&path).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedFormat(_)));
    }
}
