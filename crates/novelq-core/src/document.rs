//! Format-independent document model shared by every extractor.

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Supported source formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    #[serde(rename = "txt")]
    Text,
    Epub,
    Pdf,
}

impl FileType {
    pub const SUPPORTED_EXTENSIONS: [&'static str; 3] = ["txt", "epub", "pdf"];

    /// Map a path's extension (case-insensitive) to a format.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "txt" => Ok(FileType::Text),
            "epub" => Ok(FileType::Epub),
            "pdf" => Ok(FileType::Pdf),
            "" => Err(DocumentError::UnsupportedFormat(format!(
                "{} has no file extension",
                path.display()
            ))),
            other => Err(DocumentError::UnsupportedFormat(format!(".{other}"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Text => "txt",
            FileType::Epub => "epub",
            FileType::Pdf => "pdf",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metadata entry: EPUB fields may repeat (co-authors), PDF fields do not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    List(Vec<String>),
}

impl MetadataValue {
    /// All values joined for display.
    pub fn joined(&self, separator: &str) -> String {
        match self {
            MetadataValue::Text(value) => value.clone(),
            MetadataValue::List(values) => values.join(separator),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            MetadataValue::Text(value) => value.is_empty(),
            MetadataValue::List(values) => values.iter().all(String::is_empty),
        }
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// What a chapter's `start` counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterUnit {
    /// Character index into the document text.
    Char,
    /// 0-based line index into the document text.
    Line,
    /// Page number taken from a PDF outline.
    Page,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    pub start: usize,
    pub unit: ChapterUnit,
    pub content: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
}

impl Chapter {
    pub fn new(title: impl Into<String>, start: usize, unit: ChapterUnit) -> Self {
        Chapter {
            title: title.into(),
            start,
            unit,
            content: Vec::new(),
            level: None,
            page: None,
        }
    }

    pub fn with_content(mut self, fragment: impl Into<String>) -> Self {
        self.content.push(fragment.into());
        self
    }
}

/// Extractor output: one text stream, its metadata, and any chapter list
/// the format itself carried or the extractor could infer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedDocument {
    pub text: String,
    pub metadata: Metadata,
    pub chapters: Vec<Chapter>,
    /// Char offset in `text` where each page begins, indexed by page number
    /// minus one. Empty for formats without pages.
    pub page_offsets: Vec<usize>,
}

/// Builds chapter lists from consecutive text parts (EPUB spine documents,
/// PDF pages) when no table of contents exists.
///
/// A part whose first lines hold a title opens a new chapter starting at the
/// offset of the joined text before it; other parts extend the open chapter
/// or are dropped while none is open.
#[derive(Debug, Default)]
pub(crate) struct PartAssembler {
    parts: Vec<String>,
    joined_chars: usize,
    pub(crate) chapters: Vec<Chapter>,
}

impl PartAssembler {
    /// Character length of `parts.join("\n")` so far.
    pub(crate) fn offset(&self) -> usize {
        self.joined_chars
    }

    /// Record a non-blank part; returns the offset it was appended at.
    pub(crate) fn push_part(&mut self, text: String) -> usize {
        let before = self.joined_chars;
        let added = text.chars().count();
        self.joined_chars += if self.parts.is_empty() { added } else { added + 1 };
        self.parts.push(text);
        before
    }

    /// Push a part and run the title heuristic over it.
    pub(crate) fn push_detecting(&mut self, text: String, page: Option<usize>) {
        let start = self.offset();
        match crate::heading::match_title(&text) {
            Some(title) => {
                let mut chapter =
                    Chapter::new(title, start, ChapterUnit::Char).with_content(text.clone());
                chapter.page = page;
                self.chapters.push(chapter);
            }
            None => {
                if let Some(open) = self.chapters.last_mut() {
                    open.content.push(text.clone());
                }
            }
        }
        self.push_part(text);
    }

    pub(crate) fn into_text(self) -> String {
        self.parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_dispatch_is_case_insensitive() {
        assert_eq!(FileType::from_path(Path::new("a/B.TXT")).unwrap(), FileType::Text);
        assert_eq!(FileType::from_path(Path::new("b.Epub")).unwrap(), FileType::Epub);
        assert_eq!(FileType::from_path(Path::new("c.pdf")).unwrap(), FileType::Pdf);
    }

    #[test]
    fn file_type_labels_have_no_leading_dot() {
        for file_type in [FileType::Text, FileType::Epub, FileType::Pdf] {
            let json = serde_json::to_string(&file_type).unwrap();
            assert_eq!(json, format!("\"{}\"", file_type.as_str()));
            assert!(!file_type.to_string().starts_with('.'));
        }
        assert_eq!(FileType::Text.as_str(), "txt");
    }

    #[test]
    fn unknown_extensions_are_unsupported() {
        assert!(matches!(
            FileType::from_path(Path::new("book.mobi")),
            Err(DocumentError::UnsupportedFormat(ext)) if ext == ".mobi"
        ));
        assert!(matches!(
            FileType::from_path(Path::new("README")),
            Err(DocumentError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn metadata_values_serialize_untagged() {
        let mut metadata = Metadata::new();
        metadata.insert("title".into(), MetadataValue::Text("书".into()));
        metadata.insert(
            "creator".into(),
            MetadataValue::List(vec!["A".into(), "B".into()]),
        );
        let json = serde_json::to_string(&metadata).unwrap();
        assert_eq!(json, r#"{"creator":["A","B"],"title":"书"}"#);
    }

    #[test]
    fn assembler_offsets_match_joined_text() {
        let mut parts = PartAssembler::default();
        parts.push_detecting("序言\n正文".to_string(), None);
        parts.push_detecting("第一章 开端\n天亮了".to_string(), Some(1));
        parts.push_detecting("继续".to_string(), Some(2));

        let chapters = parts.chapters.clone();
        let text = parts.into_text();

        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].title, "第一章 开端");
        assert_eq!(chapters[0].page, Some(1));
        assert_eq!(chapters[0].start, "序言\n正文".chars().count());
        assert_eq!(chapters[0].content, vec!["第一章 开端\n天亮了", "继续"]);
        assert_eq!(text, "序言\n正文\n第一章 开端\n天亮了\n继续");
    }
}
