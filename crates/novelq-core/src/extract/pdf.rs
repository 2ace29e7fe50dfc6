//! PDF extraction.
//!
//! The outline, when present, is the chapter list (page-based starts). Without
//! one, every page is scanned for a chapter title the same way EPUB parts are.
//! The parser lives behind the `pdf` cargo feature; builds without it report
//! [`crate::DocumentError::MissingDependency`] instead of failing to parse.

use crate::document::{Chapter, ChapterUnit, Metadata, NormalizedDocument, PartAssembler};
use crate::error::Result;
use std::path::Path;

/// A flattened outline (bookmark) entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OutlineEntry {
    pub(crate) level: usize,
    pub(crate) title: String,
    pub(crate) page: usize,
}

/// Load a PDF from disk into a normalized document.
pub fn extract(path: &Path) -> Result<NormalizedDocument> {
    backend::extract(path)
}

/// Join non-blank pages, record where each page begins, and build the
/// chapter list.
pub(crate) fn assemble(pages: Vec<String>, outline: Vec<OutlineEntry>) -> NormalizedDocument {
    let mut assembler = PartAssembler::default();
    let mut page_offsets = Vec::with_capacity(pages.len());
    let structural = !outline.is_empty();

    for (index, text) in pages.into_iter().enumerate() {
        page_offsets.push(assembler.offset());
        if text.trim().is_empty() {
            continue;
        }
        if structural {
            assembler.push_part(text);
        } else {
            assembler.push_detecting(text, Some(index));
        }
    }

    let chapters = if structural {
        let mut chapters: Vec<Chapter> = outline
            .into_iter()
            .map(|entry| {
                let mut chapter = Chapter::new(entry.title, entry.page, ChapterUnit::Page);
                chapter.level = Some(entry.level);
                chapter
            })
            .collect();
        chapters.sort_by_key(|chapter| chapter.start);
        chapters
    } else {
        std::mem::take(&mut assembler.chapters)
    };

    NormalizedDocument {
        text: assembler.into_text(),
        metadata: Metadata::new(),
        chapters,
        page_offsets,
    }
}

#[cfg(feature = "pdf")]
mod backend {
    use super::{OutlineEntry, assemble};
    use crate::document::{Metadata, MetadataValue, NormalizedDocument};
    use crate::error::{DocumentError, Result};
    use encoding_rs::UTF_16BE;
    use lopdf::{Dictionary, Document, Object};
    use std::path::Path;
    use tracing::{debug, info, warn};

    const INFO_FIELDS: [(&str, &[u8]); 6] = [
        ("title", b"Title"),
        ("author", b"Author"),
        ("subject", b"Subject"),
        ("keywords", b"Keywords"),
        ("creator", b"Creator"),
        ("producer", b"Producer"),
    ];

    pub(super) fn extract(path: &Path) -> Result<NormalizedDocument> {
        info!(path = %path.display(), "Loading PDF content");
        let doc = Document::load(path).map_err(|err| DocumentError::format("PDF", path, err))?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let mut metadata = read_info(&doc);
        metadata.insert(
            "page_count".to_string(),
            MetadataValue::Text(page_numbers.len().to_string()),
        );

        let outline = read_outline(&doc);
        let pages: Vec<String> = page_numbers
            .iter()
            .map(|&number| match doc.extract_text(&[number]) {
                Ok(text) => text,
                Err(err) => {
                    warn!(page = number, "Failed to extract page text: {err}");
                    String::new()
                }
            })
            .collect();

        let mut document = assemble(pages, outline);
        document.metadata = metadata;
        info!(
            pages = page_numbers.len(),
            chapters = document.chapters.len(),
            total_chars = document.text.chars().count(),
            "Finished loading PDF content"
        );
        Ok(document)
    }

    fn read_info(doc: &Document) -> Metadata {
        let info: Option<&Dictionary> =
            doc.trailer
                .get(b"Info")
                .ok()
                .and_then(|obj| match obj {
                    Object::Reference(id) => doc.get_dictionary(*id).ok(),
                    Object::Dictionary(dict) => Some(dict),
                    _ => None,
                });

        INFO_FIELDS
            .iter()
            .map(|(field, key)| {
                let value = info
                    .and_then(|dict| dict.get(key).ok())
                    .and_then(text_string)
                    .unwrap_or_default();
                (field.to_string(), MetadataValue::Text(value))
            })
            .collect()
    }

    fn read_outline(doc: &Document) -> Vec<OutlineEntry> {
        match doc.get_toc() {
            Ok(toc) => {
                for err in &toc.errors {
                    debug!("Outline entry skipped: {err}");
                }
                toc.toc
                    .into_iter()
                    .map(|entry| OutlineEntry {
                        level: entry.level,
                        title: entry.title,
                        page: entry.page,
                    })
                    .collect()
            }
            Err(err) => {
                debug!("No usable outline: {err}");
                Vec::new()
            }
        }
    }

    fn text_string(obj: &Object) -> Option<String> {
        match obj {
            Object::String(bytes, _) => Some(decode_text_string(bytes)),
            _ => None,
        }
    }

    /// PDF text strings are UTF-16BE with a BOM or single-byte PDFDocEncoding,
    /// which agrees with Latin-1 for printable text.
    pub(super) fn decode_text_string(bytes: &[u8]) -> String {
        if let Some(body) = bytes.strip_prefix(&[0xFE, 0xFF]) {
            UTF_16BE.decode_without_bom_handling(body).0.into_owned()
        } else if let Some(body) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
            String::from_utf8_lossy(body).into_owned()
        } else {
            bytes.iter().map(|&byte| byte as char).collect()
        }
    }
}

#[cfg(not(feature = "pdf"))]
mod backend {
    use super::{NormalizedDocument, Result};
    use crate::error::DocumentError;
    use std::path::Path;

    pub(super) fn extract(path: &Path) -> Result<NormalizedDocument> {
        Err(DocumentError::MissingDependency(format!(
            "cannot open {}: PDF support was not compiled in; rebuild with `--features pdf`",
            path.display()
        )))
    }
}
