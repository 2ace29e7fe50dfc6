//! EPUB extraction.
//!
//! Walks the spine in reading order, strips markup to visible text, and joins
//! the parts with newlines. When the book ships a table of contents its
//! entries become the chapter list, anchored at the offset where each entry's
//! target document begins. Otherwise chapter titles are guessed from the
//! first lines of every part.

use crate::document::{
    Chapter, ChapterUnit, Metadata, MetadataValue, NormalizedDocument, PartAssembler,
};
use crate::encoding::{CONFIDENCE_THRESHOLD, decode_bytes, decode_with_fallbacks, guess_encoding};
use crate::error::{DocumentError, Result};
use epub::doc::{EpubDoc, NavPoint};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::{debug, info, warn};

/// Dublin Core fields collected as value lists.
pub const METADATA_FIELDS: [&str; 5] = [
    "title",
    "creator",
    "language",
    "publisher",
    "identifier",
];

static RE_SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*?/>|<script\b[^>]*>.*?</script\s*>").unwrap());
static RE_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*?/>|<style\b[^>]*>.*?</style\s*>").unwrap());
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());
static RE_HEADING_MARK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6} ").unwrap());
static RE_DECLARED_CHARSET: Lazy<regex::bytes::Regex> = Lazy::new(|| {
    regex::bytes::Regex::new(
        r#"(?i-u)(?:<\?xml[^>]*?\bencoding|<meta[^>]*?\bcharset)\s*=\s*["']?([a-z0-9._-]+)"#,
    )
    .unwrap()
});

/// How far into a document to look for an encoding declaration.
const DECLARATION_SCAN_BYTES: usize = 1024;

/// One spine document after markup stripping.
#[derive(Debug, Clone)]
pub(crate) struct SpinePart {
    /// Archive path of the document, without fragment.
    pub(crate) target: String,
    pub(crate) text: String,
}

/// A flattened table-of-contents entry.
#[derive(Debug, Clone)]
pub(crate) struct TocEntry {
    pub(crate) title: String,
    pub(crate) target: String,
}

/// Load an EPUB from disk into a normalized document.
pub fn extract(path: &Path) -> Result<NormalizedDocument> {
    info!(path = %path.display(), "Loading EPUB content");
    let mut doc = EpubDoc::new(path).map_err(|err| DocumentError::format("EPUB", path, err))?;

    let metadata = read_metadata(&doc);
    let toc = flatten_toc(&doc.toc);
    let parts = read_spine(&mut doc);
    let part_count = parts.len();
    let (text, chapters) = assemble(parts, &toc);

    info!(
        parts = part_count,
        toc_entries = toc.len(),
        chapters = chapters.len(),
        total_chars = text.chars().count(),
        "Finished loading EPUB content"
    );
    Ok(NormalizedDocument {
        text,
        metadata,
        chapters,
        page_offsets: Vec::new(),
    })
}

fn read_metadata<R: Read + Seek>(doc: &EpubDoc<R>) -> Metadata {
    let mut metadata = Metadata::new();
    for field in METADATA_FIELDS {
        let values: Vec<String> = doc
            .metadata
            .iter()
            .filter(|item| item.property == field)
            .map(|item| item.value.clone())
            .collect();
        metadata.insert(field.to_string(), MetadataValue::List(values));
    }
    if let Some(cover) = doc.get_cover_id() {
        metadata.insert("cover".to_string(), MetadataValue::Text(cover));
    }
    metadata
}

/// Depth-first flattening of the navigation tree.
fn flatten_toc(points: &[NavPoint]) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    let mut stack: Vec<&NavPoint> = points.iter().rev().collect();
    while let Some(point) = stack.pop() {
        entries.push(TocEntry {
            title: point.label.trim().to_string(),
            target: strip_fragment(&point.content.to_string_lossy()),
        });
        stack.extend(point.children.iter().rev());
    }
    entries
}

/// Every spine document in reading order. A document that is missing from
/// the archive or cannot be decoded is skipped with a warning; later
/// documents are still read.
fn read_spine<R: Read + Seek>(doc: &mut EpubDoc<R>) -> Vec<SpinePart> {
    let mut parts = Vec::new();
    if doc.spine.is_empty() {
        return parts;
    }
    let mut index = 0usize;
    loop {
        let target = doc
            .get_current_path()
            .map(|path| strip_fragment(&path.to_string_lossy()))
            .unwrap_or_default();
        match doc.get_current() {
            Some((bytes, _mime)) => match decode_markup(&bytes) {
                Some((html, encoding)) => {
                    let text = visible_text(&html, index);
                    debug!(
                        part = index,
                        href = %target,
                        %encoding,
                        added_chars = text.len(),
                        "Parsed spine document"
                    );
                    parts.push(SpinePart { target, text });
                }
                None => {
                    warn!(part = index, href = %target, "Skipping undecodable spine document");
                }
            },
            None => {
                warn!(part = index, href = %target, "Spine document missing from archive");
            }
        }

        index += 1;
        if !doc.go_next() {
            break;
        }
    }
    parts
}

/// Decode one XHTML document. A charset declared in the XML prolog or a
/// `<meta>` tag is tried first, then UTF-8, then the same detection and
/// fallback chain used for plain text.
pub(crate) fn decode_markup(bytes: &[u8]) -> Option<(String, String)> {
    let head = &bytes[..bytes.len().min(DECLARATION_SCAN_BYTES)];
    if let Some(label) = RE_DECLARED_CHARSET
        .captures(head)
        .and_then(|caps| caps.get(1))
        .map(|found| String::from_utf8_lossy(found.as_bytes()).to_ascii_lowercase())
    {
        if let Some(html) = decode_bytes(bytes, &label) {
            return Some((html, label));
        }
        debug!(declared = %label, "Declared charset does not decode the document");
    }

    if let Some(html) = decode_bytes(bytes, "utf-8") {
        return Some((html, "utf-8".to_string()));
    }
    if let Some((label, confidence)) = guess_encoding(bytes) {
        if confidence > CONFIDENCE_THRESHOLD {
            if let Some(html) = decode_bytes(bytes, &label) {
                return Some((html, label));
            }
        }
    }
    decode_with_fallbacks(bytes).map(|decoded| (decoded.text, decoded.encoding))
}

fn strip_fragment(target: &str) -> String {
    target
        .split('#')
        .next()
        .unwrap_or_default()
        .replace('\\', "/")
}

/// Visible text of an XHTML document, with scripts and styles removed.
pub(crate) fn visible_text(html: &str, part: usize) -> String {
    let stripped = RE_SCRIPT.replace_all(html, "");
    let stripped = RE_STYLE.replace_all(&stripped, "");
    // A very large width keeps html2text from baking in hard line breaks.
    match html2text::from_read(stripped.as_bytes(), 10_000) {
        Ok(clean) => RE_HEADING_MARK.replace_all(&clean, "").into_owned(),
        Err(err) => {
            warn!(part, "html2text failed, stripping tags directly: {err}");
            RE_TAG.replace_all(&stripped, "").into_owned()
        }
    }
}

/// Join non-blank parts and build the chapter list.
pub(crate) fn assemble(parts: Vec<SpinePart>, toc: &[TocEntry]) -> (String, Vec<Chapter>) {
    let mut assembler = PartAssembler::default();

    if toc.is_empty() {
        for part in parts {
            if !part.text.trim().is_empty() {
                assembler.push_detecting(part.text, None);
            }
        }
        let chapters = std::mem::take(&mut assembler.chapters);
        return (assembler.into_text(), chapters);
    }

    let mut offsets: HashMap<String, usize> = HashMap::new();
    for part in parts {
        let at = if part.text.trim().is_empty() {
            assembler.offset()
        } else {
            assembler.push_part(part.text)
        };
        offsets.entry(part.target).or_insert(at);
    }

    let mut previous = 0;
    let mut chapters: Vec<Chapter> = toc
        .iter()
        .map(|entry| {
            let start = match offsets.get(&entry.target) {
                Some(&start) => start,
                None => {
                    debug!(href = %entry.target, "TOC entry target not in spine");
                    previous
                }
            };
            previous = start;
            Chapter::new(entry.title.clone(), start, ChapterUnit::Char)
        })
        .collect();
    chapters.sort_by_key(|chapter| chapter.start);

    (assembler.into_text(), chapters)
}
