//! Plain-text extraction.
//!
//! Plain text carries no structure: metadata and chapters stay empty and
//! segmentation is left to [`crate::segmenter`].

use super::Extraction;
use crate::document::NormalizedDocument;
use crate::encoding::detect_and_decode;
use crate::error::Result;
use std::path::Path;
use tracing::info;

pub fn extract(path: &Path) -> Result<Extraction> {
    info!(path = %path.display(), "Loading plain text content");
    let decoded = detect_and_decode(path)?;
    info!(
        encoding = %decoded.encoding,
        total_chars = decoded.text.chars().count(),
        "Finished loading plain text content"
    );
    Ok(Extraction {
        document: NormalizedDocument {
            text: decoded.text,
            ..NormalizedDocument::default()
        },
        encoding: Some(decoded.encoding),
    })
}
