//! Format extractors.
//!
//! Each extractor turns one file into a [`NormalizedDocument`]. Dispatch is
//! an exhaustive match over [`FileType`], so adding a format means adding a
//! variant and a handler here.

pub mod epub;
pub mod pdf;
pub mod text;

use crate::document::{FileType, NormalizedDocument};
use crate::error::Result;
use std::path::Path;

/// Extractor output plus the text encoding, when the format has one.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub document: NormalizedDocument,
    pub encoding: Option<String>,
}

impl From<NormalizedDocument> for Extraction {
    fn from(document: NormalizedDocument) -> Self {
        Extraction {
            document,
            encoding: None,
        }
    }
}

/// Run the extractor for `file_type` over `path`.
pub fn extract(path: &Path, file_type: FileType) -> Result<Extraction> {
    match file_type {
        FileType::Text => text::extract(path),
        FileType::Epub => epub::extract(path).map(Extraction::from),
        FileType::Pdf => pdf::extract(path).map(Extraction::from),
    }
}
