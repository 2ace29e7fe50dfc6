//! Error taxonomy for opening documents.

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop a document from opening.
///
/// Loading saved reading state never produces one of these; see
/// [`crate::store::StateStore`].
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("unable to decode {}: no candidate encoding decodes the whole file", .0.display())]
    Decode(PathBuf),

    #[error("failed to parse {kind} file {}: {message}", path.display())]
    Format {
        kind: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("{0}")]
    MissingDependency(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DocumentError {
    pub(crate) fn format(kind: &'static str, path: impl Into<PathBuf>, err: impl ToString) -> Self {
        DocumentError::Format {
            kind,
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DocumentError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DocumentError>;
