//! Document ingestion for a novel reader.
//!
//! Opening a file yields a [`DocumentSession`]: the normalized text, its
//! metadata, and a chapter list taken from the book's own table of contents
//! or, failing that, from line-level heading detection. Plain text goes
//! through encoding detection first. Reader state (preferences, progress,
//! bookmarks) is persisted by [`StateStore`].

pub mod document;
pub mod encoding;
pub mod error;
pub mod extract;
pub mod heading;
pub mod preferences;
pub mod segmenter;
pub mod session;
pub mod store;

pub use document::{Chapter, ChapterUnit, FileType, Metadata, MetadataValue, NormalizedDocument};
pub use error::DocumentError;
pub use preferences::UserPreferences;
pub use session::{DocumentSession, SessionSnapshot};
pub use store::{Bookmark, ReadingProgress, StateStore};
