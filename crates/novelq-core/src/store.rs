//! Saved reading state: preferences, per-file progress and bookmarks.
//!
//! Everything lives under one settings directory:
//!
//! ```text
//! <root>/settings.json
//! <root>/progress/<key>.json
//! <root>/bookmarks/<key>.json
//! ```
//!
//! `<key>` is the SHA-256 of the document's absolute path (see [`path_key`]),
//! so state files stay discoverable across runs and rebuilds.
//!
//! Loading never fails: a missing or corrupt file yields defaults or nothing.
//! Saving reports errors so callers can decide whether to surface them.

use crate::preferences::{UserPreferences, load_preferences};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;

pub const SETTINGS_DIR_NAME: &str = ".reader_settings";
const PREFERENCES_FILE: &str = "settings.json";
const PROGRESS_DIR: &str = "progress";
const BOOKMARKS_DIR: &str = "bookmarks";

/// Where the reader was in a document when it was last closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingProgress {
    pub file_path: String,
    pub position: usize,
    pub chapter_index: usize,
}

impl ReadingProgress {
    pub fn new(file_path: &Path, position: usize, chapter_index: usize) -> Self {
        ReadingProgress {
            file_path: normalized_path(file_path).display().to_string(),
            position,
            chapter_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub position: usize,
    pub text: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
}

impl Bookmark {
    /// A bookmark stamped with the current local time.
    pub fn new(position: usize, text: impl Into<String>, note: Option<String>) -> Self {
        Bookmark {
            position,
            text: text.into(),
            note,
            created_time: Some(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

/// Stable file-name key for per-document state.
///
/// Hex SHA-256 over the UTF-8 bytes of the absolute, lexically normalized,
/// NFC-normalized path.
pub fn path_key(path: &Path) -> String {
    let normalized: String = normalized_path(path).to_string_lossy().nfc().collect();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Absolute form of `path` with `.` and `..` resolved without touching the
/// filesystem.
fn normalized_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Settings directory handle. Construct one at startup and pass it to
/// whatever needs to read or write state.
#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        StateStore { root: root.into() }
    }

    /// `~/.reader_settings`, or `./.reader_settings` when no home directory
    /// is known.
    pub fn default_root() -> PathBuf {
        std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(SETTINGS_DIR_NAME)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.root.join(PREFERENCES_FILE)
    }

    pub fn progress_path(&self, document: &Path) -> PathBuf {
        self.root
            .join(PROGRESS_DIR)
            .join(format!("{}.json", path_key(document)))
    }

    pub fn bookmarks_path(&self, document: &Path) -> PathBuf {
        self.root
            .join(BOOKMARKS_DIR)
            .join(format!("{}.json", path_key(document)))
    }

    pub fn load_preferences(&self) -> UserPreferences {
        load_preferences(&self.preferences_path())
    }

    pub fn save_preferences(&self, prefs: &UserPreferences) -> Result<()> {
        write_json(&self.preferences_path(), prefs)?;
        info!(path = %self.preferences_path().display(), "Saved preferences");
        Ok(())
    }

    pub fn load_progress(&self, document: &Path) -> Option<ReadingProgress> {
        read_json(&self.progress_path(document))
    }

    pub fn save_progress(&self, progress: &ReadingProgress) -> Result<()> {
        let path = self.progress_path(Path::new(&progress.file_path));
        write_json(&path, progress)?;
        debug!(
            position = progress.position,
            chapter_index = progress.chapter_index,
            "Saved reading progress"
        );
        Ok(())
    }

    pub fn load_bookmarks(&self, document: &Path) -> Vec<Bookmark> {
        read_json(&self.bookmarks_path(document)).unwrap_or_default()
    }

    pub fn save_bookmarks(&self, document: &Path, bookmarks: &[Bookmark]) -> Result<()> {
        write_json(&self.bookmarks_path(document), &bookmarks)
    }

    pub fn add_bookmark(&self, document: &Path, bookmark: Bookmark) -> Result<()> {
        let mut bookmarks = self.load_bookmarks(document);
        bookmarks.push(bookmark);
        self.save_bookmarks(document, &bookmarks)
    }

    /// Drop every bookmark at `position`.
    pub fn remove_bookmark(&self, document: &Path, position: usize) -> Result<()> {
        let mut bookmarks = self.load_bookmarks(document);
        bookmarks.retain(|bookmark| bookmark.position != position);
        self.save_bookmarks(document, &bookmarks)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == ErrorKind::NotFound => return None,
        Err(err) => {
            warn!(path = %path.display(), "Failed to read saved state: {err}");
            return None;
        }
    };
    match serde_json::from_str(&data) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(path = %path.display(), "Ignoring corrupt saved state: {err}");
            None
        }
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create state dir {}", parent.display()))?;
    }
    let contents = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize state for {}", path.display()))?;
    fs::write(path, contents)
        .with_context(|| format!("Failed to write state file {}", path.display()))?;
    Ok(())
}
