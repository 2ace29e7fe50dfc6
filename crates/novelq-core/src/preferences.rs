//! User preferences.
//!
//! Stored as one JSON object. Every field has its own default so a partial or
//! older file still loads, and a missing or unreadable file yields
//! [`UserPreferences::default`] so the reader can always start.

use crate::document::FileType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Minimum allowed font size (points).
pub const MIN_FONT_SIZE: u32 = 8;
/// Maximum allowed font size (points).
pub const MAX_FONT_SIZE: u32 = 36;

pub const KNOWN_THEMES: [&str; 5] = ["light", "dark", "sepia", "green", "blue"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default = "default_line_spacing")]
    pub line_spacing: f64,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_auto_scroll_interval")]
    pub auto_scroll_interval: u32,
    /// Directory offered when picking a novel; empty when unset.
    #[serde(default)]
    pub novels_dir: String,
}

impl Default for UserPreferences {
    fn default() -> Self {
        UserPreferences {
            font_family: default_font_family(),
            font_size: default_font_size(),
            line_spacing: default_line_spacing(),
            theme: default_theme(),
            auto_scroll_interval: default_auto_scroll_interval(),
            novels_dir: String::new(),
        }
    }
}

impl UserPreferences {
    /// Bring out-of-range values back to something usable.
    pub fn clamped(mut self) -> Self {
        self.font_size = self.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        if !KNOWN_THEMES.contains(&self.theme.as_str()) {
            warn!(theme = %self.theme, "Unknown theme; using the default");
            self.theme = default_theme();
        }
        self
    }

    /// Supported documents directly inside `novels_dir`, sorted by file name.
    pub fn list_novels(&self) -> Vec<PathBuf> {
        if self.novels_dir.trim().is_empty() {
            return Vec::new();
        }
        let dir = Path::new(&self.novels_dir);
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(path = %dir.display(), "Cannot list novels directory: {err}");
                return Vec::new();
            }
        };

        let mut novels: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && FileType::from_path(path).is_ok())
            .collect();
        novels.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        novels
    }
}

/// Load preferences from `path`, falling back to defaults on any error.
pub fn load_preferences(path: &Path) -> UserPreferences {
    let contents = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "No saved preferences; using defaults");
            return UserPreferences::default();
        }
        Err(err) => {
            warn!(path = %path.display(), "Falling back to default preferences: {err}");
            return UserPreferences::default();
        }
    };

    match serde_json::from_str::<UserPreferences>(&contents) {
        Ok(prefs) => {
            info!(path = %path.display(), "Loaded preferences");
            prefs
        }
        Err(err) => {
            warn!(path = %path.display(), "Invalid preferences JSON: {err}");
            UserPreferences::default()
        }
    }
}

fn default_font_family() -> String {
    "Microsoft YaHei".to_string()
}

fn default_font_size() -> u32 {
    12
}

fn default_line_spacing() -> f64 {
    1.5
}

fn default_theme() -> String {
    "light".to_string()
}

fn default_auto_scroll_interval() -> u32 {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_fill_in_defaults() {
        let prefs: UserPreferences =
            serde_json::from_str(r#"{"font_size": 20, "theme": "dark"}"#).unwrap();
        assert_eq!(prefs.font_size, 20);
        assert_eq!(prefs.theme, "dark");
        assert_eq!(prefs.font_family, "Microsoft YaHei");
        assert_eq!(prefs.line_spacing, 1.5);
        assert_eq!(prefs.auto_scroll_interval, 50);
        assert_eq!(prefs.novels_dir, "");
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ this is not json").unwrap();
        assert_eq!(load_preferences(&path), UserPreferences::default());

        fs::write(&path, r#"{"font_size": "huge"}"#).unwrap();
        assert_eq!(load_preferences(&path), UserPreferences::default());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            load_preferences(&dir.path().join("absent.json")),
            UserPreferences::default()
        );
    }

    #[test]
    fn clamped_bounds_font_and_theme() {
        let prefs = UserPreferences {
            font_size: 99,
            theme: "neon".to_string(),
            ..UserPreferences::default()
        }
        .clamped();
        assert_eq!(prefs.font_size, MAX_FONT_SIZE);
        assert_eq!(prefs.theme, "light");

        let small = UserPreferences {
            font_size: 1,
            theme: "sepia".to_string(),
            ..UserPreferences::default()
        }
        .clamped();
        assert_eq!(small.font_size, MIN_FONT_SIZE);
        assert_eq!(small.theme, "sepia");
    }

    #[test]
    fn novels_are_listed_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.txt", "a.epub", "c.pdf", "notes.md", "cover.jpg"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("folder.txt")).unwrap();

        let prefs = UserPreferences {
            novels_dir: dir.path().display().to_string(),
            ..UserPreferences::default()
        };
        let names: Vec<String> = prefs
            .list_novels()
            .iter()
            .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.epub", "b.txt", "c.pdf"]);
    }

    #[test]
    fn unset_novels_dir_lists_nothing() {
        assert!(UserPreferences::default().list_novels().is_empty());
    }
}
