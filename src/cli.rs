use clap::Parser;
use std::path::PathBuf;

/// Open a novel (TXT, EPUB or PDF) and show its chapters and reading state
#[derive(Parser, Debug)]
#[command(name = "novelq", version, about)]
pub struct Cli {
    /// Path to the novel to open
    pub path: Option<PathBuf>,

    /// Directory holding preferences, progress and bookmarks.
    /// Defaults to `.reader_settings` in the home directory.
    #[arg(long)]
    pub settings_dir: Option<PathBuf>,

    /// Print every chapter with its start offset
    #[arg(long, default_value_t = false)]
    pub list_chapters: bool,

    /// Print the opened document as JSON instead of a summary
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Record reading progress at this character offset
    #[arg(long)]
    pub position: Option<usize>,

    /// Add a bookmark at this character offset
    #[arg(long)]
    pub bookmark: Option<usize>,

    /// Note attached to the bookmark added with --bookmark
    #[arg(long, requires = "bookmark")]
    pub note: Option<String>,

    /// Remove every bookmark at this character offset
    #[arg(long)]
    pub remove_bookmark: Option<usize>,

    /// List supported files in the configured novels directory
    #[arg(long, default_value_t = false)]
    pub list_novels: bool,

    /// Log filter (e.g. `debug`, `novelq_core=trace`); overrides RUST_LOG
    #[arg(long)]
    pub log_level: Option<String>,
}
