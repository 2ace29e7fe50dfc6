//! Entry point for the novel reader.
//!
//! Parses arguments, opens the document through `novelq_core`, and reports
//! chapters and saved reading state. Progress and bookmarks given on the
//! command line are written back to the settings directory.

mod cli;

use crate::cli::Cli;
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use novelq_core::{Bookmark, DocumentSession, ReadingProgress, StateStore, UserPreferences};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

/// Longest bookmark excerpt, in chars.
const EXCERPT_CHARS: usize = 50;

fn main() {
    let cli = Cli::parse();
    let reload_handle = init_tracing();
    if let Some(level) = &cli.log_level {
        set_log_level(&reload_handle, level);
    }
    if let Err(err) = run(cli) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let store = StateStore::new(
        cli.settings_dir
            .clone()
            .unwrap_or_else(StateStore::default_root),
    );
    let prefs = store.load_preferences().clamped();
    info!(
        settings = %store.root().display(),
        theme = %prefs.theme,
        font_size = prefs.font_size,
        "Loaded reader settings"
    );

    if cli.list_novels {
        list_novels(&prefs);
        if cli.path.is_none() {
            return Ok(());
        }
    }

    let path = cli
        .path
        .as_deref()
        .ok_or_else(|| anyhow!("Usage: novelq <path-to-novel>"))?;
    let session = DocumentSession::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    if let Some(progress) = store.load_progress(session.source_path()) {
        info!(
            position = progress.position,
            chapter_index = progress.chapter_index,
            "Resuming from saved progress"
        );
    }

    if let Some(position) = cli.remove_bookmark {
        store.remove_bookmark(session.source_path(), position)?;
        info!(position, "Removed bookmarks");
    }
    if let Some(position) = cli.bookmark {
        let text = excerpt_at(session.text(), position);
        store.add_bookmark(
            session.source_path(),
            Bookmark::new(position, text, cli.note.clone()),
        )?;
        info!(position, "Added bookmark");
    }

    if cli.json {
        let snapshot = serde_json::to_string_pretty(&session.snapshot())
            .context("Failed to serialize document")?;
        println!("{snapshot}");
    } else {
        print_summary(&session, &store, cli.list_chapters);
    }

    if let Some(position) = cli.position {
        let chapter_index = session.chapter_index_at(position).unwrap_or(0);
        store.save_progress(&ReadingProgress::new(
            session.source_path(),
            position,
            chapter_index,
        ))?;
        info!(position, chapter_index, "Saved reading progress");
    }
    Ok(())
}

fn print_summary(session: &DocumentSession, store: &StateStore, list_chapters: bool) {
    println!("{} ({})", session.source_name(), session.file_type());
    println!("encoding: {}", session.encoding());
    println!("characters: {}", session.text().chars().count());
    for (key, value) in session.metadata() {
        if !value.is_empty() {
            println!("{key}: {}", value.joined(", "));
        }
    }

    let chapters = session.chapters();
    println!("chapters: {}", chapters.len());
    if list_chapters {
        for (index, chapter) in chapters.iter().enumerate() {
            let indent = "  ".repeat(chapter.level.unwrap_or(1).saturating_sub(1));
            println!(
                "{index:>4}  {indent}{}  [{:?} {}]",
                chapter.title, chapter.unit, chapter.start
            );
        }
    }

    if let Some(progress) = store.load_progress(session.source_path()) {
        let title = chapters
            .get(progress.chapter_index)
            .map(|chapter| chapter.title.as_str())
            .unwrap_or("?");
        println!("progress: {} ({title})", progress.position);
    }
    for bookmark in store.load_bookmarks(session.source_path()) {
        match &bookmark.note {
            Some(note) => println!("bookmark {}: {} ({note})", bookmark.position, bookmark.text),
            None => println!("bookmark {}: {}", bookmark.position, bookmark.text),
        }
    }
}

fn list_novels(prefs: &UserPreferences) {
    let novels = prefs.list_novels();
    if novels.is_empty() {
        warn!(dir = %prefs.novels_dir, "No novels found; set novels_dir in settings.json");
    }
    for novel in novels {
        println!("{}", novel.display());
    }
}

/// First line of text at char offset `position`, cut to [`EXCERPT_CHARS`].
fn excerpt_at(text: &str, position: usize) -> String {
    text.chars()
        .skip(position)
        .skip_while(|ch| ch.is_whitespace())
        .take_while(|&ch| ch != '\n')
        .take(EXCERPT_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr)
                .with_filter(filter_layer),
        )
        .init();
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = match EnvFilter::builder().parse(level) {
        Ok(filter) => filter,
        Err(err) => {
            warn!(%level, "Ignoring invalid log level: {err}");
            return;
        }
    };
    if let Err(err) = handle.modify(|filter| *filter = parsed) {
        warn!(%level, "Failed to update log level: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_takes_the_rest_of_the_line() {
        let text = "第一章 开端\n天刚亮，他就醒了。";
        assert_eq!(excerpt_at(text, 0), "第一章 开端");
        assert_eq!(excerpt_at(text, 4), "开端");
        assert_eq!(excerpt_at(text, 6), "天刚亮，他就醒了。");
        assert_eq!(excerpt_at(text, 100), "");
    }

    #[test]
    fn excerpt_is_bounded() {
        let long = "x".repeat(200);
        assert_eq!(excerpt_at(&long, 0).chars().count(), EXCERPT_CHARS);
    }

    #[test]
    fn cli_accepts_a_bookmark_with_note() {
        let cli = Cli::try_parse_from([
            "novelq",
            "book.txt",
            "--bookmark",
            "12",
            "--note",
            "reread",
            "--list-chapters",
        ])
        .unwrap();
        assert_eq!(cli.bookmark, Some(12));
        assert_eq!(cli.note.as_deref(), Some("reread"));
        assert!(cli.list_chapters);
        assert!(Cli::try_parse_from(["novelq", "book.txt", "--note", "orphan"]).is_err());
    }
}
