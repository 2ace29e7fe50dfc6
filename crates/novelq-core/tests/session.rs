use novelq_core::{ChapterUnit, DocumentError, DocumentSession, FileType};
use std::fs;

const NOVEL: &str = "书名：测试小说\n\n第一章 开端\n天刚亮，他就醒了。\n\n第二章 远行\n他收拾行李出发。\n一路向西。\n第三章 归来\n终于回家。\n";

#[test]
fn plain_text_novel_opens_and_segments() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("novel.TXT");
    fs::write(&path, NOVEL).unwrap();

    let session = DocumentSession::open(&path).unwrap();
    assert_eq!(session.file_type(), FileType::Text);
    assert_eq!(session.source_name(), "novel.TXT");
    assert_eq!(session.text(), NOVEL);
    assert_ne!(session.encoding(), "unknown");
    assert!(session.metadata().is_empty());

    let titles: Vec<&str> = session
        .chapters()
        .iter()
        .map(|chapter| chapter.title.as_str())
        .collect();
    assert_eq!(titles, vec!["start", "第一章 开端", "第二章 远行", "第三章 归来"]);
    assert!(session
        .chapters()
        .iter()
        .all(|chapter| chapter.unit == ChapterUnit::Line));
}

#[test]
fn chapters_are_stable_and_ordered() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("novel.txt");
    fs::write(&path, NOVEL).unwrap();

    let session = DocumentSession::open(&path).unwrap();
    let first = session.chapters().to_vec();
    let second = session.chapters().to_vec();
    assert_eq!(first, second);
    assert!(first.windows(2).all(|pair| pair[0].start <= pair[1].start));

    let char_index = |needle: &str| NOVEL[..NOVEL.find(needle).unwrap()].chars().count();
    assert_eq!(session.chapter_index_at(0), Some(0));
    assert_eq!(session.chapter_index_at(char_index("天刚亮")), Some(1));
    assert_eq!(session.chapter_index_at(char_index("第二章")), Some(2));
    assert_eq!(session.chapter_index_at(char_index("第二章") - 1), Some(1));
    assert_eq!(session.chapter_index_at(char_index("终于回家")), Some(3));
}

#[test]
fn snapshot_serializes_for_callers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("story.txt");
    fs::write(&path, "Chapter 1: Dawn\nIt was early.\n").unwrap();

    let session = DocumentSession::open(&path).unwrap();
    let json = serde_json::to_value(session.snapshot()).unwrap();
    assert_eq!(json["file_type"], "txt");
    assert_eq!(json["source_name"], "story.txt");
    assert_eq!(json["total_chars"], "Chapter 1: Dawn\nIt was early.\n".chars().count());
    assert_eq!(json["chapters"][0]["title"], "Chapter 1: Dawn");
    assert_eq!(json["chapters"][0]["unit"], "line");
}

#[test]
fn open_failures_are_typed() {
    let dir = tempfile::tempdir().unwrap();

    let missing = DocumentSession::open(dir.path().join("missing.epub")).unwrap_err();
    assert!(matches!(missing, DocumentError::NotFound(_)));

    let mobi = dir.path().join("book.mobi");
    fs::write(&mobi, b"BOOKMOBI").unwrap();
    let unsupported = DocumentSession::open(&mobi).unwrap_err();
    assert!(matches!(unsupported, DocumentError::UnsupportedFormat(ext) if ext == ".mobi"));

    let broken = dir.path().join("broken.epub");
    fs::write(&broken, b"not a zip").unwrap();
    let format = DocumentSession::open(&broken).unwrap_err();
    assert!(matches!(format, DocumentError::Format { .. }));
}
