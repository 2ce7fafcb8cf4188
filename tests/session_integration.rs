//! End-to-end session tests against real files: autosave, undo, export,
//! schemes, encodings.

use annotag::command::{Target, Transaction};
use annotag::document::read_document;
use annotag::{AnnotatorConfig, CursorPosition, Error, Session, TextEncoding, HISTORY_CAPACITY};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn setup(name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write test file");
    (dir, path)
}

fn config_in(dir: &Path) -> AnnotatorConfig {
    AnnotatorConfig {
        scheme_dir: dir.join("configs"),
        ..AnnotatorConfig::default()
    }
}

fn select(line: u32, start: u32, end: u32, key: char) -> Transaction {
    Transaction::Key {
        target: Target::Selection {
            start: CursorPosition::new(line, start),
            end: CursorPosition::new(line, end),
        },
        key,
    }
}

fn at(line: u32, column: u32, key: char) -> Transaction {
    Transaction::Key {
        target: Target::Cursor(CursorPosition::new(line, column)),
        key,
    }
}

// =============================================================================
// Autosave and undo
// =============================================================================

#[test]
fn test_mutate_autosaves_ann_file() {
    let (dir, path) = setup("news.txt", "Obama met Merkel.\nObama left.\n");
    let mut session = Session::open(&path, config_in(dir.path())).unwrap();

    let (text, cursor) = session.mutate(&select(1, 0, 5, 'f')).unwrap();
    assert_eq!(text, "[@Obama#Person*] met Merkel.\n[$Obama#Person*] left.\n");
    assert_eq!(cursor, CursorPosition::new(1, 16));

    let ann = dir.path().join("news.txt.ann");
    assert_eq!(session.path(), Some(ann.as_path()));
    assert_eq!(fs::read_to_string(&ann).unwrap(), session.text());
    // The source is never overwritten.
    assert_eq!(fs::read_to_string(&path).unwrap(), "Obama met Merkel.\nObama left.\n");
}

#[test]
fn test_undo_rewrites_ann_file() {
    let (dir, path) = setup("news.txt", "Obama met Merkel.\n");
    let mut session = Session::open(&path, config_in(dir.path())).unwrap();
    session.mutate(&select(1, 10, 16, 'd')).unwrap();
    assert_eq!(session.history_len(), 1);

    let (text, _) = session.undo().unwrap();
    assert_eq!(text, "Obama met Merkel.\n");
    let ann = dir.path().join("news.txt.ann");
    assert_eq!(fs::read_to_string(ann).unwrap(), "Obama met Merkel.\n");
    assert!(matches!(session.undo(), Err(Error::EmptyHistory)));
}

#[test]
fn test_autosave_off_writes_nothing() {
    let (dir, path) = setup("news.txt", "Obama spoke\n");
    let config = AnnotatorConfig {
        autosave: false,
        ..config_in(dir.path())
    };
    let mut session = Session::open(&path, config).unwrap();
    session.mutate(&select(1, 0, 5, 'f')).unwrap();
    assert!(!dir.path().join("news.txt.ann").exists());
    assert_eq!(session.path(), Some(path.as_path()));
}

#[test]
fn test_history_keeps_last_twenty() {
    let config = AnnotatorConfig {
        autosave: false,
        ..AnnotatorConfig::default()
    };
    let mut session = Session::from_text("Obama", config);
    for i in 0..25 {
        let tx = if i % 2 == 0 { select(1, 0, 5, 'f') } else { at(1, 2, 'q') };
        session.mutate(&tx).unwrap();
    }
    assert_eq!(session.text(), "[@Obama#Person*]");
    assert_eq!(session.history_len(), HISTORY_CAPACITY);

    for _ in 0..HISTORY_CAPACITY {
        session.undo().unwrap();
    }
    assert!(matches!(session.undo(), Err(Error::EmptyHistory)));
    // Oldest five snapshots were evicted; the earliest kept one is after
    // the fifth edit.
    assert_eq!(session.text(), "[@Obama#Person*]");
}

// =============================================================================
// Typed commands and recommendation toggle
// =============================================================================

#[test]
fn test_typed_command_through_session() {
    let (dir, path) = setup("city.txt", "ObamaBerlin!\nnext\n");
    let mut session = Session::open(&path, config_in(dir.path())).unwrap();
    let tx = Transaction::Typed {
        cursor: CursorPosition::START,
        command: "5f6d".to_string(),
    };
    let (text, _) = session.mutate(&tx).unwrap();
    assert_eq!(text, "[@Obama#Person*][@Berlin#Location*]!\nnext\n");

    let bad = Transaction::Typed {
        cursor: CursorPosition::new(2, 0),
        command: "2f3z".to_string(),
    };
    assert!(matches!(session.mutate(&bad), Err(Error::UnknownCommand('z'))));
    assert_eq!(session.history_len(), 1);
}

#[test]
fn test_toggle_recommend() {
    let (dir, path) = setup("news.txt", "Obama met Merkel.\nObama left.\n");
    let mut session = Session::open(&path, config_in(dir.path())).unwrap();
    session.mutate(&select(1, 0, 5, 'f')).unwrap();

    let text = session.toggle_recommend(false).unwrap();
    assert_eq!(text, "[@Obama#Person*] met Merkel.\nObama left.\n");
    assert_eq!(session.cursor(), CursorPosition::START);
    assert!(!session.config().recommend);
    assert_eq!(session.history_len(), 1);

    let text = session.toggle_recommend(true).unwrap();
    assert_eq!(text, "[@Obama#Person*] met Merkel.\n[$Obama#Person*] left.\n");
    assert_eq!(session.history_len(), 1);
}

#[test]
fn test_confirm_suggestion() {
    let (dir, path) = setup("news.txt", "Obama met Merkel.\nObama left.\n");
    let mut session = Session::open(&path, config_in(dir.path())).unwrap();
    session.mutate(&select(1, 0, 5, 'f')).unwrap();

    let (text, _) = session.mutate(&at(2, 3, 'y')).unwrap();
    assert_eq!(text, "[@Obama#Person*] met Merkel.\n[@Obama#Person*] left.\n");
}

// =============================================================================
// Export
// =============================================================================

#[test]
fn test_export_next_to_ann() {
    let (dir, path) = setup("news.txt", "Obama met Merkel.\nObama left.\n");
    let mut session = Session::open(&path, config_in(dir.path())).unwrap();
    session.mutate(&select(1, 0, 5, 'f')).unwrap();

    let summary = session.export().unwrap();
    assert_eq!(summary.path, dir.path().join("news.txt.anns"));
    assert_eq!(summary.line_count, 2);
    assert_eq!(
        fs::read_to_string(&summary.path).unwrap(),
        "Obama S-Person\nmet O\nMerkel. O\n\nObama S-Person\nleft. O\n\n"
    );
}

#[test]
fn test_export_rejects_other_extensions() {
    let (dir, path) = setup("news.md", "Obama\n");
    let session = Session::open(&path, config_in(dir.path())).unwrap();
    assert!(matches!(session.export(), Err(Error::ExportExtension(_))));
    assert!(!dir.path().join("news.md.anns").exists());
}

#[test]
fn test_in_memory_session_cannot_export() {
    let session = Session::from_text("Obama", AnnotatorConfig::default());
    assert!(matches!(session.export(), Err(Error::Config(_))));
}

// =============================================================================
// Schemes
// =============================================================================

#[test]
fn test_open_with_named_scheme() {
    let (dir, path) = setup("news.txt", "Obama spoke\n");
    fs::create_dir_all(dir.path().join("configs")).unwrap();
    fs::write(dir.path().join("configs/news.toml"), "p = \"Person\"\n").unwrap();
    let config = AnnotatorConfig {
        scheme: "news".to_string(),
        ..config_in(dir.path())
    };

    let mut session = Session::open(&path, config).unwrap();
    assert_eq!(session.commands().get('p'), Some("Person"));
    assert!(matches!(
        session.mutate(&select(1, 0, 5, 'f')),
        Err(Error::UnknownCommand('f'))
    ));
    let (text, _) = session.mutate(&select(1, 0, 5, 'P')).unwrap();
    assert_eq!(text, "[@Obama#Person*] spoke\n");
}

#[test]
fn test_missing_scheme_fails_open() {
    let (dir, path) = setup("news.txt", "Obama\n");
    let config = AnnotatorConfig {
        scheme: "absent".to_string(),
        ..config_in(dir.path())
    };
    assert!(matches!(Session::open(&path, config), Err(Error::Config(_))));
}

#[test]
fn test_save_and_switch_scheme() {
    let (dir, path) = setup("news.txt", "Obama\n");
    let mut session = Session::open(&path, config_in(dir.path())).unwrap();
    let saved = session.save_scheme("copy").unwrap();
    assert_eq!(saved, dir.path().join("configs/copy.toml"));

    session.load_scheme("copy").unwrap();
    assert_eq!(session.config().scheme, "copy");
    assert_eq!(session.commands().get('f'), Some("Person"));
}

// =============================================================================
// Encodings
// =============================================================================

#[test]
fn test_utf16_document_keeps_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("zh.txt");
    fs::write(&path, TextEncoding::Utf16Le.encode("Obama 北京\n")).unwrap();

    let mut session = Session::open(&path, config_in(dir.path())).unwrap();
    assert_eq!(session.encoding(), TextEncoding::Utf16Le);
    session.mutate(&select(1, 6, 8, 'd')).unwrap();

    let (text, encoding) = read_document(&dir.path().join("zh.txt.ann")).unwrap();
    assert_eq!(text, "Obama [@北京#Location*]\n");
    assert_eq!(encoding, TextEncoding::Utf16Le);
}

#[test]
fn test_invalid_utf8_opens_lossily() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.txt");
    fs::write(&path, b"Obama \xff spoke\n").unwrap();

    let session = Session::open(&path, config_in(dir.path())).unwrap();
    assert!(session.text().contains('\u{FFFD}'));
    assert!(session.text().starts_with("Obama "));
}
