//! Tests for match records on disk.

mod common;

use std::fs;
use tempfile::TempDir;

use common::MemoryStore;
use strictly_chess::{
    ChessMove, FsRecordStore, RecordHeaders, RecordStore, RecordedMove, SessionRecorder,
};

fn recorded(uci: &str, san: &str) -> RecordedMove {
    let mv: ChessMove = uci.parse().expect("valid uci");
    RecordedMove::new(mv, san.to_string())
}

fn recorder_in(dir: &std::path::Path) -> SessionRecorder {
    SessionRecorder::new(
        RecordHeaders::new("2026.10.16", "Player", "AI"),
        None,
        Box::new(FsRecordStore::new(dir)),
    )
}

#[test]
fn test_persist_writes_pgn_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let games = dir.path().join("games");
    let mut recorder = recorder_in(&games);
    recorder.append(recorded("e2e4", "e4"));

    let path = recorder.persist().expect("persist");

    assert_eq!(path.parent(), Some(games.as_path()));
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pgn"));
    let name = path.file_name().and_then(|n| n.to_str()).expect("file name");
    assert!(name.starts_with("game_"));
    let contents = fs::read_to_string(&path).expect("read record");
    assert!(contents.contains("[White \"Player\"]"));
    assert!(contents.contains("1. e4 *"));
    assert_eq!(recorder.persisted(), 1);
}

#[test]
fn test_reset_removes_only_records() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join("game_old.pgn"), "old").expect("Write failed");
    fs::write(dir.path().join("game_older.pgn"), "older").expect("Write failed");
    fs::write(dir.path().join("notes.txt"), "keep me").expect("Write failed");
    let mut recorder = recorder_in(dir.path());

    let removed = recorder.reset_for_new_session().expect("reset");

    assert_eq!(removed, 2);
    assert!(!dir.path().join("game_old.pgn").exists());
    assert!(dir.path().join("notes.txt").exists());
}

#[test]
fn test_reset_without_directory_is_noop() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut recorder = recorder_in(&dir.path().join("missing"));

    assert_eq!(recorder.reset_for_new_session().expect("reset"), 0);
}

#[test]
fn test_reset_refused_after_first_move() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join("game_old.pgn"), "old").expect("Write failed");
    let mut recorder = recorder_in(dir.path());
    recorder.append(recorded("e2e4", "e4"));

    assert!(recorder.reset_for_new_session().is_err());
    assert!(dir.path().join("game_old.pgn").exists());
}

#[test]
fn test_failed_persist_keeps_history_for_next_write() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    // A file where the directory should be makes every write fail.
    let blocked = dir.path().join("blocked");
    fs::write(&blocked, "not a directory").expect("Write failed");
    let mut recorder = recorder_in(&blocked);
    recorder.append(recorded("e2e4", "e4"));

    assert!(recorder.persist().is_err());
    assert_eq!(recorder.persisted(), 0);
    assert_eq!(recorder.len(), 1);
}

#[test]
fn test_result_update_keeps_moves() {
    let store = MemoryStore::new();
    let mut recorder = SessionRecorder::new(
        RecordHeaders::new("2026.10.16", "Player", "AI"),
        None,
        Box::new(store.clone()),
    );
    recorder.append(recorded("f2f3", "f3"));
    recorder.append(recorded("e7e5", "e5"));
    recorder.set_result("0-1");
    recorder.persist().expect("persist");

    let contents = store.last_contents().expect("written");
    assert!(contents.contains("[Result \"0-1\"]"));
    assert!(contents.ends_with("1. f3 e5 0-1\n"));
}

#[test]
fn test_store_write_creates_directory() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let nested = dir.path().join("a").join("b");
    let mut store = FsRecordStore::new(&nested);

    let path = store.write("game_x.pgn", "contents").expect("write");

    assert_eq!(fs::read_to_string(path).expect("read"), "contents");
    assert_eq!(store.dir(), nested.as_path());
}
