//! Integration tests for the write-then-search pipeline.
//!
//! Each test writes through `SessionLog`/`CommandHistory` and reads back
//! through `Searcher`, the same path the REPL takes.

use chrono::{TimeZone, Utc};
use letsgo_core::{
    last_real_command, tag, CommandHistory, CoreError, LogLine, LogSettings, MatchMode,
    SearchOutcome, SearchQuery, SearchSource, Searcher, SessionId, SessionLog, WriterMode,
};
use std::fs;
use tempfile::tempdir;

// ============================================================================
// Helper Functions
// ============================================================================

fn session_at(secs: i64) -> SessionId {
    SessionId::from_time(Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap())
}

fn read_records(log: &std::path::Path) -> Vec<LogLine> {
    fs::read_to_string(log)
        .unwrap()
        .lines()
        .filter_map(LogLine::parse)
        .collect()
}

// ============================================================================
// Writer + Searcher
// ============================================================================

#[test]
fn test_session_turns_are_searchable() {
    let dir = tempdir().unwrap();
    let settings = LogSettings::new(dir.path());

    let log = SessionLog::open(&settings).unwrap();
    log.append(tag::USER, "/run ls");
    log.append(tag::ASSISTANT, "Cargo.toml");
    log.append(tag::USER, "hello");
    log.append(tag::ASSISTANT, "echo: hello");
    let path = log.path().to_path_buf();
    log.close();

    let records = read_records(&path);
    let tags: Vec<&str> = records.iter().map(|r| r.tag.as_str()).collect();
    assert_eq!(tags, vec!["session", "user", "assistant", "user", "assistant", "session"]);
    assert_eq!(records.first().unwrap().text, "start");
    assert_eq!(records.last().unwrap().text, "end");

    let searcher = Searcher::new(dir.path(), dir.path().join("history"));
    let query = SearchQuery::new(5).with_pattern("hello");
    let outcome = searcher.search(&query, SearchSource::AllLogs);
    assert_eq!(outcome.matches().len(), 2);
    assert!(outcome.matches()[0].ends_with("user:hello"));
    assert!(outcome.matches()[1].ends_with("assistant:echo: hello"));

    assert_eq!(last_real_command(dir.path()).as_deref(), Some("hello"));
}

#[test]
fn test_drop_writes_end_marker() {
    let dir = tempdir().unwrap();
    let path = {
        let log = SessionLog::open(&LogSettings::new(dir.path())).unwrap();
        log.append(tag::USER, "ls");
        log.path().to_path_buf()
    };

    let records = read_records(&path);
    assert_eq!(records.last().map(|r| (r.tag.as_str(), r.text.as_str())), Some(("session", "end")));
}

#[test]
fn test_search_spans_sessions_in_order() {
    let dir = tempdir().unwrap();
    let settings = LogSettings::new(dir.path());

    for (i, word) in ["first", "second", "third"].iter().enumerate() {
        let log = SessionLog::open_with_id(&settings, session_at(i as i64)).unwrap();
        log.append(tag::USER, word);
        log.close();
    }

    let searcher = Searcher::new(dir.path(), dir.path().join("history"));
    let query = SearchQuery::new(2)
        .with_pattern(r"user:\w+$")
        .with_mode(MatchMode::Regex);
    let outcome = searcher.search(&query, SearchSource::AllLogs);
    let texts: Vec<String> = outcome
        .matches()
        .iter()
        .filter_map(|line| LogLine::parse(line))
        .map(|r| r.text)
        .collect();
    assert_eq!(texts, vec!["second", "third"]);
}

// ============================================================================
// Strict mode
// ============================================================================

#[test]
fn test_strict_missing_dir() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");
    let err = SessionLog::open(&LogSettings::new(&missing)).unwrap_err();
    assert!(matches!(err, CoreError::LogDirMissing(_)));
    assert_eq!(err.to_string(), format!("Log directory {} does not exist", missing.display()));
}

#[test]
fn test_lenient_creates_dir() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("a/b");
    let settings = LogSettings::new(&nested).with_mode(WriterMode::Lenient);
    let log = SessionLog::open(&settings).unwrap();
    assert!(log.path().starts_with(&nested));
    assert!(log.path().exists());
}

#[test]
fn test_retention_keeps_newest() {
    let dir = tempdir().unwrap();
    let settings = LogSettings::new(dir.path()).with_max_log_files(2);

    for i in 0..4 {
        let log = SessionLog::open_with_id(&settings, session_at(i)).unwrap();
        log.close();
        // Distinct mtimes
        std::thread::sleep(std::time::Duration::from_millis(20));
    }

    let current = SessionLog::open_with_id(&settings, session_at(10)).unwrap();
    let remaining = current.list_sessions().unwrap();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().any(|f| f.path == current.path()));
}

// ============================================================================
// History
// ============================================================================

#[test]
fn test_history_search_and_listing() {
    let dir = tempdir().unwrap();
    let history = CommandHistory::new(dir.path().join("history"));
    for cmd in ["ls", "git status", "cargo fmt", "git log"] {
        history.append(cmd);
    }

    let searcher = Searcher::new(dir.path().join("log"), history.path());
    let query = SearchQuery::new(20).with_pattern("^git").with_mode(MatchMode::Regex);
    assert_eq!(
        searcher.search(&query, SearchSource::History).to_string(),
        "git status\ngit log"
    );
    assert_eq!(history.last(1), SearchOutcome::Matches(vec!["git log".to_string()]));
}
