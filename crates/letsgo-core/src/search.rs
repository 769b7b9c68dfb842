//! # Log/History Search
//!
//! Returns the last N lines matching a pattern from either every session log
//! (concatenated in filename order) or the command-history file.
//!
//! The scan is a single front-to-back pass feeding a [`BoundedTail`], so at
//! most `limit` matches are held in memory regardless of how large the source
//! is. Files are streamed line by line and never read whole.

use crate::record::{tag, LogLine};
use crate::session::is_log_file;
use crate::tail::BoundedTail;
use regex::Regex;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default limit for plain log summarization
pub const DEFAULT_SUMMARY_LIMIT: usize = 5;

/// Default limit for history listing and history search
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Where lines come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchSource {
    /// Every session log, in filename (= chronological) order
    AllLogs,
    /// The raw command-history file
    History,
}

/// How a pattern is matched against a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Plain substring containment
    #[default]
    Substring,
    /// Regular expression, matched anywhere in the line
    Regex,
}

/// Parameters of one search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub pattern: Option<String>,
    pub limit: usize,
    pub mode: MatchMode,
}

impl SearchQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            pattern: None,
            limit,
            mode: MatchMode::default(),
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }
}

/// A compiled pattern
#[derive(Debug, Clone)]
pub enum Matcher {
    Any,
    Substring(String),
    Regex(Regex),
}

impl Matcher {
    pub fn compile(pattern: Option<&str>, mode: MatchMode) -> Result<Self, regex::Error> {
        Ok(match (pattern, mode) {
            (None, _) => Matcher::Any,
            (Some(p), MatchMode::Substring) => Matcher::Substring(p.to_string()),
            (Some(p), MatchMode::Regex) => Matcher::Regex(Regex::new(p)?),
        })
    }

    pub fn is_match(&self, line: &str) -> bool {
        match self {
            Matcher::Any => true,
            Matcher::Substring(term) => line.contains(term.as_str()),
            Matcher::Regex(re) => re.is_match(line),
        }
    }
}

/// Result of a search. Sentinels are values, never errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Retained matches, oldest first
    Matches(Vec<String>),
    /// The source had lines but none were retained
    NoMatches,
    /// The source is missing or holds no lines at all
    NoSource(SearchSource),
    /// The pattern did not compile
    InvalidPattern(String),
}

impl SearchOutcome {
    pub fn matches(&self) -> &[String] {
        match self {
            SearchOutcome::Matches(lines) => lines,
            _ => &[],
        }
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchOutcome::Matches(lines) => f.write_str(&lines.join("\n")),
            SearchOutcome::NoMatches => f.write_str("no matches"),
            SearchOutcome::NoSource(SearchSource::AllLogs) => f.write_str("no logs"),
            SearchOutcome::NoSource(SearchSource::History) => f.write_str("no history"),
            SearchOutcome::InvalidPattern(reason) => write!(f, "invalid pattern: {}", reason),
        }
    }
}

/// Outcome of scanning a line sequence
#[derive(Debug)]
pub struct ScanResult {
    /// Number of lines read from the source
    pub lines_seen: usize,
    /// Retained matches
    pub tail: BoundedTail<String>,
}

impl ScanResult {
    pub fn into_outcome(self, source: SearchSource) -> SearchOutcome {
        if self.lines_seen == 0 {
            SearchOutcome::NoSource(source)
        } else if self.tail.is_empty() {
            SearchOutcome::NoMatches
        } else {
            SearchOutcome::Matches(self.tail.into_vec())
        }
    }
}

/// Scan `lines` once, keeping the last `limit` that satisfy `matcher`
pub fn scan_lines<I>(lines: I, matcher: &Matcher, limit: usize) -> ScanResult
where
    I: IntoIterator<Item = String>,
{
    let mut tail = BoundedTail::new(limit);
    let mut lines_seen = 0;
    for line in lines {
        lines_seen += 1;
        if matcher.is_match(&line) {
            tail.push(line);
        }
    }
    ScanResult { lines_seen, tail }
}

/// Read-only view over the log directory and history file
#[derive(Debug, Clone)]
pub struct Searcher {
    log_dir: PathBuf,
    history_file: PathBuf,
}

impl Searcher {
    pub fn new(log_dir: impl Into<PathBuf>, history_file: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            history_file: history_file.into(),
        }
    }

    /// Last `query.limit` lines of `source` matching `query.pattern`
    pub fn search(&self, query: &SearchQuery, source: SearchSource) -> SearchOutcome {
        let Some(paths) = self.resolve(source) else {
            return SearchOutcome::NoSource(source);
        };

        let matcher = match Matcher::compile(query.pattern.as_deref(), query.mode) {
            Ok(matcher) => matcher,
            Err(e) => return SearchOutcome::InvalidPattern(describe_regex_error(&e)),
        };

        debug!(
            "Searching {:?} ({} files) for {:?}, limit {}",
            source,
            paths.len(),
            query.pattern,
            query.limit
        );
        scan_lines(lines_of(paths), &matcher, query.limit).into_outcome(source)
    }

    /// Text of the most recent record tagged as genuine user input
    pub fn last_real_command(&self) -> Option<String> {
        self.recent_commands(1).pop()
    }

    /// Last `limit` genuine user inputs from the logs, oldest first.
    /// Synthetic tags such as `johny_user` never qualify.
    pub fn recent_commands(&self, limit: usize) -> Vec<String> {
        let Some(paths) = self.resolve(SearchSource::AllLogs) else {
            return Vec::new();
        };
        let mut tail = BoundedTail::new(limit);
        for line in lines_of(paths) {
            if let Some(record) = LogLine::parse(&line) {
                if record.tag == tag::USER {
                    tail.push(record.text);
                }
            }
        }
        tail.into_vec()
    }

    /// Ordered files backing `source`, or `None` when the source is absent
    fn resolve(&self, source: SearchSource) -> Option<Vec<PathBuf>> {
        match source {
            SearchSource::AllLogs => {
                if !self.log_dir.is_dir() {
                    return None;
                }
                let entries = match fs::read_dir(&self.log_dir) {
                    Ok(entries) => entries,
                    Err(e) => {
                        warn!("Cannot read log directory {:?}: {}", self.log_dir, e);
                        return None;
                    }
                };
                let mut paths: Vec<PathBuf> = entries
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|path| is_log_file(path))
                    .collect();
                paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
                Some(paths)
            }
            SearchSource::History => {
                if self.history_file.is_file() {
                    Some(vec![self.history_file.clone()])
                } else {
                    None
                }
            }
        }
    }
}

/// Most recent user command recorded in the logs under `log_dir`
pub fn last_real_command(log_dir: &Path) -> Option<String> {
    Searcher::new(log_dir, PathBuf::new()).last_real_command()
}

/// Lazily stream the lines of each file in order
fn lines_of(paths: Vec<PathBuf>) -> impl Iterator<Item = String> {
    paths.into_iter().filter_map(open_lines).flatten()
}

fn open_lines(path: PathBuf) -> Option<FileLines> {
    match File::open(&path) {
        Ok(file) => Some(FileLines {
            reader: BufReader::new(file),
            path,
            buf: Vec::new(),
        }),
        Err(e) => {
            warn!("Skipping unreadable file {:?}: {}", path, e);
            None
        }
    }
}

/// Line iterator over one file. Invalid UTF-8 is replaced, not fatal.
struct FileLines {
    reader: BufReader<File>,
    path: PathBuf,
    buf: Vec<u8>,
}

impl Iterator for FileLines {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') {
                    self.buf.pop();
                }
                Some(String::from_utf8_lossy(&self.buf).into_owned())
            }
            Err(e) => {
                warn!("Stopped reading {:?}: {}", self.path, e);
                None
            }
        }
    }
}

fn describe_regex_error(err: &regex::Error) -> String {
    let text = err.to_string();
    text.lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim().trim_start_matches("error: ").to_string())
        .unwrap_or(text)
}
