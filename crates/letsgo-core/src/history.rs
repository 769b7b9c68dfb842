//! # Command History
//!
//! Append-only file of raw commands, one per line, no timestamps.

use crate::search::{SearchOutcome, SearchQuery, SearchSource, Searcher};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct CommandHistory {
    path: PathBuf,
}

impl CommandHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one command. Blank input and I/O failures are skipped.
    pub fn append(&self, command: &str) {
        let command = command.trim_end_matches(['\r', '\n']);
        if command.trim().is_empty() {
            return;
        }
        // One entry per line, so embedded newlines are flattened
        let entry = command.replace('\n', " ");

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(parent) {
                    warn!("Failed to create history directory {:?}: {}", parent, e);
                    return;
                }
            }
        }

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{}", entry));
        if let Err(e) = result {
            warn!("Failed to append to history {:?}: {}", self.path, e);
        }
    }

    /// Last `n` commands, oldest first
    pub fn last(&self, n: usize) -> SearchOutcome {
        self.searcher().search(&SearchQuery::new(n), SearchSource::History)
    }

    /// Every recorded command, for seeding the line editor
    pub fn entries(&self) -> Vec<String> {
        match fs::read(&self.path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes)
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    fn searcher(&self) -> Searcher {
        Searcher::new(PathBuf::new(), &self.path)
    }
}
