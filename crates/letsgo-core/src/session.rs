//! # Session Identity
//!
//! A session is one run of the program. Its identifier is derived from the
//! UTC start time so that log filenames sort chronologically.

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};

/// Format used for session identifiers and log filenames
pub const SESSION_ID_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Extension of session log files
pub const LOG_EXTENSION: &str = "log";

/// Timestamp-derived, lexicographically sortable session identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Identifier for a session starting now
    pub fn now() -> Self {
        Self::from_time(Utc::now())
    }

    /// Identifier for a session started at `time`
    pub fn from_time(time: DateTime<Utc>) -> Self {
        Self(time.format(SESSION_ID_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of this session's log file inside `dir`
    pub fn log_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.{}", self.0, LOG_EXTENSION))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether `path` looks like a session log file
pub fn is_log_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == LOG_EXTENSION)
}
