//! # Session Log Writer
//!
//! Appends timestamped records to the current session's log file.
//!
//! The writer is an explicit object with a lifecycle: [`SessionLog::open`]
//! at startup, [`SessionLog::close`] at shutdown. Dropping an unclosed log
//! closes it, so the end marker is written on every exit path.
//!
//! Every [`SessionLog::append`] opens the file in append mode, writes one line
//! and flushes before returning. Nothing is buffered across calls.

use crate::record::{tag, LogLine};
use crate::session::{is_log_file, SessionId};
use crate::{CoreError, Result};
use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How strictly the writer treats its target directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriterMode {
    /// Create the directory if needed, never fail, never prune
    Lenient,
    /// Require an existing writable directory, prune old sessions on open
    #[default]
    Strict,
}

/// Settings for opening a session log
#[derive(Debug, Clone)]
pub struct LogSettings {
    pub dir: PathBuf,
    pub mode: WriterMode,
    /// Maximum number of session logs kept after pruning (strict mode)
    pub max_log_files: usize,
}

impl LogSettings {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            mode: WriterMode::default(),
            max_log_files: crate::config::DEFAULT_MAX_LOG_FILES,
        }
    }

    pub fn with_mode(mut self, mode: WriterMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_log_files(mut self, max: usize) -> Self {
        self.max_log_files = max;
        self
    }
}

/// A session log file on disk
#[derive(Debug, Clone)]
pub struct SessionFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// Logger for the current session
#[derive(Debug)]
pub struct SessionLog {
    id: SessionId,
    dir: PathBuf,
    path: PathBuf,
    closed: bool,
}

impl SessionLog {
    /// Open a log for a session starting now
    pub fn open(settings: &LogSettings) -> Result<Self> {
        Self::open_with_id(settings, SessionId::now())
    }

    /// Open a log for the given session
    pub fn open_with_id(settings: &LogSettings, id: SessionId) -> Result<Self> {
        let dir = settings.dir.clone();

        match settings.mode {
            WriterMode::Lenient => {
                if let Err(e) = fs::create_dir_all(&dir) {
                    warn!("Failed to create log directory {:?}: {}", dir, e);
                }
            }
            WriterMode::Strict => ensure_log_dir(&dir)?,
        }

        let path = id.log_path(&dir);
        let log = Self {
            id,
            dir,
            path,
            closed: false,
        };

        if settings.mode == WriterMode::Strict {
            // Creating the file is the real writability check
            if let Err(e) = OpenOptions::new().create(true).append(true).open(&log.path) {
                return Err(open_error(&log.dir, e));
            }
            log.prune(settings.max_log_files);
        }

        log.append(tag::SESSION, "start");
        info!("Session log started: {:?}", log.path);
        Ok(log)
    }

    pub fn session_id(&self) -> &SessionId {
        &self.id
    }

    /// Path to the current session log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding all session logs
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Append one record. I/O failures are traced, never returned.
    pub fn append(&self, tag: &str, text: &str) {
        if let Err(e) = self.write_line(&LogLine::now(tag, text)) {
            warn!("Failed to append to {:?}: {}", self.path, e);
        }
    }

    /// Write the end marker and release the log
    pub fn close(mut self) {
        self.finish();
    }

    /// All session logs in the directory, newest first
    pub fn list_sessions(&self) -> io::Result<Vec<SessionFile>> {
        list_session_files(&self.dir)
    }

    /// Delete the oldest session logs beyond `max_files`.
    ///
    /// Pruning is advisory: a file that cannot be listed or removed is
    /// traced and skipped, and the session starts regardless. The current
    /// session's file is never removed. Returns how many files were deleted.
    pub fn prune(&self, max_files: usize) -> usize {
        let sessions = match list_session_files(&self.dir) {
            Ok(sessions) => sessions,
            Err(e) => {
                debug!("Skipping log pruning, cannot list {:?}: {}", self.dir, e);
                return 0;
            }
        };

        let mut removed = 0;
        for old in sessions.iter().skip(max_files) {
            if old.path == self.path {
                continue;
            }
            if let Err(e) = fs::remove_file(&old.path) {
                warn!("Failed to delete old log {:?}: {}", old.path, e);
            } else {
                info!("Deleted old session log: {:?}", old.path);
                removed += 1;
            }
        }
        removed
    }

    fn write_line(&self, line: &LogLine) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", line)?;
        file.flush()
    }

    fn finish(&mut self) {
        if !self.closed {
            self.closed = true;
            self.append(tag::SESSION, "end");
            debug!("Session log closed: {:?}", self.path);
        }
    }
}

impl Drop for SessionLog {
    fn drop(&mut self) {
        self.finish();
    }
}

/// A failed test write; permission and read-only media both mean "not writable"
fn open_error(dir: &Path, e: io::Error) -> CoreError {
    match e.kind() {
        io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
            CoreError::LogDirNotWritable(dir.to_path_buf())
        }
        _ => CoreError::IoError(e),
    }
}

/// Verify that the log directory exists and is writable
fn ensure_log_dir(dir: &Path) -> Result<()> {
    let metadata = match fs::metadata(dir) {
        Ok(metadata) if metadata.is_dir() => metadata,
        _ => return Err(CoreError::LogDirMissing(dir.to_path_buf())),
    };
    if metadata.permissions().readonly() {
        return Err(CoreError::LogDirNotWritable(dir.to_path_buf()));
    }
    Ok(())
}

/// List session logs in `dir`, newest first
pub fn list_session_files(dir: &Path) -> io::Result<Vec<SessionFile>> {
    let mut sessions = Vec::new();

    if !dir.exists() {
        return Ok(sessions);
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !is_log_file(&path) {
            continue;
        }
        if let Ok(metadata) = entry.metadata() {
            let modified: DateTime<Utc> = metadata
                .modified()
                .unwrap_or(std::time::UNIX_EPOCH)
                .into();
            sessions.push(SessionFile {
                path,
                size: metadata.len(),
                modified,
            });
        }
    }

    // Newest first; filename breaks ties between files touched in the same instant
    sessions.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.path.cmp(&a.path)));
    Ok(sessions)
}
