//! # letsgo Core
//!
//! Session logging and log/history search for the letsgo terminal companion.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   append    ┌──────────────┐   search   ┌──────────────┐
//! │  SessionLog  │ ──────────▶ │  <dir>/*.log │ ─────────▶ │   Searcher   │
//! └──────────────┘             └──────────────┘            └──────────────┘
//!                                                                 ▲
//! ┌──────────────┐   append    ┌──────────────┐                  │
//! │CommandHistory│ ──────────▶ │ history file │ ─────────────────┘
//! └──────────────┘             └──────────────┘
//! ```
//!
//! Data only flows one way: writers produce lines, the searcher reads them
//! back on demand. Nothing is shared at call time beyond the filesystem.

pub mod config;
pub mod history;
pub mod record;
pub mod search;
pub mod session;
pub mod tail;
pub mod writer;

pub use config::{ColorRole, ColorScheme, Config};
pub use history::CommandHistory;
pub use record::{tag, LogLine};
pub use search::{
    last_real_command, scan_lines, MatchMode, Matcher, ScanResult, SearchOutcome, SearchQuery,
    SearchSource, Searcher,
};
pub use session::SessionId;
pub use tail::BoundedTail;
pub use writer::{list_session_files, LogSettings, SessionFile, SessionLog, WriterMode};

use std::path::PathBuf;
use thiserror::Error;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Log directory {0} does not exist")]
    LogDirMissing(PathBuf),

    #[error("No write permission for {0}")]
    LogDirNotWritable(PathBuf),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
