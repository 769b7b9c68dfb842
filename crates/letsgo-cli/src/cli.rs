//! # CLI Arguments
//!
//! Command-line argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use letsgo_personas::PersonaKind;
use std::path::PathBuf;

/// letsgo - terminal companion with searchable session logs
#[derive(Parser, Debug)]
#[command(name = "letsgo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: ./.letsgo.toml, then the user config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for session logs
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Command history file
    #[arg(long, value_name = "PATH")]
    pub history_file: Option<PathBuf>,

    /// Session logs kept after pruning
    #[arg(long, value_name = "N")]
    pub max_log_files: Option<usize>,

    /// Create the log directory if needed and never prune
    #[arg(long)]
    pub lenient: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Forward plain input to a persona instead of echoing it
    #[arg(long, value_enum)]
    pub persona: Option<PersonaChoice>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the last matching lines from the session logs and exit
    Summarize {
        /// Text to look for (all lines when omitted)
        term: Vec<String>,

        /// Number of lines to show
        #[arg(short = 'n', long, default_value_t = letsgo_core::search::DEFAULT_SUMMARY_LIMIT)]
        limit: usize,

        /// Search the command history instead of the logs
        #[arg(long)]
        history: bool,

        /// Treat the term as a regular expression
        #[arg(long)]
        regex: bool,
    },

    /// Print the last N commands and exit
    History {
        /// Number of commands
        #[arg(allow_negative_numbers = true)]
        count: Option<i64>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PersonaChoice {
    Johny,
    Tony,
}

impl From<PersonaChoice> for PersonaKind {
    fn from(choice: PersonaChoice) -> Self {
        match choice {
            PersonaChoice::Johny => PersonaKind::Johny,
            PersonaChoice::Tony => PersonaKind::Tony,
        }
    }
}
