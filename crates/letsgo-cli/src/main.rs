//! # letsgo
//!
//! Terminal companion: every exchange goes to a per-session log that the
//! slash commands can search back through.

mod calc;
mod cli;
mod commands;
mod jobs;
mod render;
mod repl;
mod shell;
mod status;

use clap::Parser;
use letsgo_core::search::DEFAULT_HISTORY_LIMIT;
use letsgo_core::{
    CommandHistory, Config, CoreError, LogSettings, MatchMode, SearchQuery, SearchSource, Searcher,
    SessionLog, WriterMode,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use cli::{Cli, Commands};
use commands::{logs, CommandContext, CommandRegistry, Personas};
use jobs::JobTable;

/// Exit status when the log directory is unusable (EX_CONFIG)
const EXIT_LOG_DIR: u8 = 78;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Default to warn to keep output clean; diagnostics never mix with stdout
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.log_dir {
        config.log_dir = dir.clone();
    }
    if let Some(path) = &cli.history_file {
        config.history_file = path.clone();
    }
    if let Some(max) = cli.max_log_files {
        config.max_log_files = max;
    }
    if cli.no_color {
        config.colors.enabled = false;
    }
    render::init_colors(&config.colors);

    let searcher = Searcher::new(&config.log_dir, &config.history_file);

    match cli.command {
        Some(Commands::Summarize {
            term,
            limit,
            history,
            regex,
        }) => {
            let mut query = SearchQuery::new(limit);
            if !term.is_empty() {
                query = query.with_pattern(term.join(" "));
            }
            if regex {
                query = query.with_mode(MatchMode::Regex);
            }
            let source = if history {
                SearchSource::History
            } else {
                SearchSource::AllLogs
            };
            print_outcome(&config, logs::outcome_reply(searcher.search(&query, source)));
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::History { count }) => {
            let limit = count
                .map(|n| usize::try_from(n.max(0)).unwrap_or(usize::MAX))
                .unwrap_or(DEFAULT_HISTORY_LIMIT);
            let history = CommandHistory::new(&config.history_file);
            print_outcome(&config, logs::outcome_reply(history.last(limit)));
            Ok(ExitCode::SUCCESS)
        }
        None => {
            let mode = if cli.lenient {
                WriterMode::Lenient
            } else {
                WriterMode::Strict
            };
            let settings = LogSettings::new(&config.log_dir)
                .with_mode(mode)
                .with_max_log_files(config.max_log_files);

            let log = match SessionLog::open(&settings) {
                Ok(log) => log,
                Err(e @ (CoreError::LogDirMissing(_) | CoreError::LogDirNotWritable(_))) => {
                    render::print_error(&config.colors, &format!("letsgo: {}", e));
                    return Ok(ExitCode::from(EXIT_LOG_DIR));
                }
                Err(e) => return Err(e.into()),
            };

            let ctx = CommandContext {
                log,
                history: CommandHistory::new(&config.history_file),
                searcher,
                personas: Personas::from_env(),
                colors: config.colors.clone(),
                run_timeout: shell::RUN_TIMEOUT,
                jobs: Arc::new(JobTable::new()),
            };
            let persona = cli.persona.map(Into::into);
            repl::Repl::new(ctx, CommandRegistry::with_defaults(), persona, config.prompt)
                .run()
                .await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_outcome(config: &Config, reply: commands::Reply) {
    render::print_reply(&config.colors, &reply.text, reply.role);
}
