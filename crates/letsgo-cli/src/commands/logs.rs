//! Log and history commands: `/summarize`, `/history`, `/search`, `/last`,
//! `/sessions`.

use super::{CommandContext, CommandHandler, Reply};
use async_trait::async_trait;
use chrono::SecondsFormat;
use letsgo_core::search::{DEFAULT_HISTORY_LIMIT, DEFAULT_SUMMARY_LIMIT};
use letsgo_core::{MatchMode, SearchOutcome, SearchQuery, SearchSource};

/// Parsed `/summarize` arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizeArgs {
    pub query: SearchQuery,
    pub source: SearchSource,
}

/// `[term...] [limit] [--history] [--regex]`. The last token is the limit
/// only when it is all digits; remaining tokens join into the term.
pub fn parse_summarize_args(args: &str) -> SummarizeArgs {
    let mut source = SearchSource::AllLogs;
    let mut mode = MatchMode::Substring;
    let mut words: Vec<&str> = Vec::new();

    for token in args.split_whitespace() {
        match token {
            "--history" => source = SearchSource::History,
            "--regex" => mode = MatchMode::Regex,
            word => words.push(word),
        }
    }

    let mut limit = DEFAULT_SUMMARY_LIMIT;
    if let Some(last) = words.last() {
        if !last.is_empty() && last.chars().all(|c| c.is_ascii_digit()) {
            // All digits, so only overflow can fail
            limit = last.parse().unwrap_or(usize::MAX);
            words.pop();
        }
    }

    let mut query = SearchQuery::new(limit).with_mode(mode);
    if !words.is_empty() {
        query = query.with_pattern(words.join(" "));
    }
    SummarizeArgs { query, source }
}

/// Color a search outcome: matches succeed, bad patterns fail, sentinels inform
pub fn outcome_reply(outcome: SearchOutcome) -> Reply {
    match outcome {
        SearchOutcome::Matches(_) => Reply::success(outcome.to_string()),
        SearchOutcome::InvalidPattern(_) => Reply::error(outcome.to_string()),
        SearchOutcome::NoMatches | SearchOutcome::NoSource(_) => Reply::info(outcome.to_string()),
    }
}

pub struct SummarizeCommand;

#[async_trait]
impl CommandHandler for SummarizeCommand {
    fn name(&self) -> &'static str {
        "summarize"
    }

    fn usage(&self) -> &'static str {
        "[term] [limit] [--history] [--regex]"
    }

    fn description(&self) -> &'static str {
        "Last matching lines from the session logs"
    }

    async fn handle(&self, args: &str, ctx: &CommandContext) -> anyhow::Result<Reply> {
        let SummarizeArgs { query, source } = parse_summarize_args(args);
        Ok(outcome_reply(ctx.searcher.search(&query, source)))
    }
}

pub struct HistoryCommand;

#[async_trait]
impl CommandHandler for HistoryCommand {
    fn name(&self) -> &'static str {
        "history"
    }

    fn usage(&self) -> &'static str {
        "[N]"
    }

    fn description(&self) -> &'static str {
        "Last N commands (default 20)"
    }

    async fn handle(&self, args: &str, ctx: &CommandContext) -> anyhow::Result<Reply> {
        let limit = if args.is_empty() {
            DEFAULT_HISTORY_LIMIT
        } else {
            match args.parse::<i64>() {
                Ok(n) => usize::try_from(n.max(0)).unwrap_or(usize::MAX),
                Err(_) => return Ok(Reply::error("usage: /history [N]")),
            }
        };
        Ok(outcome_reply(ctx.history.last(limit)))
    }
}

pub struct SearchCommand;

#[async_trait]
impl CommandHandler for SearchCommand {
    fn name(&self) -> &'static str {
        "search"
    }

    fn usage(&self) -> &'static str {
        "<pattern>"
    }

    fn description(&self) -> &'static str {
        "Regex search over command history"
    }

    async fn handle(&self, args: &str, ctx: &CommandContext) -> anyhow::Result<Reply> {
        if args.is_empty() {
            return Ok(Reply::error("usage: /search <pattern>"));
        }
        let query = SearchQuery::new(DEFAULT_HISTORY_LIMIT)
            .with_pattern(args)
            .with_mode(MatchMode::Regex);
        Ok(outcome_reply(ctx.searcher.search(&query, SearchSource::History)))
    }
}

pub struct LastCommand;

#[async_trait]
impl CommandHandler for LastCommand {
    fn name(&self) -> &'static str {
        "last"
    }

    fn description(&self) -> &'static str {
        "Most recent command before this one"
    }

    async fn handle(&self, _args: &str, ctx: &CommandContext) -> anyhow::Result<Reply> {
        // The invoking `/last` is already logged, so look one further back
        let recent = ctx.searcher.recent_commands(2);
        Ok(match recent.as_slice() {
            [previous, _] => Reply::success(previous.clone()),
            _ => Reply::info("no commands"),
        })
    }
}

pub struct SessionsCommand;

#[async_trait]
impl CommandHandler for SessionsCommand {
    fn name(&self) -> &'static str {
        "sessions"
    }

    fn description(&self) -> &'static str {
        "Session logs on disk, newest first"
    }

    async fn handle(&self, _args: &str, ctx: &CommandContext) -> anyhow::Result<Reply> {
        let sessions = ctx.log.list_sessions()?;
        if sessions.is_empty() {
            return Ok(Reply::info("no logs"));
        }

        let lines: Vec<String> = sessions
            .iter()
            .map(|session| {
                let name = session
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let marker = if session.path == ctx.log.path() { "*" } else { " " };
                format!(
                    "{} {}  {} bytes  {}",
                    marker,
                    name,
                    session.size,
                    session.modified.to_rfc3339_opts(SecondsFormat::Secs, true)
                )
            })
            .collect();
        Ok(Reply::info(lines.join("\n")))
    }
}
