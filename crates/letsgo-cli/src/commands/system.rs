//! System commands: `/status`, `/time`, `/run`, `/calc`, `/ping`.

use super::{CommandContext, CommandHandler, Reply};
use crate::calc;
use crate::shell::{exit_status, run_shell, ShellOutcome};
use crate::status::status_report;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};

pub struct StatusCommand;

#[async_trait]
impl CommandHandler for StatusCommand {
    fn name(&self) -> &'static str {
        "status"
    }

    fn description(&self) -> &'static str {
        "CPU cores, uptime and IP address"
    }

    async fn handle(&self, _args: &str, _ctx: &CommandContext) -> anyhow::Result<Reply> {
        Ok(Reply::success(status_report()))
    }
}

pub struct TimeCommand;

#[async_trait]
impl CommandHandler for TimeCommand {
    fn name(&self) -> &'static str {
        "time"
    }

    fn description(&self) -> &'static str {
        "Current UTC time"
    }

    async fn handle(&self, _args: &str, _ctx: &CommandContext) -> anyhow::Result<Reply> {
        Ok(Reply::success(
            Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        ))
    }
}

pub struct RunCommand;

#[async_trait]
impl CommandHandler for RunCommand {
    fn name(&self) -> &'static str {
        "run"
    }

    fn usage(&self) -> &'static str {
        "<cmd>"
    }

    fn description(&self) -> &'static str {
        "Run a shell command (10s limit)"
    }

    async fn handle(&self, args: &str, ctx: &CommandContext) -> anyhow::Result<Reply> {
        if args.is_empty() {
            return Ok(Reply::error("usage: /run <cmd>"));
        }

        let mut print_line = |line: &str| println!("{}", line);
        let outcome = run_shell(args, ctx.run_timeout, Some(&mut print_line)).await;

        // Output lines were printed while streaming; only the status remains
        Ok(match &outcome {
            ShellOutcome::Completed { .. } => Reply::success(outcome.describe()).with_display(""),
            ShellOutcome::Failed { code, .. } => {
                Reply::error(outcome.describe()).with_display(exit_status(*code))
            }
            ShellOutcome::SpawnFailed(_) | ShellOutcome::TimedOut(_) => {
                Reply::error(outcome.describe())
            }
        })
    }
}

pub struct CalcCommand;

#[async_trait]
impl CommandHandler for CalcCommand {
    fn name(&self) -> &'static str {
        "calc"
    }

    fn usage(&self) -> &'static str {
        "<expr>"
    }

    fn description(&self) -> &'static str {
        "Evaluate arithmetic: + - * / % ** ( )"
    }

    async fn handle(&self, args: &str, _ctx: &CommandContext) -> anyhow::Result<Reply> {
        Ok(match calc::evaluate(args) {
            Ok(value) => Reply::success(calc::format_number(value)),
            Err(e) => Reply::error(format!("error: {}", e)),
        })
    }
}

pub struct PingCommand;

#[async_trait]
impl CommandHandler for PingCommand {
    fn name(&self) -> &'static str {
        "ping"
    }

    fn description(&self) -> &'static str {
        "Reply with pong"
    }

    async fn handle(&self, _args: &str, _ctx: &CommandContext) -> anyhow::Result<Reply> {
        Ok(Reply::success("pong"))
    }
}
