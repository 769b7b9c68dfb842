//! Background job commands: `/bg` and `/jobs`.

use super::{CommandContext, CommandHandler, Reply};
use crate::jobs::JOB_TIMEOUT;
use async_trait::async_trait;

pub struct BgCommand;

#[async_trait]
impl CommandHandler for BgCommand {
    fn name(&self) -> &'static str {
        "bg"
    }

    fn usage(&self) -> &'static str {
        "<cmd>"
    }

    fn description(&self) -> &'static str {
        "Run a shell command in the background"
    }

    async fn handle(&self, args: &str, ctx: &CommandContext) -> anyhow::Result<Reply> {
        if args.is_empty() {
            return Ok(Reply::error("usage: /bg <cmd>"));
        }
        let id = ctx.jobs.spawn(args, JOB_TIMEOUT);
        Ok(Reply::info(format!("[{}] started: {}", id, args)))
    }
}

pub struct JobsCommand;

#[async_trait]
impl CommandHandler for JobsCommand {
    fn name(&self) -> &'static str {
        "jobs"
    }

    fn description(&self) -> &'static str {
        "New output from background jobs"
    }

    async fn handle(&self, _args: &str, ctx: &CommandContext) -> anyhow::Result<Reply> {
        let events = ctx.jobs.poll();
        if !events.is_empty() {
            let lines: Vec<String> = events.iter().map(ToString::to_string).collect();
            return Ok(Reply::success(lines.join("\n")));
        }

        let running = ctx.jobs.running();
        if running.is_empty() {
            return Ok(Reply::info("no jobs"));
        }
        let lines: Vec<String> = running
            .iter()
            .map(|(id, command)| format!("[{}] running: {}", id, command))
            .collect();
        Ok(Reply::info(lines.join("\n")))
    }
}
