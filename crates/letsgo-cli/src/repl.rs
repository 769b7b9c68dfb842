//! # Interactive REPL
//!
//! Reads one line at a time, records it, dispatches it and prints the reply.
//! A terminal gets a line editor with completion; piped input is processed
//! line by line without a prompt.

use crate::commands::{persona, CommandContext, CommandRegistry, Reply};
use crate::render;
use letsgo_core::{tag, ColorRole};
use letsgo_personas::PersonaKind;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Context, Editor};
use rustyline_derive::{Helper, Highlighter, Hinter, Validator};
use std::io::{BufRead, IsTerminal};
use tracing::{debug, warn};

/// Consecutive editor failures tolerated before the session ends
const MAX_READ_ERRORS: u32 = 5;

/// What one input line led to
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    /// Blank line, nothing recorded
    Skip,
    Reply(Reply),
    Exit,
}

fn is_exit(line: &str) -> bool {
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

/// Tab completion for slash commands
#[derive(Helper, Hinter, Highlighter, Validator)]
struct LineHelper {
    commands: Vec<String>,
}

impl Completer for LineHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
        let typed = &line[..pos];
        if !typed.starts_with('/') || typed.contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }
        let candidates = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(typed))
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: format!("{} ", cmd),
            })
            .collect();
        Ok((0, candidates))
    }
}

pub struct Repl {
    ctx: CommandContext,
    registry: CommandRegistry,
    persona: Option<PersonaKind>,
    prompt: String,
}

impl Repl {
    pub fn new(
        ctx: CommandContext,
        registry: CommandRegistry,
        persona: Option<PersonaKind>,
        prompt: String,
    ) -> Self {
        Self {
            ctx,
            registry,
            persona,
            prompt,
        }
    }

    /// Handle one input line. The user line and the reply are both in the
    /// session log before this returns.
    pub async fn handle_line(&self, raw: &str) -> Step {
        let line = raw.trim();
        if line.is_empty() {
            return Step::Skip;
        }
        if is_exit(line) {
            return Step::Exit;
        }

        self.ctx.history.append(line);
        self.ctx.log.append(tag::USER, line);

        let reply = if line.starts_with('/') {
            match self.registry.dispatch(line, &self.ctx).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("Command failed: {:#}", e);
                    Reply::error(format!("error: {:#}", e))
                }
            }
        } else if let Some(kind) = self.persona {
            persona::ask(kind, line, &self.ctx).await
        } else {
            Reply::success(format!("echo: {}", line))
        };

        if !reply.recorded {
            self.ctx.log.append(tag::ASSISTANT, &reply.text);
        }
        Step::Reply(reply)
    }

    fn show(&self, reply: &Reply) {
        render::print_reply(&self.ctx.colors, reply.shown(), reply.role);
    }

    /// Run until `exit`, `quit` or end of input
    pub async fn run(self) -> anyhow::Result<()> {
        if std::io::stdin().is_terminal() {
            self.run_interactive().await?;
        } else {
            self.run_piped().await?;
        }
        Ok(())
    }

    async fn run_piped(self) -> anyhow::Result<()> {
        debug!("Detected piped input - running in non-interactive mode");

        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            // A line that is not UTF-8 is still a line
            let line = String::from_utf8_lossy(&buf);
            match self.handle_line(&line).await {
                Step::Skip => continue,
                Step::Reply(reply) => self.show(&reply),
                Step::Exit => break,
            }
        }

        self.finish();
        Ok(())
    }

    async fn run_interactive(self) -> anyhow::Result<()> {
        render::print_welcome(&self.ctx.log.path().display().to_string());

        let config = Config::builder()
            .history_ignore_space(true)
            .auto_add_history(true)
            .build();
        let mut rl: Editor<LineHelper, DefaultHistory> = Editor::with_config(config)?;
        rl.set_helper(Some(LineHelper {
            commands: self.registry.names(),
        }));
        for entry in self.ctx.history.entries() {
            let _ = rl.add_history_entry(entry);
        }

        let prompt = format!("{} ", self.ctx.colors.paint(&self.prompt, ColorRole::Prompt));
        let mut ctrl_c_count = 0;
        let mut read_errors = 0;

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    ctrl_c_count = 0;
                    read_errors = 0;
                    match self.handle_line(&line).await {
                        Step::Skip => continue,
                        Step::Reply(reply) => self.show(&reply),
                        Step::Exit => break,
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    ctrl_c_count += 1;
                    if ctrl_c_count >= 2 {
                        break;
                    }
                    println!("^C (press again to exit)");
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    // A terminal that keeps failing is as good as closed
                    read_errors += 1;
                    warn!("Failed to read input: {}", err);
                    if read_errors >= MAX_READ_ERRORS {
                        render::print_error(&self.ctx.colors, &format!("Error: {}", err));
                        break;
                    }
                }
            }
        }

        println!("Goodbye!");
        self.finish();
        Ok(())
    }

    fn finish(self) {
        let Repl { ctx, .. } = self;
        ctx.log.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;
    use letsgo_core::LogLine;
    use tempfile::TempDir;

    fn repl(temp_dir: &TempDir, persona: Option<PersonaKind>) -> Repl {
        Repl::new(
            test_support::context(temp_dir),
            CommandRegistry::with_defaults(),
            persona,
            ">>".to_string(),
        )
    }

    fn records(repl: &Repl) -> Vec<(String, String)> {
        std::fs::read_to_string(repl.ctx.log.path())
            .unwrap()
            .lines()
            .filter_map(LogLine::parse)
            .map(|r| (r.tag, r.text))
            .collect()
    }

    #[tokio::test]
    async fn test_echo_is_logged_before_return() {
        let temp_dir = TempDir::new().unwrap();
        let repl = repl(&temp_dir, None);

        let step = repl.handle_line("hello there\n").await;
        assert_eq!(step, Step::Reply(Reply::success("echo: hello there")));

        let recs = records(&repl);
        assert_eq!(recs[1], ("user".to_string(), "hello there".to_string()));
        assert_eq!(recs[2], ("assistant".to_string(), "echo: hello there".to_string()));
        assert_eq!(repl.ctx.history.entries(), vec!["hello there"]);
    }

    #[tokio::test]
    async fn test_exit_and_blank() {
        let temp_dir = TempDir::new().unwrap();
        let repl = repl(&temp_dir, None);
        assert_eq!(repl.handle_line("   ").await, Step::Skip);
        assert_eq!(repl.handle_line("QUIT").await, Step::Exit);
        assert_eq!(repl.handle_line("exit").await, Step::Exit);
        // Nothing but the start marker
        assert_eq!(records(&repl).len(), 1);
    }

    #[tokio::test]
    async fn test_slash_command_dispatch() {
        let temp_dir = TempDir::new().unwrap();
        let repl = repl(&temp_dir, None);
        match repl.handle_line("/ping").await {
            Step::Reply(reply) => assert_eq!(reply.text, "pong"),
            other => panic!("unexpected {:?}", other),
        }
        match repl.handle_line("/bogus").await {
            Step::Reply(reply) => assert_eq!(reply.text, "unknown command: /bogus"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(records(&repl).contains(&("assistant".to_string(), "pong".to_string())));
    }

    #[tokio::test]
    async fn test_persona_forwarding_is_not_double_logged() {
        let temp_dir = TempDir::new().unwrap();
        let repl = repl(&temp_dir, Some(PersonaKind::Johny));
        repl.handle_line("what is ls").await;

        let tags: Vec<String> = records(&repl).into_iter().map(|(t, _)| t).collect();
        assert_eq!(tags, vec!["session", "user", "johny_user", "johny"]);
    }

    #[test]
    fn test_completion() {
        let helper = LineHelper {
            commands: vec!["/status".to_string(), "/search".to_string(), "/time".to_string()],
        };
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);
        let (start, pairs) = helper.complete("/s", 2, &ctx).unwrap();
        assert_eq!(start, 0);
        let names: Vec<&str> = pairs.iter().map(|p| p.display.as_str()).collect();
        assert_eq!(names, vec!["/status", "/search"]);

        let (_, none) = helper.complete("/run ls", 7, &ctx).unwrap();
        assert!(none.is_empty());
    }
}
