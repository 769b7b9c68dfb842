//! # Slash Commands
//!
//! Every `/command` is a [`CommandHandler`] registered by name in a
//! [`CommandRegistry`]. The registry is built once at startup and only read
//! afterwards; adding a command means registering one more handler.

pub mod jobs;
pub mod logs;
pub mod persona;
pub mod system;

use crate::jobs::JobTable;
use async_trait::async_trait;
use letsgo_core::{ColorRole, ColorScheme, CommandHistory, Searcher, SessionLog};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub use persona::Personas;

/// Everything a handler may touch
pub struct CommandContext {
    pub log: SessionLog,
    pub history: CommandHistory,
    pub searcher: Searcher,
    pub personas: Personas,
    pub colors: ColorScheme,
    pub run_timeout: Duration,
    pub jobs: Arc<JobTable>,
}

/// A command's reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Text recorded in the session log
    pub text: String,
    pub role: ColorRole,
    /// What to print instead of `text`, when part of it was already shown
    pub display: Option<String>,
    /// The handler wrote its own log record
    pub recorded: bool,
}

impl Reply {
    fn with_role(text: impl Into<String>, role: ColorRole) -> Self {
        Self {
            text: text.into(),
            role,
            display: None,
            recorded: false,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::with_role(text, ColorRole::Success)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::with_role(text, ColorRole::Info)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::with_role(text, ColorRole::Error)
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn recorded(mut self) -> Self {
        self.recorded = true;
        self
    }

    /// Text to print
    pub fn shown(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.text)
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Name without the leading slash
    fn name(&self) -> &'static str;

    /// Argument synopsis for `/help`
    fn usage(&self) -> &'static str {
        ""
    }

    fn description(&self) -> &'static str;

    async fn handle(&self, args: &str, ctx: &CommandContext) -> anyhow::Result<Reply>;
}

/// Name-to-handler table
#[derive(Default)]
pub struct CommandRegistry {
    handlers: Vec<Box<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in command
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(system::StatusCommand));
        registry.register(Box::new(system::TimeCommand));
        registry.register(Box::new(system::RunCommand));
        registry.register(Box::new(jobs::BgCommand));
        registry.register(Box::new(jobs::JobsCommand));
        registry.register(Box::new(logs::SummarizeCommand));
        registry.register(Box::new(logs::HistoryCommand));
        registry.register(Box::new(logs::SearchCommand));
        registry.register(Box::new(logs::LastCommand));
        registry.register(Box::new(logs::SessionsCommand));
        registry.register(Box::new(system::CalcCommand));
        registry.register(Box::new(system::PingCommand));
        registry.register(Box::new(persona::PersonaCommand::dive()));
        registry.register(Box::new(persona::PersonaCommand::deep()));

        let mut entries = registry.entries();
        entries.push(("/help".to_string(), "Show this help message".to_string()));
        registry.register(Box::new(HelpCommand { entries }));
        registry
    }

    /// Add a handler. Names are unique; a duplicate is dropped.
    pub fn register(&mut self, handler: Box<dyn CommandHandler>) {
        if self.get(handler.name()).is_some() {
            warn!("Command /{} registered twice, keeping the first", handler.name());
            return;
        }
        self.handlers.push(handler);
    }

    pub fn get(&self, name: &str) -> Option<&dyn CommandHandler> {
        self.handlers
            .iter()
            .find(|h| h.name() == name)
            .map(|h| h.as_ref())
    }

    /// Command names with their leading slash, in registration order
    pub fn names(&self) -> Vec<String> {
        self.handlers.iter().map(|h| format!("/{}", h.name())).collect()
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.handlers
            .iter()
            .map(|h| {
                let synopsis = if h.usage().is_empty() {
                    format!("/{}", h.name())
                } else {
                    format!("/{} {}", h.name(), h.usage())
                };
                (synopsis, h.description().to_string())
            })
            .collect()
    }

    /// Run the command named by the first token of `line`
    pub async fn dispatch(&self, line: &str, ctx: &CommandContext) -> anyhow::Result<Reply> {
        let (name, args) = split_command(line);
        match self.get(&name) {
            Some(handler) => handler.handle(args, ctx).await,
            None => Ok(Reply::error(format!("unknown command: /{}", name))),
        }
    }
}

/// `"/Name rest of line"` → (`"name"`, `"rest of line"`)
pub fn split_command(line: &str) -> (String, &str) {
    let body = line.trim().strip_prefix('/').unwrap_or(line.trim());
    let (name, args) = match body.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (body, ""),
    };
    (name.to_lowercase(), args)
}

struct HelpCommand {
    entries: Vec<(String, String)>,
}

#[async_trait]
impl CommandHandler for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn description(&self) -> &'static str {
        "Show this help message"
    }

    async fn handle(&self, _args: &str, _ctx: &CommandContext) -> anyhow::Result<Reply> {
        let width = self.entries.iter().map(|(s, _)| s.len()).max().unwrap_or(0);
        let lines: Vec<String> = self
            .entries
            .iter()
            .map(|(synopsis, description)| format!("{:width$}  {}", synopsis, description, width = width))
            .collect();
        Ok(Reply::info(lines.join("\n")))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("/Status"), ("status".to_string(), ""));
        assert_eq!(split_command("/run  ls -la "), ("run".to_string(), "ls -la"));
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = test_support::context(&temp_dir);
        let reply = CommandRegistry::with_defaults().dispatch("/nope x", &ctx).await.unwrap();
        assert_eq!(reply.text, "unknown command: /nope");
        assert_eq!(reply.role, ColorRole::Error);
    }

    #[tokio::test]
    async fn test_help_lists_every_command() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = test_support::context(&temp_dir);
        let registry = CommandRegistry::with_defaults();
        let help = registry.dispatch("/help", &ctx).await.unwrap();
        for name in registry.names() {
            assert!(help.text.contains(&name), "missing {}", name);
        }
    }

    #[tokio::test]
    async fn test_registry_is_open() {
        struct Hello;

        #[async_trait]
        impl CommandHandler for Hello {
            fn name(&self) -> &'static str {
                "hello"
            }
            fn description(&self) -> &'static str {
                "Say hello"
            }
            async fn handle(&self, args: &str, _ctx: &CommandContext) -> anyhow::Result<Reply> {
                Ok(Reply::success(format!("hello {}", args)))
            }
        }

        let temp_dir = TempDir::new().unwrap();
        let ctx = test_support::context(&temp_dir);
        let mut registry = CommandRegistry::with_defaults();
        registry.register(Box::new(Hello));

        assert_eq!(registry.dispatch("/hello world", &ctx).await.unwrap().text, "hello world");
        assert_eq!(registry.dispatch("/ping", &ctx).await.unwrap().text, "pong");
    }
}
