//! Persona commands: `/dive` (Johny) and `/deep` (Tony).

use super::{CommandContext, CommandHandler, Reply};
use crate::render::Spinner;
use async_trait::async_trait;
use letsgo_personas::{Persona, PersonaKind};

/// The personas available to a session
pub struct Personas {
    johny: Persona,
    tony: Persona,
}

impl Personas {
    pub fn new(johny: Persona, tony: Persona) -> Self {
        Self { johny, tony }
    }

    pub fn from_env() -> Self {
        Self::new(
            Persona::from_env(PersonaKind::Johny),
            Persona::from_env(PersonaKind::Tony),
        )
    }

    pub fn get(&self, kind: PersonaKind) -> &Persona {
        match kind {
            PersonaKind::Johny => &self.johny,
            PersonaKind::Tony => &self.tony,
        }
    }
}

/// Ask a persona and shape the reply. The persona logs both sides itself.
pub async fn ask(kind: PersonaKind, text: &str, ctx: &CommandContext) -> Reply {
    let persona = ctx.personas.get(kind);
    let spinner = Spinner::new(&format!("{} is thinking...", persona.profile().display_name));
    let answer = persona.query(text, &ctx.log).await;
    spinner.finish();

    let reply = if answer.starts_with(persona.profile().error_prefix) {
        Reply::error(answer)
    } else {
        Reply::success(answer)
    };
    reply.recorded()
}

pub struct PersonaCommand {
    name: &'static str,
    description: &'static str,
    kind: PersonaKind,
}

impl PersonaCommand {
    pub fn dive() -> Self {
        Self {
            name: "dive",
            description: "Ask Johny (short answers)",
            kind: PersonaKind::Johny,
        }
    }

    pub fn deep() -> Self {
        Self {
            name: "deep",
            description: "Ask Tony (deep reasoning)",
            kind: PersonaKind::Tony,
        }
    }
}

#[async_trait]
impl CommandHandler for PersonaCommand {
    fn name(&self) -> &'static str {
        self.name
    }

    fn usage(&self) -> &'static str {
        "<text>"
    }

    fn description(&self) -> &'static str {
        self.description
    }

    async fn handle(&self, args: &str, ctx: &CommandContext) -> anyhow::Result<Reply> {
        if args.is_empty() {
            return Ok(Reply::error(format!("usage: /{} <text>", self.name)));
        }
        Ok(ask(self.kind, args, ctx).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support;
    use letsgo_core::{ColorRole, LogLine};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_dive_without_key() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = test_support::context(&temp_dir);

        let reply = PersonaCommand::dive().handle("hi", &ctx).await.unwrap();
        assert_eq!(reply.text, "❌ Johny Error: PERPLEXITY_API_KEY not set");
        assert_eq!(reply.role, ColorRole::Error);
        assert!(reply.recorded);

        let tags: Vec<String> = std::fs::read_to_string(ctx.log.path())
            .unwrap()
            .lines()
            .filter_map(LogLine::parse)
            .map(|r| r.tag)
            .collect();
        assert_eq!(tags, vec!["session", "johny_user", "johny"]);
    }

    #[tokio::test]
    async fn test_deep_requires_text() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = test_support::context(&temp_dir);
        let reply = PersonaCommand::deep().handle("", &ctx).await.unwrap();
        assert_eq!(reply.text, "usage: /deep <text>");
    }
}
