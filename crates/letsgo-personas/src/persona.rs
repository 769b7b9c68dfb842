//! # Personas
//!
//! A persona is a fixed profile (system prompt, decoding parameters, reply
//! shaping) bound to a chat backend. Each turn is written to the session log
//! before the reply is handed back.

use crate::client::{ChatBackend, ChatClient, ChatMessage, ChatRequest};
use crate::transform::{clean_reasoning, ensure_sentence_end, remove_links, substitute_name, trim_answer};
use letsgo_core::{tag, SessionLog};
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

const JOHNY_PROMPT: &str = "You are Johny, resonant guardian spirit of the terminal. \
When users invoke /dive, respond concisely. Avoid links, citations and meta-comments. \
No preambles and no explanations of your process.";

const TONY_PROMPT: &str = "You are Tony, chief reasoner of the terminal and an expert in \
Linux commands, programming, mathematics and system design. \
Deliver direct answers about commands, code and operating systems. \
Never include meta-comments, process explanations or statements like \
'the user is asking...' or 'let's consider...'. Only the answer, clear and to the point.";

/// Built-in personas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonaKind {
    Johny,
    Tony,
}

impl PersonaKind {
    /// Lowercase name, also the persona's log tag
    pub fn name(self) -> &'static str {
        match self {
            PersonaKind::Johny => "johny",
            PersonaKind::Tony => "tony",
        }
    }

    pub fn profile(self) -> PersonaProfile {
        match self {
            PersonaKind::Johny => PersonaProfile::johny(),
            PersonaKind::Tony => PersonaProfile::tony(),
        }
    }
}

impl fmt::Display for PersonaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed configuration of one persona
#[derive(Debug, Clone)]
pub struct PersonaProfile {
    /// Display name used in replies and name substitution
    pub display_name: &'static str,
    /// Log tag for replies; the asked text goes under `<tag>_user`
    pub tag: &'static str,
    pub model: &'static str,
    pub system_prompt: &'static str,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_lines: usize,
    pub max_chars: usize,
    /// Strip reasoning chatter before trimming
    pub clean_reasoning: bool,
    /// Model self-references replaced by `display_name`
    pub aliases: Option<Regex>,
    pub reply_prefix: &'static str,
    pub error_prefix: &'static str,
    /// Extra request body fields
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PersonaProfile {
    pub fn johny() -> Self {
        let mut extra = serde_json::Map::new();
        extra.insert("search_domain_filter".to_string(), serde_json::json!([]));
        extra.insert("return_citations".to_string(), serde_json::json!(false));
        extra.insert("search_recency_filter".to_string(), serde_json::json!("month"));

        Self {
            display_name: "Johny",
            tag: "johny",
            model: "sonar-pro",
            system_prompt: JOHNY_PROMPT,
            temperature: 0.5,
            max_tokens: 700,
            max_lines: 10,
            max_chars: 650,
            clean_reasoning: false,
            aliases: Regex::new(r"(?i)(Sonar[\s\-]?Pro|Sonar Reasoning Pro|Tony)").ok(),
            reply_prefix: "🔍 Johny:\n",
            error_prefix: "❌ Johny Error: ",
            extra,
        }
    }

    pub fn tony() -> Self {
        Self {
            display_name: "Tony",
            tag: "tony",
            model: "sonar-reasoning",
            system_prompt: TONY_PROMPT,
            temperature: 0.6,
            max_tokens: 1500,
            max_lines: 40,
            max_chars: 4000,
            clean_reasoning: true,
            aliases: Regex::new(r"(?i)(Sonar[\s\-]?Reasoning(?:[\s\-]?Pro)?|Sonar[\s\-]?Pro)").ok(),
            reply_prefix: "🧠 Tony deep reasoning: ",
            error_prefix: "❌ Tony deep reasoning ERROR: ",
            extra: serde_json::Map::new(),
        }
    }

    /// Request body for one question
    pub fn request(&self, user_text: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.to_string(),
            messages: vec![
                ChatMessage::system(self.system_prompt),
                ChatMessage::user(user_text),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            extra: self.extra.clone(),
        }
    }

    /// Post-process a raw model answer
    pub fn shape(&self, raw: &str) -> String {
        let mut answer = remove_links(raw);
        if self.clean_reasoning {
            answer = clean_reasoning(&answer);
        }
        answer = trim_answer(&answer, self.max_lines, self.max_chars);
        if let Some(aliases) = &self.aliases {
            answer = substitute_name(&answer, aliases, self.display_name);
        }
        ensure_sentence_end(&answer)
    }
}

/// A profile bound to a backend
pub struct Persona {
    profile: PersonaProfile,
    backend: Arc<dyn ChatBackend>,
}

impl Persona {
    pub fn new(profile: PersonaProfile, backend: Arc<dyn ChatBackend>) -> Self {
        Self { profile, backend }
    }

    /// Persona backed by the HTTP client configured from the environment
    pub fn from_env(kind: PersonaKind) -> Self {
        let client = ChatClient::from_env();
        if !client.has_credential() {
            debug!("No API key for {}, replies will report the missing key", kind);
        }
        Self::new(kind.profile(), Arc::new(client))
    }

    pub fn profile(&self) -> &PersonaProfile {
        &self.profile
    }

    /// Ask the persona. Always returns a printable reply; failures come back
    /// as the persona's error string.
    pub async fn query(&self, user_text: &str, log: &SessionLog) -> String {
        let profile = &self.profile;
        log.append(&tag::persona_user(profile.tag), user_text);

        let request = profile.request(user_text);
        match self.backend.complete(&request).await {
            Ok(raw) => {
                debug!("{} answered with {} chars", profile.display_name, raw.len());
                let answer = profile.shape(&raw);
                log.append(profile.tag, &answer);
                format!("{}{}", profile.reply_prefix, answer)
            }
            Err(e) => {
                warn!("{} query failed: {}", profile.display_name, e);
                let err = format!("{}{}", profile.error_prefix, e);
                log.append(profile.tag, &err);
                err
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PersonaError, Result};
    use async_trait::async_trait;
    use letsgo_core::{LogLine, LogSettings};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Backend returning a canned answer and remembering the request
    struct Canned {
        answer: std::result::Result<String, u16>,
        seen: Mutex<Option<ChatRequest>>,
    }

    impl Canned {
        fn ok(answer: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(answer.to_string()),
                seen: Mutex::new(None),
            })
        }

        fn status(status: u16) -> Arc<Self> {
            Arc::new(Self {
                answer: Err(status),
                seen: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl ChatBackend for Canned {
        async fn complete(&self, request: &ChatRequest) -> Result<String> {
            *self.seen.lock().unwrap() = Some(request.clone());
            match &self.answer {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(PersonaError::ApiError {
                    status: *status,
                    message: "boom".to_string(),
                }),
            }
        }
    }

    fn records(log: &SessionLog) -> Vec<(String, String)> {
        std::fs::read_to_string(log.path())
            .unwrap()
            .lines()
            .filter_map(LogLine::parse)
            .map(|r| (r.tag, r.text))
            .collect()
    }

    #[test]
    fn test_johny_request() {
        let req = PersonaProfile::johny().request("hi");
        assert_eq!(req.model, "sonar-pro");
        assert_eq!(req.max_tokens, 700);
        assert_eq!(req.messages[0].role, "system");
        assert_eq!(req.extra["search_recency_filter"], "month");
    }

    #[test]
    fn test_tony_shape_removes_reasoning() {
        let raw = "The user wants to list files. Simple.\nUse ls -la to list files.\nSonar Reasoning says so";
        assert_eq!(
            PersonaProfile::tony().shape(raw),
            "Use ls -la to list files.\nTony says so [truncated]"
        );
    }

    #[tokio::test]
    async fn test_query_logs_both_turns() {
        let temp_dir = TempDir::new().unwrap();
        let log = SessionLog::open(&LogSettings::new(temp_dir.path())).unwrap();
        let backend = Canned::ok("I am Sonar Pro. See https://x.y [1].");
        let persona = Persona::new(PersonaProfile::johny(), backend.clone());

        let reply = persona.query("who are you?", &log).await;
        assert_eq!(reply, "🔍 Johny:\nI am Johny. See  .");

        let recs = records(&log);
        assert!(recs.contains(&("johny_user".to_string(), "who are you?".to_string())));
        assert!(recs.contains(&("johny".to_string(), "I am Johny. See  .".to_string())));
        // The asked text is never tagged as a real user command
        assert!(!recs.iter().any(|(t, _)| t == "user"));

        let seen = backend.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.messages[1].content, "who are you?");
    }

    #[tokio::test]
    async fn test_query_error_is_branded_and_logged() {
        let temp_dir = TempDir::new().unwrap();
        let log = SessionLog::open(&LogSettings::new(temp_dir.path())).unwrap();
        let persona = Persona::new(PersonaProfile::tony(), Canned::status(500));

        let reply = persona.query("why?", &log).await;
        assert_eq!(reply, "❌ Tony deep reasoning ERROR: API error: 500 - boom");
        assert!(records(&log).contains(&("tony".to_string(), reply.clone())));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let log = SessionLog::open(&LogSettings::new(temp_dir.path())).unwrap();
        let persona = Persona::new(
            PersonaProfile::johny(),
            Arc::new(ChatClient::new(None, "http://127.0.0.1:1")),
        );

        let reply = persona.query("hello", &log).await;
        assert_eq!(reply, "❌ Johny Error: PERPLEXITY_API_KEY not set");
    }
}
