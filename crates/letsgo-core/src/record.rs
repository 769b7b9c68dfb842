//! # Log Records
//!
//! One record per line: `"<UTC ISO-8601 timestamp> <tag>:<text>"`.
//!
//! The text is escaped so a record never spans lines: backslash becomes
//! `\\`, newline `\n` and carriage return `\r`. [`LogLine::parse`]
//! reverses it.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use std::fmt;

/// Well-known tags
pub mod tag {
    /// Genuine user input typed at the prompt
    pub const USER: &str = "user";
    /// Reply produced by a built-in command or the echo fallback
    pub const ASSISTANT: &str = "assistant";
    /// Session lifecycle markers (`start`, `end`)
    pub const SESSION: &str = "session";

    /// Tag for text a persona was asked. Never counts as a real command.
    pub fn persona_user(persona: &str) -> String {
        format!("{}_{}", persona, USER)
    }
}

/// An immutable log record
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub timestamp: DateTime<Utc>,
    pub tag: String,
    pub text: String,
}

impl LogLine {
    /// Create a record stamped with the current time
    pub fn now(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            tag: tag.into(),
            text: text.into(),
        }
    }

    /// Parse a serialized line. Returns `None` for lines not in record form.
    pub fn parse(line: &str) -> Option<Self> {
        let (stamp, rest) = line.split_once(' ')?;
        let timestamp = parse_timestamp(stamp)?;
        let (tag, text) = rest.split_once(':')?;
        if tag.is_empty() || tag.chars().any(char::is_whitespace) {
            return None;
        }
        Some(Self {
            timestamp,
            tag: tag.to_string(),
            text: unescape(text),
        })
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

/// Unknown escapes are kept verbatim
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}:{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.tag,
            escape(&self.text)
        )
    }
}

/// Accepts RFC 3339 stamps and naive ISO-8601 stamps (assumed UTC)
fn parse_timestamp(stamp: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(stamp) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
