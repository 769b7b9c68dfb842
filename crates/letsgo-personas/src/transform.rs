//! # Reply Transforms
//!
//! Pure string post-processing applied to model replies. Nothing here does
//! I/O, so every step is testable on literal strings.

use regex::Regex;
use std::sync::OnceLock;

/// Appended when a reply stops mid-sentence
pub const TRUNCATION_NOTICE: &str = " [truncated]";

const SENTENCE_ENDINGS: [char; 4] = ['.', '!', '?', '…'];

/// Closing characters allowed after the final punctuation
const TRAILING_CLOSERS: [char; 6] = ['"', '\'', ')', ']', '»', '”'];

/// Lines starting with these (case-insensitive) are reasoning, not answer
const META_PREFIXES: [&str; 6] = [
    "the user",
    "let's",
    "i need to",
    "reasoning",
    "analysis",
    "thought process",
];

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
}

fn link_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| compile_all(&[r"https?://\S+", r"\[\d+\]", r"\[.*?\]"]))
}

fn reasoning_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        compile_all(&[
            r"(?im)The user (?:is asking|wants|is interested in).*?\..*?\n",
            r"(?im)Let's (?:break down|consider|analyze).*?\n",
            r"(?im)I need to (?:think|consider|analyze).*?\n",
            r"(?im)^.*(?:reasoning|analysis|thought process).*?\n",
            // Connectives only at the start of a line, and only as whole words
            r"(?im)^(?:Thus|In summary|In conclusion|So)\b,?[ \t]*",
        ])
    })
}

/// Strip URLs, numeric citation markers and any other bracketed text
pub fn remove_links(text: &str) -> String {
    let mut out = text.to_string();
    for re in link_patterns() {
        out = re.replace_all(&out, "").into_owned();
    }
    out.trim().to_string()
}

/// Keep at most `max_lines` lines and `max_chars` characters.
///
/// Past the character limit the cut backs up to the last space and `...` is
/// appended.
pub fn trim_answer(text: &str, max_lines: usize, max_chars: usize) -> String {
    let text = text.trim();
    let out = text.lines().take(max_lines).collect::<Vec<_>>().join("\n");

    if out.chars().count() <= max_chars {
        return out.trim().to_string();
    }

    let cut: String = out.chars().take(max_chars).collect();
    let kept = match cut.rfind(' ') {
        Some(idx) => &cut[..idx],
        None => cut.as_str(),
    };
    format!("{}...", kept).trim().to_string()
}

/// Replace every match of `aliases` with `name`
pub fn substitute_name(text: &str, aliases: &Regex, name: &str) -> String {
    aliases.replace_all(text, regex::NoExpand(name)).into_owned()
}

/// Remove meta-commentary and reasoning chatter, keeping the answer
pub fn clean_reasoning(text: &str) -> String {
    let mut out = text.to_string();
    for re in reasoning_patterns() {
        out = re.replace_all(&out, "").into_owned();
    }

    out.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            let lower = line.to_lowercase();
            !META_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Append [`TRUNCATION_NOTICE`] unless the text ends a sentence
pub fn ensure_sentence_end(text: &str) -> String {
    let text = text.trim_end();
    if text.is_empty() {
        return String::new();
    }

    let ends_sentence = text
        .trim_end_matches(TRAILING_CLOSERS)
        .ends_with(SENTENCE_ENDINGS);
    if ends_sentence {
        text.to_string()
    } else {
        format!("{}{}", text, TRUNCATION_NOTICE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_links() {
        let text = "See https://example.com/x?y=1 for more [1]. Also [source] here.";
        assert_eq!(remove_links(text), "See  for more . Also  here.");
    }

    #[test]
    fn test_remove_links_keeps_plain_text() {
        assert_eq!(remove_links("  ls -la lists files.  "), "ls -la lists files.");
    }

    #[test]
    fn test_trim_answer_lines() {
        let text = (1..=15).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        let out = trim_answer(&text, 10, 650);
        assert_eq!(out.lines().count(), 10);
        assert!(out.ends_with("line 10"));
    }

    #[test]
    fn test_trim_answer_chars_cut_at_word() {
        let out = trim_answer("alpha beta gamma delta", 10, 13);
        assert_eq!(out, "alpha beta...");
    }

    #[test]
    fn test_trim_answer_counts_chars_not_bytes() {
        let text = "привет мир как дела";
        assert_eq!(trim_answer(text, 10, 100), text);
        assert_eq!(trim_answer(text, 10, 12), "привет мир...");
    }

    #[test]
    fn test_substitute_name() {
        let aliases = Regex::new(r"(?i)(Sonar[\s\-]?Pro|Sonar Reasoning Pro|Tony)").unwrap();
        assert_eq!(
            substitute_name("I am sonar-pro, also called SONAR PRO and tony.", &aliases, "Johny"),
            "I am Johny, also called Johny and Johny."
        );
        assert_eq!(substitute_name("Sonar Reasoning Pro here", &aliases, "Johny"), "Johny here");
    }

    #[test]
    fn test_substitute_name_is_literal() {
        let aliases = Regex::new("x").unwrap();
        assert_eq!(substitute_name("x", &aliases, "$0 cost"), "$0 cost");
    }

    #[test]
    fn test_clean_reasoning() {
        let text = "The user is asking about ls. They want details.\n\
                    Let's break down the command.\n\
                    Thus, use ls -la.\n\
                    Reasoning: flags combine.\n\
                    It lists hidden files too.\n";
        assert_eq!(clean_reasoning(text), "use ls -la.\nIt lists hidden files too.");
    }

    #[test]
    fn test_clean_reasoning_leaves_words_intact() {
        let text = "Sometimes also works.\nSo, yes.";
        assert_eq!(clean_reasoning(text), "Sometimes also works.\nyes.");
    }

    #[test]
    fn test_ensure_sentence_end() {
        assert_eq!(ensure_sentence_end("Done."), "Done.");
        assert_eq!(ensure_sentence_end("Really?"), "Really?");
        assert_eq!(ensure_sentence_end("Wait…"), "Wait…");
        assert_eq!(ensure_sentence_end("He said \"go.\""), "He said \"go.\"");
        assert_eq!(ensure_sentence_end("and then"), "and then [truncated]");
        assert_eq!(ensure_sentence_end(""), "");
    }
}
