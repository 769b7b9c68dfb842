//! # Configuration
//!
//! Settings come from, in increasing priority:
//!
//! 1. Default values
//! 2. Global config (`<config_dir>/letsgo/config.toml`)
//! 3. Project config (`./.letsgo.toml`), or an explicit `--config` file instead of 2 and 3
//! 4. Environment variables (`LETSGO_*`, `NO_COLOR`)
//!
//! The file is TOML read key by key. Unknown keys are ignored, and a value of
//! the wrong shape (say, a non-numeric `max_log_files`) leaves the previous
//! value in place instead of rejecting the whole file.
//!
//! ```toml
//! prompt = ">>"
//! log_dir = "/arianna_core/log"
//! history_file = "~/.letsgo_history"
//! max_log_files = 50
//! color = true
//!
//! [colors]
//! prompt = '\033[33m'
//! error = "\u001b[31m"
//! ```

use crate::{CoreError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_MAX_LOG_FILES: usize = 100;
pub const DEFAULT_PROMPT: &str = ">>";

const RESET: &str = "\x1b[0m";

/// Named color roles used by the terminal front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRole {
    Prompt,
    Success,
    Error,
    Info,
}

impl ColorRole {
    pub const ALL: [ColorRole; 4] = [
        ColorRole::Prompt,
        ColorRole::Success,
        ColorRole::Error,
        ColorRole::Info,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ColorRole::Prompt => "prompt",
            ColorRole::Success => "success",
            ColorRole::Error => "error",
            ColorRole::Info => "info",
        }
    }

    fn env_var(self) -> String {
        format!("LETSGO_COLOR_{}", self.key().to_uppercase())
    }
}

/// ANSI escape codes per role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorScheme {
    pub enabled: bool,
    pub prompt: String,
    pub success: String,
    pub error: String,
    pub info: String,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            enabled: true,
            prompt: "\x1b[36m".to_string(),
            success: "\x1b[32m".to_string(),
            error: "\x1b[31m".to_string(),
            info: "\x1b[33m".to_string(),
        }
    }
}

impl ColorScheme {
    pub fn code(&self, role: ColorRole) -> &str {
        match role {
            ColorRole::Prompt => &self.prompt,
            ColorRole::Success => &self.success,
            ColorRole::Error => &self.error,
            ColorRole::Info => &self.info,
        }
    }

    fn slot(&mut self, role: ColorRole) -> &mut String {
        match role {
            ColorRole::Prompt => &mut self.prompt,
            ColorRole::Success => &mut self.success,
            ColorRole::Error => &mut self.error,
            ColorRole::Info => &mut self.info,
        }
    }

    /// Wrap `text` in the role's color, or return it unchanged when disabled
    pub fn paint(&self, text: &str, role: ColorRole) -> String {
        if !self.enabled {
            return text.to_string();
        }
        format!("{}{}{}", self.code(role), text, RESET)
    }
}

/// Companion configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub prompt: String,
    pub log_dir: PathBuf,
    pub history_file: PathBuf,
    pub max_log_files: usize,
    pub colors: ColorScheme,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .map(|d| d.join("letsgo"))
            .unwrap_or_else(|| PathBuf::from(".letsgo"));
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            log_dir: data_dir.join("log"),
            history_file: data_dir.join("history"),
            max_log_files: DEFAULT_MAX_LOG_FILES,
            colors: ColorScheme::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default locations, or from `explicit` only
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(CoreError::ConfigError(format!(
                        "config file {} not found",
                        path.display()
                    )));
                }
                config.apply_file(path)?;
            }
            None => {
                if let Some(global_path) = Self::global_config_path() {
                    if global_path.exists() {
                        config.apply_file(&global_path)?;
                    }
                }
                let project_path = Self::project_config_path();
                if project_path.exists() {
                    config.apply_file(&project_path)?;
                }
            }
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Get global config path
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("letsgo").join("config.toml"))
    }

    /// Get project config path
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".letsgo.toml")
    }

    /// Overlay settings from a config file
    pub fn apply_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        debug!("Loading config from {:?}", path);
        self.apply_toml_str(&content);
        Ok(())
    }

    /// Overlay settings from TOML text. A file that does not parse is ignored.
    pub fn apply_toml_str(&mut self, content: &str) {
        let table = match content.parse::<toml::Table>() {
            Ok(table) => table,
            Err(e) => {
                warn!("Ignoring unreadable config: {}", e);
                return;
            }
        };

        for (key, value) in &table {
            match (key.as_str(), value) {
                ("prompt", toml::Value::String(s)) => self.prompt = decode_escapes(s),
                ("log_dir", toml::Value::String(s)) => self.log_dir = expand_home(s),
                ("history_file", toml::Value::String(s)) => self.history_file = expand_home(s),
                ("max_log_files", value) => match parse_count(value) {
                    Some(n) => self.max_log_files = n,
                    None => debug!("Ignoring malformed max_log_files: {}", value),
                },
                ("color", toml::Value::Boolean(b)) => self.colors.enabled = *b,
                ("colors", toml::Value::Table(colors)) => {
                    for role in ColorRole::ALL {
                        if let Some(toml::Value::String(code)) = colors.get(role.key()) {
                            *self.colors.slot(role) = decode_escapes(code);
                        }
                    }
                }
                (other, _) => debug!("Ignoring config key {}", other),
            }
        }
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = get("LETSGO_LOG_DIR").filter(|v| !v.is_empty()) {
            self.log_dir = expand_home(&dir);
        }
        if let Some(path) = get("LETSGO_HISTORY_FILE").filter(|v| !v.is_empty()) {
            self.history_file = expand_home(&path);
        }
        if let Some(val) = get("LETSGO_MAX_LOG_FILES") {
            if let Ok(n) = val.trim().parse() {
                self.max_log_files = n;
            }
        }
        if let Some(prompt) = get("LETSGO_PROMPT") {
            self.prompt = decode_escapes(&prompt);
        }
        for role in ColorRole::ALL {
            if let Some(code) = get(&role.env_var()) {
                *self.colors.slot(role) = decode_escapes(&code);
            }
        }
        if get("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            self.colors.enabled = false;
        }
        if let Some(val) = get("LETSGO_NO_COLOR") {
            if val == "1" || val.eq_ignore_ascii_case("true") {
                self.colors.enabled = false;
            }
        }
    }
}

fn parse_count(value: &toml::Value) -> Option<usize> {
    match value {
        toml::Value::Integer(n) => usize::try_from(*n).ok(),
        toml::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Turn textual escape spellings (`\033`, `\x1b`, `\e`) into ESC
fn decode_escapes(code: &str) -> String {
    code.replace("\\033", "\x1b")
        .replace("\\x1b", "\x1b")
        .replace("\\e", "\x1b")
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.prompt, ">>");
        assert_eq!(config.max_log_files, DEFAULT_MAX_LOG_FILES);
        assert!(config.colors.enabled);
        assert!(config.log_dir.ends_with("log"));
    }

    #[test]
    fn test_file_values_applied() {
        let mut config = Config::default();
        config.apply_toml_str(
            r#"
prompt = "letsgo>"
log_dir = "/srv/letsgo/log"
max_log_files = 7

[colors]
prompt = '\033[33m'
"#,
        );
        assert_eq!(config.prompt, "letsgo>");
        assert_eq!(config.log_dir, PathBuf::from("/srv/letsgo/log"));
        assert_eq!(config.max_log_files, 7);
        assert_eq!(config.colors.paint(">>", ColorRole::Prompt), "\x1b[33m>>\x1b[0m");
    }

    #[test]
    fn test_malformed_integer_keeps_default() {
        let mut config = Config::default();
        config.apply_toml_str("max_log_files = \"lots\"\nprompt = \"$\"");
        assert_eq!(config.max_log_files, DEFAULT_MAX_LOG_FILES);
        assert_eq!(config.prompt, "$");

        config.apply_toml_str("max_log_files = -4");
        assert_eq!(config.max_log_files, DEFAULT_MAX_LOG_FILES);

        config.apply_toml_str("max_log_files = \"12\"");
        assert_eq!(config.max_log_files, 12);
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let mut config = Config::default();
        config.apply_toml_str("theme = \"dark\"\n[plugins]\nping = true\nprompt = 5");
        assert_eq!(config.prompt, ">>");
    }

    #[test]
    fn test_broken_file_ignored() {
        let mut config = Config::default();
        config.apply_toml_str("prompt = \"unterminated");
        assert_eq!(config.prompt, ">>");
    }

    #[test]
    fn test_env_color_override() {
        let mut config = Config::default();
        config.apply_toml_str("[colors]\nsuccess = \"\\u001b[34m\"");
        config.apply_env(env_of(&[("LETSGO_COLOR_SUCCESS", "\x1b[35m")]));
        assert_eq!(config.colors.paint("ok", ColorRole::Success), "\x1b[35mok\x1b[0m");
    }

    #[test]
    fn test_env_disables_color() {
        let mut config = Config::default();
        config.apply_env(env_of(&[("NO_COLOR", "1")]));
        assert_eq!(config.colors.paint("ok", ColorRole::Success), "ok");

        let mut config = Config::default();
        config.apply_env(env_of(&[("LETSGO_NO_COLOR", "true")]));
        assert!(!config.colors.enabled);

        let mut config = Config::default();
        config.apply_env(env_of(&[("NO_COLOR", "")]));
        assert!(config.colors.enabled);
    }

    #[test]
    fn test_env_max_log_files() {
        let mut config = Config::default();
        config.apply_env(env_of(&[("LETSGO_MAX_LOG_FILES", "nope")]));
        assert_eq!(config.max_log_files, DEFAULT_MAX_LOG_FILES);
        config.apply_env(env_of(&[("LETSGO_MAX_LOG_FILES", "3")]));
        assert_eq!(config.max_log_files, 3);
    }

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("letsgo.toml");
        std::fs::write(&path, "history_file = \"/tmp/h\"").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.history_file, PathBuf::from("/tmp/h"));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = Config::load(Some(&temp_dir.path().join("absent.toml")));
        assert!(matches!(result, Err(CoreError::ConfigError(_))));
    }
}
