//! # Terminal Rendering
//!
//! Colored replies, the welcome banner and the wait spinner.

use colored::Colorize;
use letsgo_core::{ColorRole, ColorScheme};
use std::io::IsTerminal;

/// Apply the scheme globally. `colored` output follows the same switch.
pub fn init_colors(colors: &ColorScheme) {
    if !colors.enabled {
        colored::control::set_override(false);
    }
}

/// Print a reply in the given role's color
pub fn print_reply(colors: &ColorScheme, text: &str, role: ColorRole) {
    if text.is_empty() {
        return;
    }
    println!("{}", colors.paint(text, role));
}

/// Print an error line to stderr
pub fn print_error(colors: &ColorScheme, message: &str) {
    eprintln!("{}", colors.paint(message, ColorRole::Error));
}

pub fn print_welcome(session_path: &str) {
    println!(
        "{} {}",
        "letsgo".bright_green().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("{} Session log: {}", "📝".dimmed(), session_path.dimmed());
    println!(
        "Type {} for commands, {} to leave.\n",
        "/help".bright_green(),
        "exit".bright_green()
    );
}

/// Progress spinner shown while waiting on a persona
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Hidden when stderr is not a terminal
    pub fn new(message: &str) -> Self {
        let pb = if std::io::stderr().is_terminal() {
            indicatif::ProgressBar::new_spinner()
        } else {
            indicatif::ProgressBar::hidden()
        };
        if let Ok(style) = indicatif::ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(80));

        Self { pb }
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.pb.is_finished() {
            self.pb.finish_and_clear();
        }
    }
}
