//! Status symbols and one-line messages.

use owo_colors::OwoColorize;

#[derive(Debug, Clone, Copy)]
pub enum Status {
    Success,
    Error,
    Warning,
    Skipped,
}

impl Status {
    pub fn symbol(&self) -> &'static str {
        match self {
            Status::Success => "✓",
            Status::Error => "✗",
            Status::Warning => "⚠",
            Status::Skipped => "○",
        }
    }

    pub fn colored_symbol(&self) -> String {
        match self {
            Status::Success => self.symbol().green().to_string(),
            Status::Error => self.symbol().red().to_string(),
            Status::Warning => self.symbol().yellow().to_string(),
            Status::Skipped => self.symbol().bright_black().to_string(),
        }
    }

    /// Formats a message with the colored symbol in front.
    pub fn format(&self, message: &str) -> String {
        format!("{} {}", self.colored_symbol(), self.colorize_text(message))
    }

    fn colorize_text(&self, text: &str) -> String {
        match self {
            Status::Success => text.green().bold().to_string(),
            Status::Error => text.red().bold().to_string(),
            Status::Warning => text.yellow().bold().to_string(),
            Status::Skipped => text.bright_black().to_string(),
        }
    }
}

pub fn print_success(message: &str) {
    println!("  {}", Status::Success.format(message));
}

/// Errors go to stderr so `--json` output on stdout stays parseable.
pub fn print_error(message: &str) {
    eprintln!("  {}", Status::Error.format(message));
}

pub fn print_warning(message: &str) {
    println!("  {}", Status::Warning.format(message));
}
