//! Styled terminal output.
//!
//! Colors are used only when the stream is a terminal and `NO_COLOR` is
//! unset (or `0`/`false`).

use std::io::{IsTerminal, Write};
use std::time::Duration;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Check if colors should be disabled based on NO_COLOR env var.
fn colors_disabled() -> bool {
    std::env::var("NO_COLOR")
        .map(|v| !v.is_empty() && v != "0" && v.to_lowercase() != "false")
        .unwrap_or(false)
}

fn use_colors(stderr: bool) -> bool {
    let is_terminal = if stderr {
        std::io::stderr().is_terminal()
    } else {
        std::io::stdout().is_terminal()
    };
    is_terminal && !colors_disabled()
}

/// Message type for styled output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Success,
    Error,
    Warning,
    Info,
    Dim,
}

impl MessageType {
    fn icon(&self) -> &'static str {
        match self {
            MessageType::Success => "✔",
            MessageType::Error => "✖",
            MessageType::Warning => "⚠",
            MessageType::Info => "ℹ",
            MessageType::Dim => "-",
        }
    }

    fn color(&self) -> &'static str {
        match self {
            MessageType::Success => GREEN,
            MessageType::Error => RED,
            MessageType::Warning => YELLOW,
            MessageType::Info => CYAN,
            MessageType::Dim => DIM,
        }
    }
}

fn format_message(msg_type: MessageType, message: &str, colored: bool) -> String {
    if colored {
        format!("{}{}{} {}", msg_type.color(), msg_type.icon(), RESET, message)
    } else {
        format!("{} {}", msg_type.icon(), message)
    }
}

fn print_styled(msg_type: MessageType, message: &str, to_stderr: bool) {
    let formatted = format_message(msg_type, message, use_colors(to_stderr));
    if to_stderr {
        let _ = writeln!(std::io::stderr(), "{formatted}");
    } else {
        let _ = writeln!(std::io::stdout(), "{formatted}");
    }
}

/// Print an error message to stderr.
pub fn print_error(message: &str) {
    print_styled(MessageType::Error, message, true);
}

/// Print a warning message to stderr.
pub fn print_warning(message: &str) {
    print_styled(MessageType::Warning, message, true);
}

/// Print a success message to stdout.
pub fn println_success(message: &str) {
    print_styled(MessageType::Success, message, false);
}

/// Print an info message to stdout.
pub fn println_info(message: &str) {
    print_styled(MessageType::Info, message, false);
}

/// Print a dimmed message to stdout.
pub fn println_dim(message: &str) {
    print_styled(MessageType::Dim, message, false);
}

/// Return `text` in bold when stdout takes colors.
pub fn bold(text: &str) -> String {
    if use_colors(false) {
        format!("{BOLD}{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// Return a label colored like `msg_type` when stdout takes colors.
pub fn styled_label(msg_type: MessageType, label: &str) -> String {
    if use_colors(false) {
        format!("{}{}{}", msg_type.color(), label, RESET)
    } else {
        label.to_string()
    }
}

/// Formats a byte count in decimal megabytes, e.g. `1.234MB`.
pub fn format_size(bytes: u64) -> String {
    format!("{:.3}MB", bytes as f64 / 1_000_000.0)
}

/// Formats a duration in seconds with one decimal, e.g. `2.5s`.
pub fn format_duration(duration: Duration) -> String {
    format!("{:.1}s", duration.as_secs_f64())
}
