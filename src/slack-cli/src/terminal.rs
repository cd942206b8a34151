//! Terminal implementation of the prompt and output seam.

use std::io::{self, BufRead, IsTerminal, Write};

use slack_apps::IoStreams;
use slack_protocol::{ErrorCode, SlackError, SlackResult};

use crate::styled_output::{bold, print_warning};

/// Prompts on stderr and reads answers from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalIo;

impl TerminalIo {
    fn read_answer(&self, prompt: &str) -> SlackResult<String> {
        let mut stderr = io::stderr();
        write!(stderr, "{prompt}")?;
        stderr.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(SlackError::new(ErrorCode::CancelledByUser));
        }
        Ok(line.trim().to_string())
    }
}

impl IoStreams for TerminalIo {
    fn print_info(&self, message: &str) {
        println!("{message}");
    }

    fn print_warning(&self, message: &str) {
        print_warning(message);
    }

    fn is_tty(&self) -> bool {
        io::stdin().is_terminal() && io::stdout().is_terminal()
    }

    fn confirm(&self, prompt: &str, default: bool) -> SlackResult<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let answer = self.read_answer(&format!("{} {hint} ", bold(prompt)))?;
            match parse_confirmation(&answer, default) {
                Some(choice) => return Ok(choice),
                None => eprintln!("Please answer yes or no"),
            }
        }
    }

    fn input(&self, prompt: &str, default: &str) -> SlackResult<String> {
        let answer = self.read_answer(&format!("{} ", bold(prompt)))?;
        if answer.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer)
        }
    }
}

/// Reads a yes/no answer. An empty answer takes `default`.
fn parse_confirmation(answer: &str, default: bool) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_confirmation() {
        assert_eq!(parse_confirmation("", true), Some(true));
        assert_eq!(parse_confirmation("  ", false), Some(false));
        assert_eq!(parse_confirmation("Y", false), Some(true));
        assert_eq!(parse_confirmation("no", true), Some(false));
        assert_eq!(parse_confirmation("maybe", true), None);
    }
}
