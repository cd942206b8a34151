//! Terminal seam used for notices and prompts.

use slack_protocol::SlackResult;

/// Output and prompts for one command.
///
/// The CLI implements this over the terminal; tests record what was
/// printed and script the answers.
pub trait IoStreams: Send + Sync {
    /// Informational output on stdout.
    fn print_info(&self, message: &str);

    /// Warnings on stderr.
    fn print_warning(&self, message: &str);

    /// True when both stdin and stdout are attached to a terminal.
    fn is_tty(&self) -> bool;

    /// Asks a yes/no question. Returns `default` on an empty answer.
    fn confirm(&self, prompt: &str, default: bool) -> SlackResult<bool>;

    /// Asks for a line of text. Returns `default` on an empty answer.
    fn input(&self, prompt: &str, default: &str) -> SlackResult<String>;
}
