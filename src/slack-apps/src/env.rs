//! Process environment seam.

use slack_protocol::SlackResult;

/// Reads and writes environment variables.
pub trait Environment: Send + Sync {
    /// The variable's value, or `None` when unset.
    fn lookup(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> SlackResult<()>;
}

/// The environment of the running process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set(&self, key: &str, value: &str) -> SlackResult<()> {
        // SAFETY: commands run to completion on one task; nothing else reads
        // or writes the environment while a command is setting tokens.
        unsafe {
            std::env::set_var(key, value);
        }
        Ok(())
    }
}
