//! Slack CLI library.
//!
//! - `cli/` - Command-line argument parsing and dispatch
//! - `styled_output` - Colored terminal messages
//! - `terminal` - Prompts and output for the app operations

pub mod cli;
pub mod styled_output;
pub mod terminal;

pub use cli::{Cli, dispatch_command};
