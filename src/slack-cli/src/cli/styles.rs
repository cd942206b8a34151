//! CLI styling and formatting.
//!
//! Defines ANSI colors and formatting for the CLI help output.

use clap::builder::styling::{AnsiColor, Effects, Styles};

/// Help theme for the `slack` command.
pub fn get_styles() -> Styles {
    Styles::styled()
        // Headers (USAGE, COMMANDS, OPTIONS) - Bold magenta
        .header(AnsiColor::Magenta.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Yellow.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .valid(AnsiColor::Cyan.on_default())
        .invalid(AnsiColor::Yellow.on_default())
}

/// After-help section with environment variables documentation.
pub const AFTER_HELP: &str = color_print::cstr!(
    r#"<magenta,bold>QUICK START</>
    <green,bold>slack install</>                  Create or update the app, then install it
    <green,bold>slack install -E local</>         Install the local-run variant of the app
    <green,bold>slack deploy</>                   Package the project and deploy it
    <green,bold>slack app list</>                 Show the project's apps and their status

<magenta,bold>ENVIRONMENT VARIABLES</>
    <yellow>SLACK_CONFIG_DIR</>     Override the user config directory (default: ~/.slack)
    <yellow>SLACK_API_HOST</>       API host (alternative to --apihost)
    <yellow>SLACK_LOG_LEVEL</>      Log verbosity (error, warn, info, debug, trace)
    <yellow>NO_COLOR</>             Disable colored output (set to '1' or 'true')

<magenta,bold>PATHS</>
    <dim>Credentials</>  ~/.slack/credentials.json
    <dim>Apps</>         .slack/apps.json, .slack/apps.dev.json
    <dim>Project</>      .slack/config.json"#
);
