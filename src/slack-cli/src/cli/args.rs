//! CLI argument structures and parsing.
//!
//! Defines all command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use super::styles::{AFTER_HELP, get_styles};

/// Log verbosity level for CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors (default)
    #[default]
    Warn,
    /// Show informational messages, warnings, and errors
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<LogLevel> {
        match s.to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Color output mode for CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ColorMode {
    /// Automatically detect if output is a terminal
    #[default]
    Auto,
    /// Always output with colors
    Always,
    /// Never output with colors
    Never,
}

/// Which variant of the app a command acts on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum EnvironmentArg {
    /// The app recorded in `.slack/apps.json`
    #[default]
    Deployed,
    /// The local-run app recorded in `.slack/apps.dev.json`
    Local,
}

/// Manifest source accepted by `manifest source`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ManifestSourceArg {
    Local,
    Remote,
}

/// Slack CLI - create, install and deploy Slack apps
#[derive(Parser, Debug)]
#[command(name = "slack")]
#[command(author, version)]
#[command(about = "Slack CLI - create, install and deploy Slack apps", long_about = None)]
#[command(styles = get_styles(), after_help = AFTER_HELP)]
pub struct Cli {
    /// Enable verbose output (same as --log-level debug)
    #[arg(long = "verbose", short = 'v', global = true)]
    pub verbose: bool,

    /// Enable trace-level logging for debugging
    #[arg(long = "trace", global = true)]
    pub trace: bool,

    /// Log level
    #[arg(long = "log-level", global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Write all trace-level logs to ./debug.txt
    #[arg(long = "debug", global = true)]
    pub debug: bool,

    /// Control color output: auto (default), always, or never
    #[arg(long = "color", global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// API host, e.g. https://dev1234.slack.com
    #[arg(long = "apihost", global = true, env = "SLACK_API_HOST", value_name = "URL")]
    pub api_host: Option<String>,

    /// Act with this token instead of a stored login
    #[arg(long = "token", global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Team ID or domain of the stored login to use
    #[arg(long = "team", short = 'w', global = true, value_name = "TEAM")]
    pub team: Option<String>,

    /// Skip confirmation prompts about local manifest changes
    #[arg(long = "force", short = 'f', global = true)]
    pub force: bool,

    /// Never write the project's app registry or manifest cache
    #[arg(long = "skip-local-fs", global = true)]
    pub skip_local_fs: bool,

    /// Enable an experiment, e.g. bolt
    #[arg(long = "experiment", short = 'e', global = true, value_name = "NAME")]
    pub experiments: Vec<String>,

    /// Project directory (default: the current directory)
    #[arg(long = "app-dir", global = true, value_name = "DIR")]
    pub app_dir: Option<PathBuf>,

    /// Project runtime, when it cannot be detected from the project files
    #[arg(long = "runtime", global = true, value_name = "NAME")]
    pub runtime: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or update the app on its team, then install it
    Install(InstallArgs),

    /// Package the project and deploy it to Slack's hosting
    Deploy(DeployArgs),

    /// Manage the project's apps
    #[command(subcommand)]
    App(AppCommand),

    /// Inspect the project's manifest settings
    #[command(subcommand)]
    Manifest(ManifestCommand),
}

impl Commands {
    /// Command name used in hints such as `slack deploy --force`.
    pub fn name(&self) -> String {
        match self {
            Commands::Install(_) => "install".to_string(),
            Commands::Deploy(_) => "deploy".to_string(),
            Commands::App(cmd) => format!("app {}", cmd.name()),
            Commands::Manifest(cmd) => format!("manifest {}", cmd.name()),
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct InstallArgs {
    /// Install the deployed app or the local-run app
    #[arg(long, short = 'E', value_enum, default_value_t = EnvironmentArg::Deployed)]
    pub environment: EnvironmentArg,

    /// Workspace to grant an org-level app to, or `all`
    #[arg(long = "org-workspace-grant", value_name = "ID")]
    pub org_workspace_grant: Option<String>,

    /// Request admin approval without prompting when it is required
    #[arg(long = "auto-request-aaa")]
    pub auto_request_aaa: bool,
}

#[derive(Args, Debug, Default)]
pub struct DeployArgs {
    /// Skip creating triggers during the deploy
    #[arg(long = "hide-triggers")]
    pub hide_triggers: bool,
}

#[derive(Subcommand, Debug)]
pub enum AppCommand {
    /// List the project's apps and their install status
    List {
        /// Print the apps as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create, install and record a deployed app for the team
    Add {
        /// Workspace to grant an org-level app to, or `all`
        #[arg(long = "org-workspace-grant", value_name = "ID")]
        org_workspace_grant: Option<String>,
    },

    /// Delete the app from Slack and from the project
    Delete {
        #[arg(long, short = 'E', value_enum, default_value_t = EnvironmentArg::Deployed)]
        environment: EnvironmentArg,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Uninstall the app from its team
    Uninstall {
        #[arg(long, short = 'E', value_enum, default_value_t = EnvironmentArg::Deployed)]
        environment: EnvironmentArg,
    },
}

impl AppCommand {
    pub fn name(&self) -> &'static str {
        match self {
            AppCommand::List { .. } => "list",
            AppCommand::Add { .. } => "add",
            AppCommand::Delete { .. } => "delete",
            AppCommand::Uninstall { .. } => "uninstall",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ManifestCommand {
    /// Show or set where the manifest of record lives
    Source {
        #[arg(value_enum)]
        source: Option<ManifestSourceArg>,
    },

    /// Print the hash of the local manifest as the manifest cache records it
    Hash {
        /// Hash the manifest sent for this kind of app
        #[arg(long, short = 'E', value_enum, default_value_t = EnvironmentArg::Deployed)]
        environment: EnvironmentArg,
    },
}

impl ManifestCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ManifestCommand::Source { .. } => "source",
            ManifestCommand::Hash { .. } => "hash",
        }
    }
}
