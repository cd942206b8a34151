//! Slack CLI - Main entry point.
//!
//! Parses arguments, sets up logging and dispatches the command. Errors
//! from the app operations are rendered with their suggestions before the
//! process exits with status 1.

use anyhow::Result;
use clap::Parser;

use slack_cli::cli::{Cli, ColorMode, LogLevel, dispatch_command};
use slack_cli::styled_output::print_error;
use slack_protocol::SlackError;

/// Guard that ensures debug log file is properly flushed when dropped.
struct DebugLogGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Set up debug file logging that writes ALL trace-level logs to ./debug.txt.
fn setup_debug_file_logging() -> Result<DebugLogGuard> {
    use std::fs::File;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let debug_file_path = std::env::current_dir()?.join("debug.txt");
    let file = File::create(&debug_file_path).map_err(|e| {
        anyhow::anyhow!("Failed to create debug.txt: {}. Check write permissions.", e)
    })?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new("trace"))
        .with(file_layer)
        .init();

    eprintln!("Debug mode enabled: logging to {}", debug_file_path.display());
    Ok(DebugLogGuard { _guard: guard })
}

fn setup_logging(cli: &Cli) {
    let log_level = if cli.trace {
        LogLevel::Trace
    } else if cli.verbose {
        LogLevel::Debug
    } else if let Ok(env_level) = std::env::var("SLACK_LOG_LEVEL") {
        LogLevel::from_str_loose(&env_level).unwrap_or(cli.log_level)
    } else {
        cli.log_level
    };

    let filter_str = if std::env::var("RUST_LOG").is_ok() {
        let level = log_level.as_filter_str();
        format!(
            "error,slack={level},slack_cli={level},slack_apps={level},slack_api={level},slack_storage={level}"
        )
    } else {
        log_level.as_filter_str().to_string()
    };

    tracing_subscriber::fmt()
        .with_env_filter(&filter_str)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // SAFETY: Environment variable mutations happen early before threads spawn
    match cli.color {
        ColorMode::Never => unsafe { std::env::set_var("NO_COLOR", "1") },
        ColorMode::Always => unsafe { std::env::remove_var("NO_COLOR") },
        ColorMode::Auto => {}
    }

    let debug_guard = if cli.debug {
        Some(setup_debug_file_logging()?)
    } else {
        setup_logging(&cli);
        None
    };

    let verbose = cli.verbose || cli.trace;
    if let Err(err) = dispatch_command(cli).await {
        match err.downcast_ref::<SlackError>() {
            Some(slack_err) => print_error(&slack_err.render(verbose)),
            None => print_error(&format!("{err:#}")),
        }
        drop(debug_guard);
        std::process::exit(1);
    }
    Ok(())
}
