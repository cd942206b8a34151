//! Command dispatch and execution handlers.
//!
//! Each handler resolves the login it acts with, picks the app record
//! from the project registry and calls into `slack_apps`.

use std::sync::Arc;

use anyhow::{Result, bail};
use serde_json::json;
use slack_api::{ApiClient, DEFAULT_API_HOST, HttpApiClient};
use slack_apps::install::InstallOptions;
use slack_apps::{
    AppListing, Clients, Config, NoopTriggers, ProcessEnvironment, TriggerGenerator, runtime,
};
use slack_protocol::{App, ErrorCode, InstallState, SlackAuth, SlackError};
use slack_storage::{AppRegistry, ManifestSource, ProjectPaths, SystemPaths, set_manifest_source};
use tracing::debug;

use super::args::*;
use crate::styled_output::{
    MessageType, bold, format_duration, format_size, println_dim, println_info, println_success,
    styled_label,
};
use crate::terminal::TerminalIo;

/// Dispatch a CLI command to its handler.
pub async fn dispatch_command(cli: Cli) -> Result<()> {
    let mut clients = build_clients(&cli)?;
    let session = Session {
        team: cli.team.clone(),
        host_from_flag: cli.api_host.as_deref().is_some_and(|h| !h.is_empty()),
    };

    match cli.command {
        Commands::Install(args) => run_install(&mut clients, &session, args).await,
        Commands::Deploy(args) => run_deploy(&mut clients, &session, args).await,
        Commands::App(AppCommand::List { json }) => run_app_list(&clients, json).await,
        Commands::App(AppCommand::Add {
            org_workspace_grant,
        }) => run_app_add(&mut clients, &session, org_workspace_grant).await,
        Commands::App(AppCommand::Delete { environment, yes }) => {
            run_app_delete(&mut clients, &session, environment, yes).await
        }
        Commands::App(AppCommand::Uninstall { environment }) => {
            run_app_uninstall(&mut clients, &session, environment).await
        }
        Commands::Manifest(ManifestCommand::Source { source }) => {
            run_manifest_source(&clients, source).await
        }
        Commands::Manifest(ManifestCommand::Hash { environment }) => {
            run_manifest_hash(&clients, environment).await
        },
    }
}

/// Login selection flags shared by every command.
struct Session {
    team: Option<String>,
    host_from_flag: bool,
}

/// Builds the collaborators for one invocation from the parsed flags.
pub fn build_clients(cli: &Cli) -> Result<Clients> {
    let project = match &cli.app_dir {
        Some(dir) => ProjectPaths::new(dir.clone()),
        None => ProjectPaths::current_dir()?,
    };
    let runtime = match cli.runtime.as_deref() {
        Some(name) => Some(runtime::from_name(name)?),
        None => runtime::detect(&project.root),
    };
    let host = cli
        .api_host
        .clone()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| DEFAULT_API_HOST.to_string());
    let api: Arc<dyn ApiClient> = Arc::new(HttpApiClient::new(host)?);

    Ok(Clients {
        api,
        io: Arc::new(TerminalIo),
        env: Arc::new(ProcessEnvironment),
        runtime,
        config: Config {
            force: cli.force,
            skip_local_fs: cli.skip_local_fs,
            verbose: cli.verbose || cli.trace,
            experiments: cli.experiments.clone(),
            token: cli.token.clone(),
            command: cli.command.name(),
        },
        project,
        system: SystemPaths::new()?,
    })
}

/// Resolves the login and points the API client at its host, unless
/// `--apihost` chose one.
async fn login(clients: &mut Clients, session: &Session) -> Result<SlackAuth> {
    let auth = slack_apps::resolve_auth(clients, session.team.as_deref()).await?;
    if !session.host_from_flag
        && let Some(host) = auth.api_host()
        && host != clients.api.host()
    {
        clients.api = clients.api.with_host(host);
    }
    debug!(team_id = %auth.team_id, team_domain = %auth.team_domain, host = %clients.api.host(), "Using login");
    Ok(auth)
}

/// The registry record for the team, or a new one.
fn select_app(registry: &AppRegistry, environment: EnvironmentArg, team_id: &str) -> App {
    match environment {
        EnvironmentArg::Deployed => registry.deployed_or_new(team_id),
        EnvironmentArg::Local => registry.local_or_new(team_id),
    }
}

async fn run_install(clients: &mut Clients, session: &Session, args: InstallArgs) -> Result<()> {
    let auth = login(clients, session).await?;
    let registry = AppRegistry::load(&clients.project).await?;
    let app = select_app(&registry, args.environment, &auth.team_id);

    let options = InstallOptions {
        org_grant_workspace_id: args.org_workspace_grant,
        only_create_update_manifest: false,
        auto_request_approval: args.auto_request_aaa,
    };
    let outcome = match args.environment {
        EnvironmentArg::Deployed => slack_apps::install(clients, &auth, app, &options).await?,
        EnvironmentArg::Local => slack_apps::install_local_app(clients, &auth, app, &options).await?,
    };

    report_install(&outcome.app, outcome.state);
    Ok(())
}

fn report_install(app: &App, state: InstallState) {
    match state {
        InstallState::Success => println_success(&format!(
            "App {} installed to {}",
            bold(app.app_id()),
            bold(&app.team_domain)
        )),
        InstallState::NotAttempted if !app.is_new() => {
            println_info(&format!("App {} is up to date", bold(app.app_id())))
        }
        InstallState::NotAttempted => println_info("No app was installed"),
        // The reconciler has already explained these.
        InstallState::RequestPending | InstallState::RequestCancelled | InstallState::RequestNotSent => {}
    }
}

async fn run_deploy(clients: &mut Clients, session: &Session, args: DeployArgs) -> Result<()> {
    let auth = login(clients, session).await?;
    let registry = AppRegistry::load(&clients.project).await?;
    let app = registry.deployed_or_new(&auth.team_id);

    let triggers: Option<&dyn TriggerGenerator> = if args.hide_triggers {
        None
    } else {
        Some(&NoopTriggers)
    };
    let result = slack_apps::deploy(clients, &auth, app, triggers).await?;

    println_dim(&format!(
        "App packaged and ready to deploy: {} was packaged in {}",
        format_size(result.package_size),
        format_duration(result.package_time)
    ));
    println_success(&format!(
        "{} deployed in {}",
        bold(&result.app_name),
        format_duration(result.deploy_time)
    ));
    println_dim(&format!("App ID: {}", result.app.app_id()));
    Ok(())
}

async fn run_app_list(clients: &Clients, json: bool) -> Result<()> {
    let listing = slack_apps::list(clients).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&listing_json(&listing))?);
        return Ok(());
    }
    if listing.apps.is_empty() {
        println_info("This project has no apps");
        return Ok(());
    }
    for app in &listing.apps {
        let status = match app.install_status {
            slack_protocol::InstallStatus::Installed => {
                styled_label(MessageType::Success, "Installed")
            }
            slack_protocol::InstallStatus::Uninstalled => {
                styled_label(MessageType::Warning, "Uninstalled")
            }
            slack_protocol::InstallStatus::Unknown => styled_label(MessageType::Dim, "Unknown"),
        };
        let marker = if app.team_domain == listing.default_team_domain {
            " (default)"
        } else {
            ""
        };
        println!("{}{marker}", bold(&app.team_domain));
        println!("  App ID: {}", app.app_id());
        println!("  Team ID: {}", app.team_id);
        println!("  Status: {status}");
    }
    Ok(())
}

/// JSON shape of `app list --json`.
pub fn listing_json(listing: &AppListing) -> serde_json::Value {
    let apps: Vec<serde_json::Value> = listing
        .apps
        .iter()
        .map(|app| {
            json!({
                "app_id": app.app_id(),
                "team_id": app.team_id,
                "team_domain": app.team_domain,
                "enterprise_id": app.enterprise_id,
                "environment": app.environment(),
                "status": app.install_status,
            })
        })
        .collect();
    json!({ "apps": apps, "default": listing.default_team_domain })
}

async fn run_app_add(clients: &mut Clients, session: &Session, org_grant: Option<String>) -> Result<()> {
    let auth = login(clients, session).await?;
    let registry = AppRegistry::load(&clients.project).await?;
    let app = registry.deployed_or_new(&auth.team_id);

    let (state, app) = slack_apps::add(clients, &auth, app, org_grant).await?;
    report_install(&app, state);
    Ok(())
}

async fn run_app_delete(
    clients: &mut Clients,
    session: &Session,
    environment: EnvironmentArg,
    yes: bool,
) -> Result<()> {
    let auth = login(clients, session).await?;
    let registry = AppRegistry::load(&clients.project).await?;
    let app = select_app(&registry, environment, &auth.team_id);

    if !yes {
        if !clients.io.is_tty() {
            return Err(SlackError::new(ErrorCode::CancelledByUser)
                .with_remediation("Re-run with `--yes` to delete without a prompt")
                .into());
        }
        let prompt = format!(
            "Are you sure you want to delete the app {} from {}?",
            app.app_id(),
            auth.team_domain
        );
        if !clients.io.confirm(&prompt, false)? {
            bail!(SlackError::new(ErrorCode::CancelledByUser));
        }
    }

    slack_apps::delete(clients, &auth, &app).await?;
    println_success(&format!("Deleted app {} from {}", app.app_id(), auth.team_domain));
    Ok(())
}

async fn run_app_uninstall(
    clients: &mut Clients,
    session: &Session,
    environment: EnvironmentArg,
) -> Result<()> {
    let auth = login(clients, session).await?;
    let registry = AppRegistry::load(&clients.project).await?;
    let app = select_app(&registry, environment, &auth.team_id);

    slack_apps::uninstall(clients, &auth, &app).await?;
    println_success(&format!(
        "Uninstalled app {} from {}",
        app.app_id(),
        auth.team_domain
    ));
    Ok(())
}

async fn run_manifest_source(clients: &Clients, source: Option<ManifestSourceArg>) -> Result<()> {
    match source {
        None => {
            let source = slack_apps::manifest_source(clients).await?;
            println!("{source}");
        }
        Some(arg) => {
            let source = match arg {
                ManifestSourceArg::Local => ManifestSource::Local,
                ManifestSourceArg::Remote => ManifestSource::Remote,
            };
            set_manifest_source(&clients.project, source).await?;
            println_success(&format!("Manifest source set to {}", bold(source.as_str())));
        }
    }
    Ok(())
}

async fn run_manifest_hash(clients: &Clients, environment: EnvironmentArg) -> Result<()> {
    let hash = slack_apps::manifest_hash(clients, environment == EnvironmentArg::Local).await?;
    println!("{}", hash.as_str());
    Ok(())
}
