//! Install/update reconciliation.
//!
//! Decides whether an app is created, updated or left alone on the
//! backend, then installs it to its team. Deployed and local-run installs
//! share one flow and differ only in how the manifest is derived and which
//! registry file records the app.
//!
//! For a local manifest the steps are, in order: validate the session,
//! derive the manifest, check for drift against the saved hash, validate
//! the manifest, create or update, save the record and hash, install.
//! A remote manifest skips everything between the session and the install.

mod approval;

use slack_api::{DeveloperInstallOutcome, DeveloperInstallRequest};
use slack_protocol::app::is_enterprise_team_id;
use slack_protocol::warning::BREAKING_CHANGE;
use slack_protocol::{
    App, AppManifest, AuthSession, ErrorCode, GRANT_ALL_ORG_WORKSPACES, InstallResult,
    InstallState, InstallTokens, SlackAuth, SlackError, SlackResult,
};
use slack_storage::{AppRegistry, ManifestCache, ManifestHash, new_manifest_hash};
use tracing::{debug, info};

use crate::clients::Clients;
use crate::source::{manifest_source, read_local_manifest, read_remote_manifest};

pub const APP_TOKEN_ENV: &str = "SLACK_APP_TOKEN";
pub const BOT_TOKEN_ENV: &str = "SLACK_BOT_TOKEN";

const SCHEMA_COMPATIBILITY_ERROR: &str = "schema_compatibility_error";
const UPDATE_PROMPT: &str = "Update app settings with changes to the local manifest?";

/// Options for one install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Workspace an org-level app is granted to, or `all`.
    pub org_grant_workspace_id: Option<String>,
    /// Stop after the manifest is created or updated.
    pub only_create_update_manifest: bool,
    /// Send admin approval requests without prompting.
    pub auto_request_approval: bool,
}

/// Result of an install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// The app record after the install, with any new app ID.
    pub app: App,
    pub state: InstallState,
    /// Tokens from a successful install.
    pub result: Option<InstallResult>,
}

impl InstallOutcome {
    fn not_attempted(app: App) -> Self {
        Self {
            app,
            state: InstallState::NotAttempted,
            result: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Deployed,
    Local,
}

/// Creates or updates a deployed app and installs it.
pub async fn install(
    clients: &Clients,
    auth: &SlackAuth,
    app: App,
    options: &InstallOptions,
) -> SlackResult<InstallOutcome> {
    reconcile(clients, auth, app, options, Target::Deployed).await
}

/// Creates or updates the local-run variant of an app and installs it.
pub async fn install_local_app(
    clients: &Clients,
    auth: &SlackAuth,
    app: App,
    options: &InstallOptions,
) -> SlackResult<InstallOutcome> {
    reconcile(clients, auth, app, options, Target::Local).await
}

async fn reconcile(
    clients: &Clients,
    auth: &SlackAuth,
    mut app: App,
    options: &InstallOptions,
    target: Target,
) -> SlackResult<InstallOutcome> {
    let token = auth.token.as_str();
    let session = clients
        .api
        .validate_session(token)
        .await
        .map_err(|e| e.wrap(ErrorCode::InvalidAuth))?;
    if let Some(enterprise_id) = session.enterprise_id.as_deref().filter(|id| !id.is_empty()) {
        app.enterprise_id = enterprise_id.to_string();
    }

    let manifest = if manifest_source(clients).await?.is_remote() {
        if app.is_new() {
            info!(team_id = %app.team_id, "No app exists and the manifest is kept on app settings");
            return Ok(InstallOutcome::not_attempted(app));
        }
        read_remote_manifest(clients, token, app.app_id()).await?
    } else {
        let manifest = derive_manifest(clients, target).await?;
        let hash = new_manifest_hash(&manifest)?;
        let cache = ManifestCache::new(&clients.project);
        let mut saved = ManifestHash::default();
        if !app.is_new() {
            saved = cache.get_manifest_hash(app.app_id()).await?;
            confirm_manifest_update(clients, &app, &saved, &hash)?;
        }

        validate_manifest(clients, token, &app, &manifest, target).await?;
        app = create_or_update(clients, auth, &session, app, &manifest, target).await?;

        if !clients.config.skip_local_fs {
            let mut registry = AppRegistry::load(&clients.project).await?;
            match target {
                Target::Deployed => registry.save_deployed(app.clone()).await?,
                Target::Local => registry.save_local(app.clone()).await?,
            }
        }
        // A hash already on disk is kept current even when local files are
        // otherwise left alone.
        if !clients.config.skip_local_fs || !saved.is_empty() {
            cache.set_manifest_hash(app.app_id(), &hash).await?;
        }
        manifest
    };

    if options.only_create_update_manifest {
        return Ok(InstallOutcome::not_attempted(app));
    }

    let request = DeveloperInstallRequest {
        app_id: app.app_id().to_string(),
        bot_scopes: manifest.bot_scopes(),
        outgoing_domains: manifest.outgoing_domains(),
        grant_team_id: grant_team_id(&app, options.org_grant_workspace_id.as_deref()),
    };
    info!(app_id = %request.app_id, team_id = %app.team_id, "Installing app");
    let outcome = clients
        .api
        .developer_app_install(token, &request)
        .await
        .map_err(|e| e.wrap(ErrorCode::AppInstall))?;

    let result = match outcome {
        DeveloperInstallOutcome::Installed(result) => result,
        DeveloperInstallOutcome::ApprovalRequired { reason, team_id } => {
            // Approval requests only accept a workspace ID.
            let request_team = if team_id == app.enterprise_id {
                String::new()
            } else {
                team_id
            };
            let state = approval::handle_approval(
                clients,
                token,
                &request,
                reason,
                request_team,
                options.auto_request_approval,
            )
            .await
            .map_err(|e| e.wrap(ErrorCode::AppInstall))?;
            print_install_state(clients, state);
            return Ok(InstallOutcome {
                app,
                state,
                result: None,
            });
        }
    };

    if !manifest.is_hosted() {
        set_app_environment_tokens(clients, &result.tokens)?;
    }
    info!(app_id = %app.app_id(), "Installed app");
    Ok(InstallOutcome {
        app,
        state: InstallState::Success,
        result: Some(result),
    })
}

/// Hash of the manifest an install would send for `local` or deployed
/// apps. This is the value the manifest cache records.
pub async fn manifest_hash(clients: &Clients, local: bool) -> SlackResult<ManifestHash> {
    let target = if local { Target::Local } else { Target::Deployed };
    new_manifest_hash(&derive_manifest(clients, target).await?)
}

async fn derive_manifest(clients: &Clients, target: Target) -> SlackResult<AppManifest> {
    let local = read_local_manifest(&clients.project.root).await?;
    Ok(match target {
        Target::Deployed => local.with_hosted_settings(clients.api.host()),
        Target::Local => local.derive_local_run(),
    })
}

/// The grant sent with an install. Only org-level apps carry one, and
/// `all` becomes the org's own ID.
fn grant_team_id(app: &App, grant: Option<&str>) -> Option<String> {
    let grant = grant.filter(|g| !g.is_empty())?;
    if !is_enterprise_team_id(&app.team_id) {
        return None;
    }
    if grant == GRANT_ALL_ORG_WORKSPACES {
        return Some(app.enterprise_id.clone()).filter(|id| !id.is_empty());
    }
    Some(grant.to_string())
}

/// Asks before overwriting app settings when the manifest changed since
/// the last update, or when no hash was ever saved.
fn confirm_manifest_update(
    clients: &Clients,
    app: &App,
    saved: &ManifestHash,
    hash: &ManifestHash,
) -> SlackResult<()> {
    if saved == hash {
        debug!(app_id = %app.app_id(), "Local manifest is unchanged since the last update");
        return Ok(());
    }

    let notice = if saved.is_empty() {
        "Manifest values for this app are overwritten on reinstall"
    } else {
        "The local manifest has changed since the last update"
    };
    clients.io.print_info(&format!("\nApp Manifest\n   {notice}"));

    if !saved.is_empty() && clients.config.force {
        return Ok(());
    }
    if !clients.io.is_tty() {
        return Err(manifest_update_error(app, !saved.is_empty()));
    }
    if !clients.io.confirm(UPDATE_PROMPT, false)? {
        return Err(manifest_update_error(app, false));
    }
    Ok(())
}

fn manifest_update_error(app: &App, suggest_force: bool) -> SlackError {
    let url = match (app.app_id(), app.enterprise_id.as_str(), app.team_id.as_str()) {
        ("", _, _) => "https://api.slack.com/apps".to_string(),
        (app_id, enterprise_id, _) if !enterprise_id.is_empty() => {
            format!("https://app.slack.com/app-settings/{enterprise_id}/{app_id}/app-manifest")
        }
        (app_id, _, team_id) if !team_id.is_empty() => {
            format!("https://app.slack.com/app-settings/{team_id}/{app_id}/app-manifest")
        }
        (app_id, _, _) => format!("https://api.slack.com/apps/{app_id}"),
    };
    let mut error = SlackError::new(ErrorCode::AppManifestUpdate)
        .with_remediation(format!("Compare app settings: {url}"));
    if suggest_force {
        error = error.append_remediation("Write local manifest values to app settings using `--force`");
    }
    error
}

/// Server-side validation. Breaking changes need confirmation unless
/// `--force` is set; other warnings are only shown.
async fn validate_manifest(
    clients: &Clients,
    token: &str,
    app: &App,
    manifest: &AppManifest,
    target: Target,
) -> SlackResult<()> {
    let app_id = (!app.is_new()).then(|| app.app_id());
    let validation = clients
        .api
        .validate_app_manifest(token, manifest, app_id)
        .await
        .map_err(|e| e.wrap(ErrorCode::AppManifestValidate))?;
    let warnings = validation.warnings;
    let found_warning = warnings.iter().any(|w| w.code != BREAKING_CHANGE);

    if app.is_new() && !found_warning {
        return validation
            .error
            .map_or(Ok(()), |e| Err(e.wrap(ErrorCode::AppManifestValidate)));
    }

    let force = clients.config.force;
    if let Some(error) = validation.error {
        if !error.mentions_code(SCHEMA_COMPATIBILITY_ERROR) {
            debug!(app_id = %app.app_id(), error = %error, "Manifest validation failed");
            return Err(error.wrap(ErrorCode::AppManifestValidate));
        }
        if !force {
            let command = match target {
                Target::Deployed => "deploy --force",
                Target::Local => "run --force",
            };
            clients
                .io
                .print_warning(&format!("Proceed with `{command}` to update your app."));
            return Err(error.wrap(ErrorCode::AppManifestValidate));
        }
    }

    if warnings.is_empty() || force {
        return Ok(());
    }

    let verbose = clients.config.verbose;
    if warnings.has_code(BREAKING_CHANGE) {
        clients.io.print_warning(
            &warnings.format(verbose, "App manifest contains possible breaking changes"),
        );
        let confirmed = clients.io.is_tty() && clients.io.confirm("Confirm changes?", false)?;
        if !confirmed {
            clients.io.print_info("\nApp install canceled.");
            return Err(SlackError::new(ErrorCode::CancelledByUser));
        }
        clients
            .io
            .print_info("\nChanges confirmed: Continuing with install.");
    } else {
        clients.io.print_warning(&warnings.format(
            verbose,
            "App manifest contains some components that may require additional information",
        ));
    }
    Ok(())
}

async fn create_or_update(
    clients: &Clients,
    auth: &SlackAuth,
    session: &AuthSession,
    mut app: App,
    manifest: &AppManifest,
    target: Target,
) -> SlackResult<App> {
    let token = auth.token.as_str();
    if !app.is_new() {
        debug!(app_id = %app.app_id(), "Updating app");
        clients
            .api
            .update_app(token, app.app_id(), manifest, clients.config.force, true)
            .await
            .map_err(|e| e.wrap(ErrorCode::AppManifestUpdate))?;
        if target == Target::Local {
            app.is_dev = true;
        }
        return Ok(app);
    }

    debug!("No app exists so creating a new app");
    let created = clients
        .api
        .create_app(token, manifest, false)
        .await
        .map_err(|e| e.wrap(ErrorCode::AppInstall))?;
    if created.app_id.is_empty() {
        return Err(SlackError::new(ErrorCode::AppCreate).wrap(ErrorCode::AppInstall));
    }
    debug!(app_id = %created.app_id, "Created app");

    app.app_id = Some(created.app_id);
    app.team_id = session
        .team_id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| auth.team_id.clone());
    app.team_domain = auth.team_domain.clone();
    if target == Target::Local {
        app.user_id = session.user_id.clone().unwrap_or_default();
        app.is_dev = true;
    }
    Ok(app)
}

fn print_install_state(clients: &Clients, state: InstallState) {
    let (primary, secondary) = match state {
        InstallState::RequestPending => (
            "Your request to install the app is pending",
            format!(
                "You will receive a Slackbot message after an admin has reviewed your request\n   \
                 Once your request is approved, complete installation by re-running `slack {}`",
                clients.config.command
            ),
        ),
        InstallState::RequestCancelled => {
            ("Your request to install the app has been cancelled", String::new())
        }
        InstallState::RequestNotSent => (
            "You've declined to send a request to an admin",
            "Please submit a request to install or update your app".to_string(),
        ),
        InstallState::Success | InstallState::NotAttempted => return,
    };
    if secondary.is_empty() {
        clients.io.print_info(&format!("\n{primary}"));
    } else {
        clients.io.print_info(&format!("\n{primary}\n   {secondary}"));
    }
}

/// Exports install tokens to the environment without replacing values the
/// developer already set.
fn set_app_environment_tokens(clients: &Clients, tokens: &InstallTokens) -> SlackResult<()> {
    let pairs = [
        (APP_TOKEN_ENV, tokens.app_level.as_str(), "app", "app ID"),
        (BOT_TOKEN_ENV, tokens.bot.as_str(), "bot", "bot ID"),
    ];
    for (key, value, kind, id) in pairs {
        match clients.env.lookup(key) {
            None => clients.env.set(key, value)?,
            Some(existing) if existing != value => {
                clients.io.print_warning(&format!(
                    "The {kind} token differs from the set {key} environment variable\n   \
                     The environment variable will continue to be used\n   \
                     Proceed with caution as this might be associated to an unexpected {id}"
                ));
            }
            Some(_) => {}
        }
    }
    Ok(())
}
