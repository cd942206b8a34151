//! Adding an app to the project.

use slack_protocol::{App, ErrorCode, InstallState, SlackAuth, SlackResult};
use slack_storage::AppRegistry;
use tracing::info;

use crate::clients::Clients;
use crate::install::{InstallOptions, install};

/// Creates (or updates) the deployed app, installs it, and makes sure the
/// project records it.
pub async fn add(
    clients: &Clients,
    auth: &SlackAuth,
    mut app: App,
    org_grant_workspace_id: Option<String>,
) -> SlackResult<(InstallState, App)> {
    clients
        .api
        .validate_session(&auth.token)
        .await
        .map_err(|e| e.wrap(ErrorCode::InvalidAuth).wrap(ErrorCode::AddAppToProject))?;

    if app.team_id.is_empty() {
        app.team_id = auth.team_id.clone();
    }
    info!(team_id = %app.team_id, "Adding app");

    let options = InstallOptions {
        org_grant_workspace_id,
        ..Default::default()
    };
    let outcome = install(clients, auth, app, &options)
        .await
        .map_err(|e| e.wrap(ErrorCode::AppAdd).wrap(ErrorCode::AddAppToProject))?;

    if clients.config.skip_local_fs {
        return Ok((outcome.state, outcome.app));
    }

    let mut registry = AppRegistry::load(&clients.project)
        .await
        .map_err(|e| e.wrap(ErrorCode::AddAppToProject))?;
    if let Err(e) = registry.new_deployed(&outcome.app.team_id).await {
        if !e.is(ErrorCode::AppFound) {
            return Err(e.wrap(ErrorCode::AddAppToProject));
        }
    }
    let app = registry.deployed(&outcome.app.team_id).unwrap_or(outcome.app);
    Ok((outcome.state, app))
}
