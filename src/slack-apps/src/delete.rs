//! Deleting and uninstalling apps.

use slack_protocol::{App, AuthSession, ErrorCode, SlackAuth, SlackError, SlackResult};
use slack_storage::AppRegistry;
use tracing::{debug, info};

use crate::clients::Clients;

async fn checked_session(clients: &Clients, auth: &SlackAuth, app: &App) -> SlackResult<AuthSession> {
    let session = clients
        .api
        .validate_session(&auth.token)
        .await
        .map_err(|e| e.wrap(ErrorCode::InvalidAuth).wrap(ErrorCode::AppRemove))?;
    if app.is_new() {
        let domain = if app.team_domain.is_empty() {
            auth.team_domain.as_str()
        } else {
            app.team_domain.as_str()
        };
        return Err(SlackError::new(ErrorCode::AppNotFound)
            .with_message(format!("App not found for team '{domain}'"))
            .wrap(ErrorCode::AppRemove));
    }
    Ok(session)
}

/// Deletes the app on the backend and drops its registry record.
pub async fn delete(clients: &Clients, auth: &SlackAuth, app: &App) -> SlackResult<()> {
    checked_session(clients, auth, app).await?;

    info!(app_id = %app.app_id(), team_id = %app.team_id, "Deleting app");
    clients
        .api
        .delete_app(&auth.token, app.app_id())
        .await
        .map_err(|e| e.wrap(ErrorCode::AppDelete))?;

    let mut registry = AppRegistry::load(&clients.project).await?;
    if registry.remove(app).await?.is_none() {
        debug!(
            app_id = %app.app_id(),
            team_id = %app.team_id,
            "Deleted app was not found in project files"
        );
    }
    registry.clean_up().await;
    Ok(())
}

/// Uninstalls the app from its team. The registry is left as it is.
pub async fn uninstall(clients: &Clients, auth: &SlackAuth, app: &App) -> SlackResult<()> {
    checked_session(clients, auth, app).await?;

    info!(app_id = %app.app_id(), team_id = %app.team_id, "Uninstalling app");
    clients
        .api
        .developer_app_uninstall(&auth.token, app.app_id(), &app.team_id)
        .await
}
