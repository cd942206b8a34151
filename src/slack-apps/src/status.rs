//! Install status of apps across every authorized team.

use std::collections::HashMap;

use futures::future::join_all;
use slack_api::AppStatusResult;
use slack_protocol::{App, EnterpriseGrant, InstallStatus, SlackAuth, SlackResult};
use tracing::debug;

use crate::auth::all_auths;
use crate::clients::Clients;

/// Fills in `install_status` and `enterprise_grants` for `apps`.
///
/// One `apps.status` query is made per credential whose team owns any of
/// the apps, each against the credential's own API host. A failed query
/// leaves its apps `Unknown`. Apps come back in input order.
pub async fn fetch_app_install_states(clients: &Clients, apps: Vec<App>) -> SlackResult<Vec<App>> {
    let mut by_team: HashMap<&str, Vec<String>> = HashMap::new();
    let mut by_enterprise: HashMap<&str, Vec<String>> = HashMap::new();
    for app in apps.iter().filter(|a| !a.is_new()) {
        by_team
            .entry(app.team_id.as_str())
            .or_default()
            .push(app.app_id().to_string());
        if app.is_enterprise_workspace_app() {
            by_enterprise
                .entry(app.enterprise_id.as_str())
                .or_default()
                .push(app.app_id().to_string());
        }
    }

    let auths = all_auths(clients).await?;
    let queries = auths.iter().filter_map(|auth| {
        let team_ids = by_team.get(auth.team_id.as_str());
        let enterprise_ids = by_enterprise.get(auth.team_id.as_str());
        if team_ids.is_none_or(Vec::is_empty) && enterprise_ids.is_none_or(Vec::is_empty) {
            return None;
        }
        let mut app_ids = Vec::new();
        if auth.is_enterprise_install {
            app_ids.extend(enterprise_ids.into_iter().flatten().cloned());
        }
        app_ids.extend(team_ids.into_iter().flatten().cloned());
        Some(query_status(clients, auth, app_ids))
    });
    let results = join_all(queries).await;

    let mut statuses: HashMap<String, (InstallStatus, Vec<EnterpriseGrant>)> = HashMap::new();
    for result in results.into_iter().flatten() {
        for status in result.apps {
            let state = if status.installed {
                InstallStatus::Installed
            } else {
                InstallStatus::Uninstalled
            };
            statuses.insert(status.app_id, (state, status.enterprise_grants));
        }
    }

    Ok(apps
        .into_iter()
        .map(|mut app| {
            match statuses.get(app.app_id()) {
                Some((state, grants)) => {
                    app.install_status = *state;
                    app.enterprise_grants = grants.clone();
                }
                None => app.install_status = InstallStatus::Unknown,
            }
            app
        })
        .collect())
}

async fn query_status(
    clients: &Clients,
    auth: &SlackAuth,
    app_ids: Vec<String>,
) -> Option<AppStatusResult> {
    let api = match auth.api_host() {
        Some(host) => clients.api.with_host(host),
        None => clients.api.with_host(clients.api.host()),
    };
    match api.get_app_status(&auth.token, &app_ids, &auth.team_id).await {
        Ok(result) => Some(result),
        Err(e) => {
            debug!(team_id = %auth.team_id, ?app_ids, error = %e, "Failed to fetch installation status");
            None
        }
    }
}
