//! Listing the project's apps.

use slack_protocol::manifest::LOCAL_RUN_NAME_TAG;
use slack_protocol::{App, ErrorCode, SlackResult};
use slack_storage::{AppRegistry, CredentialStore};
use tracing::debug;

use crate::clients::Clients;
use crate::status::fetch_app_install_states;

/// Apps in the project with their install status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppListing {
    /// Deployed apps then local apps, sorted by team domain.
    pub apps: Vec<App>,
    /// Team domain of the default deployed app.
    pub default_team_domain: String,
}

pub async fn list(clients: &Clients) -> SlackResult<AppListing> {
    let mut registry = AppRegistry::load(&clients.project)
        .await
        .map_err(|e| e.wrap(ErrorCode::AppsList))?;
    let credentials = CredentialStore::load(&clients.system).await?;

    let mut apps = registry.all_deployed();
    for mut local in registry.all_local() {
        if let Some(auth) = credentials.auth_with_team_id(&local.team_id) {
            // Older records carry "dev" as their domain.
            if local.team_domain != auth.team_domain && !clients.config.skip_local_fs {
                local.team_domain = auth.team_domain.clone();
                if let Err(e) = registry.save_local(local.clone()).await {
                    debug!(team_id = %local.team_id, error = %e, "Failed to update local app domain");
                }
            }
            local.team_domain = format!("{} {LOCAL_RUN_NAME_TAG}", auth.team_domain);
        }
        apps.push(local);
    }

    let mut apps = fetch_app_install_states(clients, apps).await?;
    apps.sort_by(|a, b| a.team_domain.cmp(&b.team_domain));
    Ok(AppListing {
        apps,
        default_team_domain: registry.apps().default_team_domain.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestClients;
    use pretty_assertions::assert_eq;
    use slack_api::{AppStatusInfo, AppStatusResult};
    use slack_protocol::{InstallStatus, SlackAuth};

    #[tokio::test]
    async fn test_list_tags_local_apps_and_sorts() {
        let t = TestClients::new();
        t.write_project_file(
            ".slack/apps.json",
            r#"{"apps":{"T2":{"app_id":"A2","team_id":"T2","team_domain":"zeta"}},"default":"zeta"}"#,
        );
        t.write_project_file(
            ".slack/apps.dev.json",
            r#"{"T1":{"app_id":"A1","team_id":"T1","team_domain":"dev","user_id":"U1","IsDev":true}}"#,
        );
        t.write_credentials(&[SlackAuth {
            token: "xoxp-T1".to_string(),
            team_domain: "acme".to_string(),
            team_id: "T1".to_string(),
            ..Default::default()
        }]);
        t.api.set_status(
            "xoxp-T1",
            Ok(AppStatusResult {
                apps: vec![AppStatusInfo {
                    app_id: "A1".to_string(),
                    installed: true,
                    ..Default::default()
                }],
                ..Default::default()
            }),
        );

        let listing = list(&t.clients()).await.unwrap();

        assert_eq!(listing.default_team_domain, "zeta");
        let domains: Vec<&str> = listing.apps.iter().map(|a| a.team_domain.as_str()).collect();
        assert_eq!(domains, vec!["acme (local)", "zeta"]);
        assert_eq!(listing.apps[0].install_status, InstallStatus::Installed);
        assert_eq!(listing.apps[1].install_status, InstallStatus::Unknown);

        let registry = AppRegistry::load(t.project()).await.unwrap();
        assert_eq!(registry.local("T1").unwrap().team_domain, "acme");
    }

    #[tokio::test]
    async fn test_unreadable_registry_is_wrapped() {
        let t = TestClients::new();
        t.write_project_file(".slack/apps.json", "{ broken");

        let err = list(&t.clients()).await.unwrap_err();
        assert!(err.is(ErrorCode::AppsList));
    }
}
