//! Credential resolution for commands.

use chrono::Utc;
use slack_protocol::{ErrorCode, SlackAuth, SlackError, SlackResult};
use slack_storage::CredentialStore;

use crate::clients::Clients;

/// A credential for an ad hoc `--token`, resolved through `auth.test`.
pub async fn auth_with_token(clients: &Clients, token: &str) -> SlackResult<SlackAuth> {
    let session = clients.api.validate_session(token).await?;
    Ok(SlackAuth {
        token: token.to_string(),
        team_domain: session.team_domain().unwrap_or_default(),
        team_id: session.team_id.clone().unwrap_or_default(),
        enterprise_id: session.enterprise_id().to_string(),
        user_id: session.user_id.clone().unwrap_or_default(),
        last_updated: Some(Utc::now()),
        api_host: None,
        is_enterprise_install: session.is_enterprise_install.unwrap_or(false),
    })
}

/// Every stored credential, plus the `--token` credential when one is set.
pub async fn all_auths(clients: &Clients) -> SlackResult<Vec<SlackAuth>> {
    let mut auths = CredentialStore::load(&clients.system).await?.auths();
    if let Some(token) = clients.config.token.as_deref().filter(|t| !t.is_empty()) {
        auths.push(auth_with_token(clients, token).await?);
    }
    Ok(auths)
}

/// The credential a command acts with.
///
/// `--token` wins. Otherwise `team` picks a stored login by team ID or
/// domain; without it the only login, or the first by domain, is used.
pub async fn resolve_auth(clients: &Clients, team: Option<&str>) -> SlackResult<SlackAuth> {
    if let Some(token) = clients.config.token.as_deref().filter(|t| !t.is_empty()) {
        return auth_with_token(clients, token).await;
    }
    let store = CredentialStore::load(&clients.system).await?;
    match team.filter(|t| !t.is_empty()) {
        Some(team) => store
            .auth_with_team_id(team)
            .or_else(|| store.auth_with_team_domain(team))
            .ok_or_else(|| {
                SlackError::new(ErrorCode::TeamNotFound)
                    .with_message(format!("No login found for team '{team}'"))
                    .with_remediation("Use the command `slack login` to authorize this team")
            }),
        None => store
            .auths()
            .into_iter()
            .next()
            .ok_or_else(|| SlackError::new(ErrorCode::CredentialsNotFound)),
    }
}
