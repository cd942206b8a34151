//! User credentials stored at `~/.slack/credentials.json`.

use std::collections::BTreeMap;

use slack_protocol::{SlackAuth, SlackResult};
use tracing::debug;

use crate::paths::{SystemPaths, read_optional, write_private};

/// Stored logins keyed by team ID.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    paths: SystemPaths,
    auths: BTreeMap<String, SlackAuth>,
}

impl CredentialStore {
    /// Loads `credentials.json`; a missing file means no logins.
    pub async fn load(paths: &SystemPaths) -> SlackResult<Self> {
        let mut auths: BTreeMap<String, SlackAuth> = match read_optional(&paths.credentials_file).await? {
            Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => {
                serde_json::from_slice(&bytes)?
            }
            _ => BTreeMap::new(),
        };
        for (team_id, auth) in auths.iter_mut() {
            if auth.team_id.is_empty() {
                auth.team_id = team_id.clone();
            }
        }
        debug!(path = %paths.credentials_file.display(), count = auths.len(), "Loaded credentials");
        Ok(Self {
            paths: paths.clone(),
            auths,
        })
    }

    /// All logins sorted by team domain.
    pub fn auths(&self) -> Vec<SlackAuth> {
        let mut auths: Vec<SlackAuth> = self.auths.values().cloned().collect();
        auths.sort_by(|a, b| a.team_domain.cmp(&b.team_domain));
        auths
    }

    pub fn is_empty(&self) -> bool {
        self.auths.is_empty()
    }

    pub fn auth_with_team_id(&self, team_id: &str) -> Option<SlackAuth> {
        self.auths.get(team_id).cloned()
    }

    pub fn auth_with_team_domain(&self, team_domain: &str) -> Option<SlackAuth> {
        self.auths
            .values()
            .find(|auth| auth.team_domain == team_domain)
            .cloned()
    }

    /// Saves or replaces the login for `auth.team_id`.
    pub async fn set_auth(&mut self, auth: SlackAuth) -> SlackResult<()> {
        self.auths.insert(auth.team_id.clone(), auth);
        let json = serde_json::to_vec_pretty(&self.auths)?;
        write_private(&self.paths.credentials_file, &json).await
    }
}
