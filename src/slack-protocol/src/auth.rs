//! Stored credentials and validated sessions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored login for one team, as kept in `credentials.json`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackAuth {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(default)]
    pub team_domain: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub enterprise_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    /// Backend host this login was created against, when not the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_host: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_enterprise_install: bool,
}

impl fmt::Debug for SlackAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackAuth")
            .field("token", &"[REDACTED]")
            .field("team_domain", &self.team_domain)
            .field("team_id", &self.team_id)
            .field("enterprise_id", &self.enterprise_id)
            .field("user_id", &self.user_id)
            .field("last_updated", &self.last_updated)
            .field("api_host", &self.api_host)
            .field("is_enterprise_install", &self.is_enterprise_install)
            .finish()
    }
}

impl SlackAuth {
    /// Host this credential's requests go to, if it overrides the default.
    pub fn api_host(&self) -> Option<&str> {
        self.api_host.as_deref().filter(|h| !h.is_empty())
    }
}

/// Identity resolved by validating a token (`auth.test`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Team display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enterprise_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_enterprise_install: Option<bool>,
    /// Workspace URL, e.g. `https://acme.slack.com/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl AuthSession {
    /// The first DNS label of the workspace URL.
    pub fn team_domain(&self) -> Option<String> {
        let url = self.url.as_deref()?;
        let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
        let host = without_scheme.split('/').next()?;
        let label = host.split('.').next()?;
        (!label.is_empty()).then(|| label.to_string())
    }

    pub fn enterprise_id(&self) -> &str {
        self.enterprise_id.as_deref().unwrap_or_default()
    }
}
