//! App records and the project's app registry document.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ErrorCode, SlackError, SlackResult};

/// Org grant value that installs an org-level app to every workspace.
pub const GRANT_ALL_ORG_WORKSPACES: &str = "all";

/// Install status of an app on its team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallStatus {
    #[default]
    Unknown,
    Installed,
    Uninstalled,
}

impl fmt::Display for InstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InstallStatus::Unknown => "Unknown",
            InstallStatus::Installed => "Installed",
            InstallStatus::Uninstalled => "Uninstalled",
        };
        f.write_str(label)
    }
}

/// A workspace an org-level app has been granted to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnterpriseGrant {
    #[serde(default)]
    pub workspace_id: String,
    #[serde(default)]
    pub workspace_domain: String,
}

/// One deployment target: a team and the app created on it.
///
/// `app_id` is `None` until the app exists on the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub enterprise_id: String,
    /// Team domain written by older releases.
    #[serde(rename = "name", default, skip_serializing_if = "String::is_empty")]
    pub legacy_name: String,
    #[serde(rename = "IsDev", default, skip_serializing_if = "is_false")]
    pub is_dev: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub team_domain: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub team_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    #[serde(skip)]
    pub install_status: InstallStatus,
    #[serde(skip)]
    pub enterprise_grants: Vec<EnterpriseGrant>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

impl App {
    /// An unsaved deployed app for `team_id`.
    pub fn new_deployed(team_id: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            ..Default::default()
        }
    }

    /// An unsaved local-run app for `team_id`.
    pub fn new_local(team_id: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            is_dev: true,
            ..Default::default()
        }
    }

    /// True until the backend has assigned an app ID.
    pub fn is_new(&self) -> bool {
        self.app_id.is_none()
    }

    /// The app ID, or an empty string for new apps.
    pub fn app_id(&self) -> &str {
        self.app_id.as_deref().unwrap_or_default()
    }

    pub fn is_installed(&self) -> bool {
        self.install_status == InstallStatus::Installed
    }

    pub fn is_uninstalled(&self) -> bool {
        self.install_status == InstallStatus::Uninstalled
    }

    /// A workspace-level app created on a workspace that belongs to an org.
    pub fn is_enterprise_workspace_app(&self) -> bool {
        is_workspace_team_id(&self.team_id)
            && is_enterprise_team_id(&self.enterprise_id)
            && self.team_id != self.enterprise_id
    }

    /// An org-level app.
    pub fn is_enterprise_app(&self) -> bool {
        is_enterprise_team_id(&self.team_id) && self.team_id == self.enterprise_id
    }

    /// Short label used in listings.
    pub fn environment(&self) -> &'static str {
        if self.is_dev { "local" } else { "deployed" }
    }
}

/// Apps are assigned IDs starting with `A` and made of uppercase characters.
pub fn is_app_id(value: &str) -> bool {
    value.starts_with('A') && value.to_uppercase() == value
}

pub fn is_workspace_team_id(value: &str) -> bool {
    value.starts_with('T')
}

pub fn is_enterprise_team_id(value: &str) -> bool {
    value.starts_with('E')
}

/// The contents of a project's app registry.
///
/// Serialised as `apps.json`; `local` is stored separately in `apps.dev.json`
/// and only appears under `dev` in files written by older releases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Apps {
    #[serde(rename = "apps", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub deployed: BTreeMap<String, App>,
    #[serde(rename = "default", default, skip_serializing_if = "String::is_empty")]
    pub default_team_domain: String,
    #[serde(rename = "dev", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub local: BTreeMap<String, App>,
}

impl Apps {
    pub fn is_empty(&self) -> bool {
        self.deployed.is_empty() && self.local.is_empty()
    }

    pub fn deployed_by_team_id(&self, team_id: &str) -> Option<&App> {
        self.deployed.values().find(|app| app.team_id == team_id)
    }

    pub fn deployed_by_team_domain(&self, team_domain: &str) -> Option<&App> {
        self.deployed.values().find(|app| app.team_domain == team_domain)
    }

    pub fn local_by_team_id(&self, team_id: &str) -> Option<App> {
        self.local.get(team_id).cloned().map(|mut app| {
            app.team_id = team_id.to_string();
            app.is_dev = true;
            app
        })
    }

    /// The deployed app for `team_id`, or an unsaved record.
    pub fn deployed_or_new(&self, team_id: &str) -> App {
        self.deployed_by_team_id(team_id)
            .cloned()
            .unwrap_or_else(|| App::new_deployed(team_id))
    }

    /// The local app for `team_id`, or an unsaved record.
    pub fn local_or_new(&self, team_id: &str) -> App {
        self.local_by_team_id(team_id)
            .unwrap_or_else(|| App::new_local(team_id))
    }

    /// The app the `default` key points at.
    pub fn default_app(&self) -> Option<&App> {
        if self.default_team_domain.is_empty() {
            return None;
        }
        self.deployed_by_team_domain(&self.default_team_domain)
    }

    /// Inserts or replaces an app keyed by its team ID.
    ///
    /// The first deployed app becomes the default.
    pub fn set(&mut self, app: App) -> SlackResult<()> {
        if app.team_id.is_empty() {
            return Err(SlackError::new(ErrorCode::MissingAppTeamId));
        }
        if app.is_dev {
            self.local.insert(app.team_id.clone(), app);
            return Ok(());
        }
        if self.deployed.is_empty() || self.default_team_domain.is_empty() {
            self.default_team_domain = app.team_domain.clone();
        }
        self.deployed.insert(app.team_id.clone(), app);
        Ok(())
    }

    /// Removes the deployed app for `team_id`, re-pointing the default to a
    /// remaining app when needed.
    pub fn remove_deployed_by_team_id(&mut self, team_id: &str) -> Option<App> {
        let removed = self.deployed.remove(team_id)?;
        if removed.team_domain == self.default_team_domain {
            self.default_team_domain = self
                .deployed
                .values()
                .next()
                .map(|app| app.team_domain.clone())
                .unwrap_or_default();
        }
        Some(removed)
    }

    pub fn remove_local_by_team_id(&mut self, team_id: &str) -> Option<App> {
        self.local.remove(team_id)
    }

    pub fn all_deployed(&self) -> Vec<App> {
        self.deployed.values().cloned().collect()
    }

    pub fn all_local(&self) -> Vec<App> {
        self.local
            .iter()
            .map(|(team_id, app)| {
                let mut app = app.clone();
                app.team_id = team_id.clone();
                app.is_dev = true;
                app
            })
            .collect()
    }
}

/// Re-keys app records by team ID.
///
/// Older releases keyed records by team domain and stored the domain under
/// `name`; the domain is carried over to `team_domain` when that is empty.
pub fn map_by_team_id(apps: BTreeMap<String, App>) -> SlackResult<BTreeMap<String, App>> {
    let mut by_team_id = BTreeMap::new();
    for (key, mut app) in apps {
        if app.team_id.is_empty() {
            return Err(SlackError::new(ErrorCode::MissingAppTeamId)
                .with_message(format!("The app stored under '{key}' is missing a team_id")));
        }
        if app.team_domain.is_empty() && !app.legacy_name.is_empty() {
            app.team_domain = std::mem::take(&mut app.legacy_name);
        } else {
            app.legacy_name.clear();
        }
        by_team_id.insert(app.team_id.clone(), app);
    }
    Ok(by_team_id)
}
