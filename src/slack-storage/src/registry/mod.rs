//! The project's app registry: `apps.json` and `apps.dev.json`.

use std::collections::BTreeMap;

use slack_protocol::app::map_by_team_id;
use slack_protocol::{App, Apps, ErrorCode, SlackError, SlackResult};
use tracing::{debug, info, warn};

use crate::paths::{ProjectPaths, read_optional, write_private};

/// Deployed and local-run apps saved for one project.
///
/// The registry is a snapshot loaded from disk; every mutation is written
/// back before returning.
#[derive(Debug, Clone)]
pub struct AppRegistry {
    paths: ProjectPaths,
    apps: Apps,
}

impl AppRegistry {
    /// Loads both registry files, migrating content written by older
    /// releases.
    pub async fn load(paths: &ProjectPaths) -> SlackResult<Self> {
        let mut apps: Apps = match read_optional(&paths.apps_file).await? {
            Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => {
                serde_json::from_slice(&bytes)?
            }
            _ => Apps::default(),
        };
        let mut local: BTreeMap<String, App> = match read_optional(&paths.apps_dev_file).await? {
            Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => {
                serde_json::from_slice(&bytes)?
            }
            _ => BTreeMap::new(),
        };
        // Local records are keyed by team ID and may omit it in the body.
        for (team_id, app) in local.iter_mut() {
            if app.team_id.is_empty() {
                app.team_id = team_id.clone();
            }
        }

        let legacy_dev = std::mem::take(&mut apps.local);
        let needs_rekey = |map: &BTreeMap<String, App>| {
            map.iter()
                .any(|(key, app)| *key != app.team_id || !app.legacy_name.is_empty())
        };
        let rewrite_deployed = !legacy_dev.is_empty() || needs_rekey(&apps.deployed);
        let rewrite_local = !legacy_dev.is_empty() || needs_rekey(&local);

        apps.deployed = map_by_team_id(apps.deployed)?;
        apps.local = map_by_team_id(local)?;
        for (team_id, mut app) in map_by_team_id(legacy_dev)? {
            app.is_dev = true;
            apps.local.entry(team_id).or_insert(app);
        }

        let registry = Self {
            paths: paths.clone(),
            apps,
        };
        if rewrite_deployed {
            info!(path = %paths.apps_file.display(), "Migrating deployed apps to the current format");
            registry.write_deployed().await?;
        }
        if rewrite_local {
            info!(path = %paths.apps_dev_file.display(), "Migrating local apps to the current format");
            registry.write_local().await?;
        }
        Ok(registry)
    }

    pub fn apps(&self) -> &Apps {
        &self.apps
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    pub fn deployed(&self, team_id: &str) -> Option<App> {
        self.apps.deployed_by_team_id(team_id).cloned()
    }

    pub fn local(&self, team_id: &str) -> Option<App> {
        self.apps.local_by_team_id(team_id)
    }

    pub fn deployed_or_new(&self, team_id: &str) -> App {
        self.apps.deployed_or_new(team_id)
    }

    pub fn local_or_new(&self, team_id: &str) -> App {
        self.apps.local_or_new(team_id)
    }

    pub fn all_deployed(&self) -> Vec<App> {
        self.apps.all_deployed()
    }

    pub fn all_local(&self) -> Vec<App> {
        self.apps.all_local()
    }

    pub fn default_app(&self) -> Option<App> {
        self.apps.default_app().cloned()
    }

    /// Saves a deployed app keyed by its team ID.
    pub async fn save_deployed(&mut self, mut app: App) -> SlackResult<()> {
        app.is_dev = false;
        self.apps.set(app)?;
        self.write_deployed().await
    }

    /// Saves a local-run app keyed by its team ID.
    pub async fn save_local(&mut self, mut app: App) -> SlackResult<()> {
        app.is_dev = true;
        self.apps.set(app)?;
        self.write_local().await
    }

    /// Saves `app` to the file matching its `is_dev` flag.
    pub async fn save(&mut self, app: App) -> SlackResult<()> {
        if app.is_dev {
            self.save_local(app).await
        } else {
            self.save_deployed(app).await
        }
    }

    /// Creates and saves an empty deployed record for `team_id`.
    pub async fn new_deployed(&mut self, team_id: &str) -> SlackResult<App> {
        if self.apps.deployed_by_team_id(team_id).is_some() {
            return Err(SlackError::new(ErrorCode::AppFound)
                .with_message(format!("An app was found for team '{team_id}'")));
        }
        let app = App::new_deployed(team_id);
        self.save_deployed(app.clone()).await?;
        Ok(app)
    }

    pub async fn remove_deployed_by_team_id(&mut self, team_id: &str) -> SlackResult<Option<App>> {
        let removed = self.apps.remove_deployed_by_team_id(team_id);
        if removed.is_some() {
            self.write_deployed().await?;
        }
        Ok(removed)
    }

    pub async fn remove_local_by_team_id(&mut self, team_id: &str) -> SlackResult<Option<App>> {
        let removed = self.apps.remove_local_by_team_id(team_id);
        if removed.is_some() {
            self.write_local().await?;
        }
        Ok(removed)
    }

    /// Removes `app` from the map matching its `is_dev` flag.
    pub async fn remove(&mut self, app: &App) -> SlackResult<Option<App>> {
        if app.is_dev {
            self.remove_local_by_team_id(&app.team_id).await
        } else {
            self.remove_deployed_by_team_id(&app.team_id).await
        }
    }

    /// Deletes empty registry files, then `.slack/` itself once nothing is
    /// left in it. The home directory's `.slack/` is never removed.
    ///
    /// Failures are logged and otherwise ignored.
    pub async fn clean_up(&self) {
        if self.apps.deployed.is_empty() {
            remove_if_exists(&self.paths.apps_file).await;
        }
        if self.apps.local.is_empty() {
            remove_if_exists(&self.paths.apps_dev_file).await;
        }
        if self.paths.is_home_dir() || self.paths.config_file.exists() {
            return;
        }
        if is_empty_dir(&self.paths.cache_dir).await {
            if let Err(e) = tokio::fs::remove_dir(&self.paths.cache_dir).await {
                debug!(error = %e, "Failed to remove empty cache directory");
            }
        }
        if is_empty_dir(&self.paths.slack_dir).await {
            match tokio::fs::remove_dir(&self.paths.slack_dir).await {
                Ok(()) => debug!(path = %self.paths.slack_dir.display(), "Removed empty project directory"),
                Err(e) => warn!(error = %e, "Failed to remove empty project directory"),
            }
        }
    }

    async fn write_deployed(&self) -> SlackResult<()> {
        let deployed = Apps {
            deployed: self.apps.deployed.clone(),
            default_team_domain: self.apps.default_team_domain.clone(),
            local: BTreeMap::new(),
        };
        let json = serde_json::to_vec_pretty(&deployed)?;
        write_private(&self.paths.apps_file, &json).await?;
        debug!(path = %self.paths.apps_file.display(), count = deployed.deployed.len(), "Saved deployed apps");
        Ok(())
    }

    async fn write_local(&self) -> SlackResult<()> {
        let json = serde_json::to_vec_pretty(&self.apps.local)?;
        write_private(&self.paths.apps_dev_file, &json).await?;
        debug!(path = %self.paths.apps_dev_file.display(), count = self.apps.local.len(), "Saved local apps");
        Ok(())
    }
}

async fn remove_if_exists(path: &std::path::Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed empty registry file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove registry file"),
    }
}

async fn is_empty_dir(path: &std::path::Path) -> bool {
    match tokio::fs::read_dir(path).await {
        Ok(mut entries) => matches!(entries.next_entry().await, Ok(None)),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests;
