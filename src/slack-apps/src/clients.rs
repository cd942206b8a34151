//! Collaborators and settings shared by every operation in a command.

use std::sync::Arc;

use slack_api::ApiClient;
use slack_storage::{ProjectPaths, SystemPaths};

use crate::env::Environment;
use crate::io::IoStreams;
use crate::runtime::Runtime;

/// Settings for one CLI invocation.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// `--force`
    pub force: bool,
    /// `--skip-local-fs`: never write the project's registry or cache.
    pub skip_local_fs: bool,
    /// `--verbose`
    pub verbose: bool,
    /// Experiments enabled with `--experiment`.
    pub experiments: Vec<String>,
    /// `--token`: an ad hoc credential used alongside stored logins.
    pub token: Option<String>,
    /// Command name shown in hints, e.g. `deploy`.
    pub command: String,
}

impl Config {
    pub fn with_experiment_on(&self, name: &str) -> bool {
        self.experiments.iter().any(|e| e == name)
    }
}

/// Everything an operation talks to.
///
/// Cheap to clone: collaborators are shared behind `Arc`.
#[derive(Clone)]
pub struct Clients {
    pub api: Arc<dyn ApiClient>,
    pub io: Arc<dyn IoStreams>,
    pub env: Arc<dyn Environment>,
    /// Packaging hooks for the project, when its runtime is supported.
    pub runtime: Option<Arc<dyn Runtime>>,
    pub config: Config,
    pub project: ProjectPaths,
    pub system: SystemPaths,
}

impl std::fmt::Debug for Clients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clients")
            .field("api_host", &self.api.host())
            .field("runtime", &self.runtime.as_ref().map(|r| r.name()))
            .field("config", &self.config)
            .field("project", &self.project)
            .field("system", &self.system)
            .finish()
    }
}
