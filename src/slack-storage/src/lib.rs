//! On-disk state for the Slack CLI.
//!
//! - [`AppRegistry`] - deployed and local apps (`apps.json`, `apps.dev.json`)
//! - [`ManifestCache`] - manifest hashes used to detect local changes
//! - [`ProjectConfig`] - `.slack/config.json`, including the manifest source
//! - [`CredentialStore`] - logins in `~/.slack/credentials.json`
//!
//! # Usage
//!
//! ```rust,no_run
//! use slack_storage::{AppRegistry, ProjectPaths};
//!
//! #[tokio::main]
//! async fn main() -> slack_protocol::SlackResult<()> {
//!     let paths = ProjectPaths::current_dir()?;
//!     let registry = AppRegistry::load(&paths).await?;
//!     for app in registry.all_deployed() {
//!         println!("{} {}", app.team_domain, app.app_id());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod credentials;
pub mod paths;
pub mod project_config;
pub mod registry;

// Re-export main types at crate root
pub use cache::{ManifestCache, ManifestHash, new_manifest_hash};
pub use credentials::CredentialStore;
pub use paths::{ProjectPaths, SystemPaths, slack_config_dir};
pub use project_config::{BOLT_EXPERIMENT, ManifestSource, ProjectConfig, set_manifest_source};
pub use registry::AppRegistry;
