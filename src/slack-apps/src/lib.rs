//! App lifecycle operations for the Slack CLI.
//!
//! Every operation takes a [`Clients`] bundle: the API client, terminal,
//! process environment, project runtime and the paths of the project and
//! user stores.
//!
//! - [`install`] / [`install_local_app`] - reconcile the manifest with app
//!   settings, then install
//! - [`deploy`] - package the project and upload it to a hosted app
//! - [`add`], [`delete`], [`uninstall`], [`list`] - app management
//! - [`fetch_app_install_states`] - install status across logins

pub mod add;
pub mod auth;
pub mod clients;
pub mod delete;
pub mod deploy;
pub mod env;
pub mod install;
pub mod io;
pub mod list;
pub mod package;
pub mod runtime;
pub mod source;
pub mod status;

#[cfg(test)]
mod testing;

pub use add::add;
pub use auth::{all_auths, auth_with_token, resolve_auth};
pub use clients::{Clients, Config};
pub use delete::{delete, uninstall};
pub use deploy::{DeployResult, NoopTriggers, TriggerGenerator, deploy};
pub use env::{Environment, ProcessEnvironment};
pub use install::{InstallOptions, InstallOutcome, install, install_local_app, manifest_hash};
pub use io::IoStreams;
pub use list::{AppListing, list};
pub use package::{DEPENDENCY_TIMEOUT, Package, package_project};
pub use runtime::Runtime;
pub use source::{manifest_source, read_local_manifest, read_remote_manifest};
pub use status::fetch_app_install_states;
