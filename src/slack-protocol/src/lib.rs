//! Shared data model for the Slack CLI.
//!
//! This crate holds the types every other crate exchanges:
//! - App records and the project registry document (`apps.json`)
//! - Stored credentials and validated sessions
//! - The app manifest document
//! - Install states and tokens
//! - The error catalog and manifest validation warnings
//!
//! # Example
//!
//! ```rust,ignore
//! use slack_protocol::{App, ErrorCode, SlackError};
//!
//! let app = App::new_deployed("T0123");
//! if app.is_new() {
//!     return Err(SlackError::new(ErrorCode::AppNotFound));
//! }
//! ```

pub mod app;
pub mod auth;
pub mod error;
pub mod install;
pub mod manifest;
pub mod warning;

// Re-export main types
pub use app::{App, Apps, EnterpriseGrant, GRANT_ALL_ORG_WORKSPACES, InstallStatus};
pub use auth::{AuthSession, SlackAuth};
pub use error::{ErrorCode, ErrorDetail, SlackError, SlackResult};
pub use install::{InstallResult, InstallState, InstallTokens};
pub use manifest::{AppManifest, FunctionRuntime};
pub use warning::{Warning, Warnings};
