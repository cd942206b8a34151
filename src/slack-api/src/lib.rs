//! Slack API client for the Slack CLI.
//!
//! The [`ApiClient`] trait is the seam the rest of the workspace programs
//! against; [`HttpApiClient`] implements it over HTTPS with `reqwest`.
//! Every method maps to one backend method posted as JSON to
//! `{host}/api/{method}` with a bearer token.
//!
//! # Example
//!
//! ```rust,ignore
//! use slack_api::{ApiClient, HttpApiClient, DEFAULT_API_HOST};
//!
//! let api = HttpApiClient::new(DEFAULT_API_HOST)?;
//! let session = api.validate_session(&token).await?;
//! ```

pub mod client;
pub mod http;
mod s3;
pub mod types;

// Re-export main types
pub use client::ApiClient;
pub use http::{APPROVAL_ALTERNATIVE, DEFAULT_API_HOST, DEV_API_HOST, HttpApiClient};
pub use types::*;

/// True when `host` points at a development backend: its first DNS label
/// starts with `dev`.
pub fn is_dev_host(host: &str) -> bool {
    url::Url::parse(host)
        .ok()
        .and_then(|url| {
            url.host_str()
                .and_then(|h| h.split('.').next())
                .map(|label| label.starts_with("dev"))
        })
        .unwrap_or(false)
}
