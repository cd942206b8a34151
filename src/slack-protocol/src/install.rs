//! Outcome of a developer install.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of asking the backend to install an app.
///
/// `NotAttempted` covers flows that stop before installing, such as a
/// remote-manifest project without an app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstallState {
    #[default]
    #[serde(rename = "")]
    NotAttempted,
    #[serde(rename = "SUCCESS")]
    Success,
    #[serde(rename = "REQUEST_PENDING")]
    RequestPending,
    #[serde(rename = "REQUEST_CANCELLED")]
    RequestCancelled,
    #[serde(rename = "REQUEST_NOT_SENT")]
    RequestNotSent,
}

impl InstallState {
    pub fn as_str(self) -> &'static str {
        match self {
            InstallState::NotAttempted => "",
            InstallState::Success => "SUCCESS",
            InstallState::RequestPending => "REQUEST_PENDING",
            InstallState::RequestCancelled => "REQUEST_CANCELLED",
            InstallState::RequestNotSent => "REQUEST_NOT_SENT",
        }
    }

    pub fn is_success(self) -> bool {
        self == InstallState::Success
    }
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tokens returned by a successful install.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallTokens {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bot: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub app_level: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
}

impl fmt::Debug for InstallTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &str| if value.is_empty() { "" } else { "[REDACTED]" };
        f.debug_struct("InstallTokens")
            .field("bot", &redact(&self.bot))
            .field("app_level", &redact(&self.app_level))
            .field("user", &redact(&self.user))
            .finish()
    }
}

/// Body of a successful `apps.developerInstall` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallResult {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub app_id: String,
    #[serde(default, rename = "api_access_tokens")]
    pub tokens: InstallTokens,
}
