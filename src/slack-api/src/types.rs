//! Request and response payloads for the app management API.

use serde::{Deserialize, Serialize};
use slack_protocol::{EnterpriseGrant, InstallResult, SlackError, Warnings};

/// Credentials issued when an app is created.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCredentials {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub verification_token: String,
    #[serde(default)]
    pub signing_secret: String,
}

impl std::fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("verification_token", &"[REDACTED]")
            .field("signing_secret", &"[REDACTED]")
            .finish()
    }
}

/// Result of `apps.manifest.create` and `apps.manifest.update`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppManifestResult {
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub credentials: AppCredentials,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub oauth_authorize_url: String,
}

/// Outcome of `apps.manifest.validate`.
///
/// Transport failures are returned as errors by the client; a manifest the
/// backend rejects comes back here with both its warnings and the error.
#[derive(Debug, Clone, Default)]
pub struct ManifestValidation {
    pub warnings: Warnings,
    pub error: Option<SlackError>,
}

/// Arguments for `apps.developerInstall`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeveloperInstallRequest {
    pub app_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bot_scopes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub outgoing_domains: Vec<String>,
    /// Workspace (or org) to grant an org-level app to.
    #[serde(rename = "team_id", skip_serializing_if = "Option::is_none")]
    pub grant_team_id: Option<String>,
}

/// Why an install needs an admin's approval first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalReason {
    /// No request has been sent yet.
    Eligible,
    /// A request is waiting for review.
    Pending,
}

/// Outcome of `apps.developerInstall`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeveloperInstallOutcome {
    Installed(InstallResult),
    ApprovalRequired {
        reason: ApprovalReason,
        /// Workspace the approval request should target, if any.
        team_id: String,
    },
}

/// Arguments for `apps.approvals.requests.create`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApprovalRequest {
    #[serde(rename = "app")]
    pub app_id: String,
    #[serde(rename = "bot_scopes", skip_serializing_if = "String::is_empty")]
    pub scopes: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub team_id: String,
}

/// One app in an `apps.status` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppStatusInfo {
    pub app_id: String,
    #[serde(rename = "is_installed", default)]
    pub installed: bool,
    #[serde(rename = "is_hosted", default)]
    pub hosted: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enterprise_grants: Vec<EnterpriseGrant>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppStatusTeam {
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub team_domain: String,
    #[serde(default)]
    pub is_enterprise: bool,
}

/// Result of `apps.status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppStatusResult {
    #[serde(default)]
    pub apps: Vec<AppStatusInfo>,
    #[serde(default)]
    pub team: AppStatusTeam,
}

/// Form fields of a presigned S3 POST.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignedPostFields {
    #[serde(rename = "X-Amz-Credential", default)]
    pub credential: String,
    #[serde(rename = "X-Amz-Algorithm", default)]
    pub algorithm: String,
    #[serde(rename = "key", default)]
    pub key: String,
    #[serde(rename = "X-Amz-Date", default)]
    pub date: String,
    #[serde(rename = "Policy", default)]
    pub policy: String,
    #[serde(rename = "X-Amz-Signature", default)]
    pub signature: String,
    #[serde(rename = "X-Amz-Security-Token", default)]
    pub security_token: String,
}

impl PresignedPostFields {
    /// Form fields in upload order. The file part goes after these.
    pub fn form_fields(&self) -> [(&'static str, &str); 7] {
        [
            ("X-Amz-Credential", self.credential.as_str()),
            ("X-Amz-Algorithm", self.algorithm.as_str()),
            ("key", self.key.as_str()),
            ("X-Amz-Date", self.date.as_str()),
            ("Policy", self.policy.as_str()),
            ("X-Amz-Signature", self.signature.as_str()),
            ("X-Amz-Security-Token", self.security_token.as_str()),
        ]
    }
}

/// Result of `apps.hosted.generatePresignedPost`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresignedPost {
    pub url: String,
    pub file_name: String,
    #[serde(default)]
    pub fields: PresignedPostFields,
}

/// An environment variable stored on a hosted app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVariable {
    pub name: String,
    pub value: String,
}
