//! Error types for the Slack CLI.
//!
//! Every fallible operation in the workspace returns a [`SlackError`]. Known
//! failures are described by the immutable [`ErrorCode`] catalog, which pairs
//! a stable snake_case code with a user-facing message and an optional
//! remediation. Errors returned by the Slack API keep their raw code even when
//! the catalog does not know it.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const INSTALL_MANIFEST_SOURCE_REMEDIATION: &str = "Set 'manifest.source' to either \"remote\" or \"local\" in .slack/config.json\nRead about manifest sourcing with the `slack manifest info --help` command";

const LOGIN_AGAIN_REMEDIATION: &str = "Use the command `slack login` to authenticate again";

/// Catalog record for a known error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorEntry {
    /// Stable snake_case code.
    pub code: &'static str,
    /// Message shown to the user.
    pub message: &'static str,
    /// Suggested next step, if any.
    pub remediation: Option<&'static str>,
}

/// Known error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    AddAppToProject,
    AppAdd,
    AppApprovalRequestDenied,
    AppApprovalRequestEligible,
    AppApprovalRequestPending,
    AppsList,
    AppCreate,
    AppDelete,
    AppDeploy,
    AppDirectoryAccess,
    AppFound,
    AppInstall,
    AppManifestAccess,
    AppManifestUpdate,
    AppManifestValidate,
    AppNotFound,
    AppRemove,
    AuthToken,
    CancelledByUser,
    CredentialsNotFound,
    HttpRequestFailed,
    HttpResponseInvalid,
    InstallationDenied,
    InstallationFailed,
    InvalidAuth,
    InvalidManifest,
    InvalidManifestSource,
    InvalidToken,
    MissingAppTeamId,
    PackageDependenciesTimeout,
    ProjectConfigManifestSource,
    Ratelimited,
    RuntimeNotSupported,
    S3Upload,
    SlackAuth,
    TeamNotFound,
    TokenExpired,
    TokenRevoked,
    UnableToParseJson,
    Unknown,
}

impl ErrorCode {
    /// Every catalog entry.
    pub const ALL: &'static [ErrorCode] = &[
        ErrorCode::AddAppToProject,
        ErrorCode::AppAdd,
        ErrorCode::AppApprovalRequestDenied,
        ErrorCode::AppApprovalRequestEligible,
        ErrorCode::AppApprovalRequestPending,
        ErrorCode::AppsList,
        ErrorCode::AppCreate,
        ErrorCode::AppDelete,
        ErrorCode::AppDeploy,
        ErrorCode::AppDirectoryAccess,
        ErrorCode::AppFound,
        ErrorCode::AppInstall,
        ErrorCode::AppManifestAccess,
        ErrorCode::AppManifestUpdate,
        ErrorCode::AppManifestValidate,
        ErrorCode::AppNotFound,
        ErrorCode::AppRemove,
        ErrorCode::AuthToken,
        ErrorCode::CancelledByUser,
        ErrorCode::CredentialsNotFound,
        ErrorCode::HttpRequestFailed,
        ErrorCode::HttpResponseInvalid,
        ErrorCode::InstallationDenied,
        ErrorCode::InstallationFailed,
        ErrorCode::InvalidAuth,
        ErrorCode::InvalidManifest,
        ErrorCode::InvalidManifestSource,
        ErrorCode::InvalidToken,
        ErrorCode::MissingAppTeamId,
        ErrorCode::PackageDependenciesTimeout,
        ErrorCode::ProjectConfigManifestSource,
        ErrorCode::Ratelimited,
        ErrorCode::RuntimeNotSupported,
        ErrorCode::S3Upload,
        ErrorCode::SlackAuth,
        ErrorCode::TeamNotFound,
        ErrorCode::TokenExpired,
        ErrorCode::TokenRevoked,
        ErrorCode::UnableToParseJson,
        ErrorCode::Unknown,
    ];

    /// Returns the catalog record for this code.
    pub const fn entry(self) -> ErrorEntry {
        let (code, message, remediation) = match self {
            ErrorCode::AddAppToProject => (
                "add_app_to_project_error",
                "Couldn't save your app's info to this project",
                None,
            ),
            ErrorCode::AppAdd => ("app_add_error", "Couldn't create a new app", None),
            ErrorCode::AppApprovalRequestDenied => (
                "app_approval_request_denied",
                "This app is currently denied for installation",
                Some(
                    "Reach out to an admin for additional information, or try requesting again with different scopes and outgoing domains",
                ),
            ),
            ErrorCode::AppApprovalRequestEligible => (
                "app_approval_request_eligible",
                "This app requires permissions that must be reviewed by an admin before you can install it",
                None,
            ),
            ErrorCode::AppApprovalRequestPending => (
                "app_approval_request_pending",
                "This app has requested admin approval to install and is awaiting review",
                Some("Reach out to an admin for additional information"),
            ),
            ErrorCode::AppsList => ("apps_list_error", "Couldn't get a list of your apps", None),
            ErrorCode::AppCreate => ("app_create_error", "Couldn't create your app", None),
            ErrorCode::AppDelete => ("app_delete_error", "Couldn't delete your app", None),
            ErrorCode::AppDeploy => ("app_deploy_error", "Couldn't deploy your app", None),
            ErrorCode::AppDirectoryAccess => (
                "app_directory_access_error",
                "Couldn't access app directory",
                None,
            ),
            ErrorCode::AppFound => ("app_found", "An app was found", None),
            ErrorCode::AppInstall => (
                "app_install_error",
                "Couldn't install your app to a workspace",
                None,
            ),
            ErrorCode::AppManifestAccess => (
                "app_manifest_access_error",
                "Couldn't access your app manifest",
                None,
            ),
            ErrorCode::AppManifestUpdate => (
                "app_manifest_update_error",
                "The app manifest was not updated",
                None,
            ),
            ErrorCode::AppManifestValidate => (
                "app_manifest_validate_error",
                "Your app manifest is invalid",
                None,
            ),
            ErrorCode::AppNotFound => ("app_not_found", "The app was not found", None),
            ErrorCode::AppRemove => ("app_remove_error", "Couldn't remove your app", None),
            ErrorCode::AuthToken => (
                "auth_token_error",
                "Couldn't get a token with an active session",
                None,
            ),
            ErrorCode::CancelledByUser => ("cancelled_by_user", "Cancelled due to user input", None),
            ErrorCode::CredentialsNotFound => (
                "credentials_not_found",
                "No authentication found for this team",
                Some("Use the command `slack login` to login to this workspace"),
            ),
            ErrorCode::HttpRequestFailed => ("http_request_failed", "HTTP request failed", None),
            ErrorCode::HttpResponseInvalid => (
                "http_response_invalid",
                "Received an invalid response from the server",
                None,
            ),
            ErrorCode::InstallationDenied => (
                "installation_denied",
                "Couldn't install the app because the installation request was denied",
                Some("Reach out to one of your App Managers for additional information."),
            ),
            ErrorCode::InstallationFailed => ("installation_failed", "Couldn't install the app", None),
            ErrorCode::InvalidAuth => (
                "invalid_auth",
                "Your user account authorization isn't valid",
                Some(
                    "Your user account authorization may be expired or does not have permission to access the resource. Try to login to the same user account again using `slack login`.",
                ),
            ),
            ErrorCode::InvalidManifest => (
                "invalid_manifest",
                "The provided manifest file does not validate against schema. Consult the additional errors field to locate specific issues",
                None,
            ),
            ErrorCode::InvalidManifestSource => (
                "invalid_manifest_source",
                "A manifest does not exist at the provided source",
                Some(INSTALL_MANIFEST_SOURCE_REMEDIATION),
            ),
            ErrorCode::InvalidToken => ("invalid_token", "The provided token is not valid", None),
            ErrorCode::MissingAppTeamId => (
                "missing_app_team_id",
                "team_id is required to create or update this app",
                None,
            ),
            ErrorCode::PackageDependenciesTimeout => (
                "package_dependencies_timeout",
                "Installing project dependencies took too long",
                Some("Check the project dependencies and your network connection, then try again"),
            ),
            ErrorCode::ProjectConfigManifestSource => (
                "project_config_manifest_source_error",
                "Project manifest source is not valid",
                Some(INSTALL_MANIFEST_SOURCE_REMEDIATION),
            ),
            ErrorCode::Ratelimited => (
                "ratelimited",
                "Too many calls in succession during a short period of time",
                None,
            ),
            ErrorCode::RuntimeNotSupported => (
                "runtime_not_supported",
                "The SDK runtime is not supported by the CLI",
                None,
            ),
            ErrorCode::S3Upload => (
                "s3_upload_error",
                "Couldn't upload your bundled code to server",
                None,
            ),
            ErrorCode::SlackAuth => (
                "slack_auth_error",
                "You are not logged into a team or have not installed an app",
                Some("Use the command `slack login` to login and `slack install` to install your app"),
            ),
            ErrorCode::TeamNotFound => ("team_not_found", "Team could not be found", None),
            ErrorCode::TokenExpired => (
                "token_expired",
                "Your access token has expired",
                Some(LOGIN_AGAIN_REMEDIATION),
            ),
            ErrorCode::TokenRevoked => (
                "token_revoked",
                "Your token has already been revoked",
                Some(LOGIN_AGAIN_REMEDIATION),
            ),
            ErrorCode::UnableToParseJson => (
                "unable_to_parse_json",
                "`<json>` Couldn't be parsed as a json object",
                None,
            ),
            ErrorCode::Unknown => ("unknown_error", "An unknown error occurred", None),
        };
        ErrorEntry {
            code,
            message,
            remediation,
        }
    }

    /// Returns the stable code string.
    pub const fn as_str(self) -> &'static str {
        self.entry().code
    }

    /// Resolves a code string back to a catalog entry.
    pub fn lookup(code: &str) -> Option<ErrorCode> {
        CATALOG.get(code).copied()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

static CATALOG: LazyLock<HashMap<&'static str, ErrorCode>> =
    LazyLock::new(|| ErrorCode::ALL.iter().map(|c| (c.as_str(), *c)).collect());

/// A single problem reported alongside an API error, usually pointing into
/// the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pointer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remediation: String,
}

/// Structured, user-facing error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}{}", code_suffix(.code))]
pub struct SlackError {
    code: String,
    message: String,
    remediation: Option<String>,
    details: Vec<ErrorDetail>,
    api_method: Option<String>,
    #[source]
    cause: Option<Box<SlackError>>,
}

fn code_suffix(code: &str) -> String {
    if code.is_empty() {
        String::new()
    } else {
        format!(" ({code})")
    }
}

/// Result type for Slack CLI operations.
pub type SlackResult<T> = std::result::Result<T, SlackError>;

impl SlackError {
    /// Creates an error from a catalog entry.
    pub fn new(code: ErrorCode) -> Self {
        let entry = code.entry();
        Self {
            code: entry.code.to_string(),
            message: entry.message.to_string(),
            remediation: entry.remediation.map(str::to_string),
            details: Vec::new(),
            api_method: None,
            cause: None,
        }
    }

    /// Creates an uncoded error with a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            code: String::new(),
            message: message.into(),
            remediation: None,
            details: Vec::new(),
            api_method: None,
            cause: None,
        }
    }

    /// Creates an error from a raw code string, using the catalog when the
    /// code is known.
    pub fn from_code(code: &str) -> Self {
        match ErrorCode::lookup(code) {
            Some(known) => Self::new(known),
            None => Self {
                code: code.to_string(),
                message: "The Slack API returned an error".to_string(),
                ..Self::msg("")
            },
        }
    }

    /// Creates an error from a failed Slack API response.
    ///
    /// An empty code becomes `unknown_error`; a non-empty description
    /// replaces the catalog message.
    pub fn from_api(
        code: &str,
        description: &str,
        details: Vec<ErrorDetail>,
        api_method: &str,
    ) -> Self {
        let code = if code.is_empty() {
            ErrorCode::Unknown.as_str()
        } else {
            code
        };
        let mut err = Self::from_code(code);
        if !description.is_empty() {
            err.message = description.to_string();
        }
        err.details = details;
        err.api_method = Some(api_method.to_string());
        err
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    /// Appends a line to the remediation, creating it when absent.
    pub fn append_remediation(mut self, line: impl AsRef<str>) -> Self {
        let line = line.as_ref();
        self.remediation = Some(match self.remediation.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}\n{line}"),
            _ => line.to_string(),
        });
        self
    }

    pub fn with_detail(mut self, detail: ErrorDetail) -> Self {
        self.details.push(detail);
        self
    }

    pub fn with_api_method(mut self, method: impl Into<String>) -> Self {
        self.api_method = Some(method.into());
        self
    }

    /// Attaches the error that caused this one.
    pub fn with_cause(mut self, cause: impl Into<SlackError>) -> Self {
        self.cause = Some(Box::new(cause.into()));
        self
    }

    /// Wraps `self` in a new catalog error of kind `code`.
    pub fn wrap(self, code: ErrorCode) -> SlackError {
        SlackError::new(code).with_cause(self)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn remediation(&self) -> Option<&str> {
        self.remediation.as_deref()
    }

    pub fn details(&self) -> &[ErrorDetail] {
        &self.details
    }

    pub fn api_method(&self) -> Option<&str> {
        self.api_method.as_deref()
    }

    pub fn cause(&self) -> Option<&SlackError> {
        self.cause.as_deref()
    }

    /// Iterates from this error down to the root cause.
    pub fn chain(&self) -> impl Iterator<Item = &SlackError> {
        std::iter::successors(Some(self), |err| err.cause())
    }

    /// Returns the innermost error.
    pub fn root(&self) -> &SlackError {
        self.chain().last().unwrap_or(self)
    }

    /// True when any error in the chain has the given catalog code.
    pub fn is(&self, code: ErrorCode) -> bool {
        self.is_code(code.as_str())
    }

    /// True when any error in the chain has the given raw code.
    pub fn is_code(&self, code: &str) -> bool {
        self.chain().any(|err| err.code == code)
    }

    /// True when the chain or any attached detail carries `code`.
    pub fn mentions_code(&self, code: &str) -> bool {
        self.chain()
            .any(|err| err.code == code || err.details.iter().any(|d| d.code == code))
    }

    /// Renders the error for the terminal.
    ///
    /// The root cause is shown with its details; `verbose` also lists the
    /// wrapping operations. The remediation is the root's, falling back to
    /// the nearest wrapper that has one.
    pub fn render(&self, verbose: bool) -> String {
        let root = self.root();
        let mut out = String::new();

        if let Some(method) = self.chain().find_map(|err| err.api_method()) {
            let _ = writeln!(
                out,
                "The following error was returned by the {method} Slack API method"
            );
        }
        let _ = writeln!(out, "{root}");

        for detail in &root.details {
            if !detail.message.is_empty() {
                let _ = writeln!(out, "  {}{}", detail.message, code_suffix(&detail.code));
            } else if !detail.code.is_empty() {
                let _ = writeln!(out, "  {}", detail.code);
            }
            if !detail.pointer.is_empty() {
                let _ = writeln!(out, "    Source: {}", detail.pointer);
            }
            if !detail.remediation.is_empty() {
                let _ = writeln!(out, "    Suggestion: {}", detail.remediation);
            }
        }

        if verbose {
            for err in self.chain().take_while(|err| !std::ptr::eq(*err, root)) {
                let _ = writeln!(out, "  while: {err}");
            }
        }

        let remediation = root
            .remediation()
            .or_else(|| self.chain().find_map(|err| err.remediation()))
            .filter(|r| !r.is_empty());
        if let Some(remediation) = remediation {
            let _ = writeln!(out, "\nSuggestion:");
            for line in remediation.lines() {
                let _ = writeln!(out, "  {line}");
            }
        }

        out.trim_end().to_string()
    }
}

impl From<ErrorCode> for SlackError {
    fn from(code: ErrorCode) -> Self {
        SlackError::new(code)
    }
}

impl From<std::io::Error> for SlackError {
    fn from(err: std::io::Error) -> Self {
        SlackError::new(ErrorCode::AppDirectoryAccess).with_cause(SlackError::msg(err.to_string()))
    }
}

impl From<serde_json::Error> for SlackError {
    fn from(err: serde_json::Error) -> Self {
        SlackError::new(ErrorCode::UnableToParseJson).with_detail(ErrorDetail {
            message: err.to_string(),
            ..Default::default()
        })
    }
}
