//! `reqwest`-backed [`ApiClient`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use slack_protocol::{
    AppManifest, AuthSession, ErrorCode, ErrorDetail, InstallResult, SlackError, SlackResult,
    Warnings,
};
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::types::{
    AppManifestResult, AppStatusResult, ApprovalReason, ApprovalRequest, DeveloperInstallOutcome,
    DeveloperInstallRequest, EnvVariable, ManifestValidation, PresignedPost,
};

/// Production API host.
pub const DEFAULT_API_HOST: &str = "https://slack.com";
/// Development API host.
pub const DEV_API_HOST: &str = "https://dev.slack.com";

const CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRY_AFTER_SECS: u64 = 30;

/// Suggestion shown when an install needs an admin's approval.
pub const APPROVAL_ALTERNATIVE: &str =
    "Alternatively, retry on a workspace without administrator approval turned on";

/// Fields every API response carries.
#[derive(Debug, Default, Deserialize)]
struct BaseResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: String,
    #[serde(rename = "slack_cli_error_description", default)]
    description: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
    #[serde(default)]
    warnings: Warnings,
}

impl BaseResponse {
    fn into_error(self, method: &str) -> SlackError {
        SlackError::from_api(&self.error, &self.description, self.errors, method)
    }
}

/// HTTP client for the Slack API.
#[derive(Clone)]
pub struct HttpApiClient {
    client: reqwest::Client,
    host: String,
    user_agent: String,
}

impl std::fmt::Debug for HttpApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApiClient")
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl HttpApiClient {
    /// Creates a client for `host` (scheme and authority, no trailing path).
    pub fn new(host: impl Into<String>) -> SlackResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                SlackError::new(ErrorCode::HttpRequestFailed)
                    .with_cause(SlackError::msg(format!("Failed to create HTTP client: {e}")))
            })?;
        Ok(Self {
            client,
            host: host.into().trim_end_matches('/').to_string(),
            user_agent: format!(
                "slack-cli/{} (os: {})",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS
            ),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/api/{}", self.host, method)
    }

    /// POSTs a JSON payload and returns the decoded body.
    ///
    /// Non-200 statuses and undecodable bodies are errors; `ok: false` is
    /// left for the caller to inspect.
    async fn post(
        &self,
        method: &str,
        token: &str,
        payload: &(impl Serialize + Sync),
    ) -> SlackResult<Value> {
        let url = self.endpoint(method);
        debug!(method, url = %url, "Slack API request");

        let mut request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json; charset=utf-8")
            .header(USER_AGENT, &self.user_agent)
            .json(payload);
        if !token.is_empty() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| request_failed(method, e))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            warn!(method, retry_after, "Slack API rate limited the request");
            return Err(SlackError::new(ErrorCode::Ratelimited)
                .with_remediation(format!("Wait {retry_after} seconds before trying again"))
                .with_api_method(method));
        }

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::new(ErrorCode::HttpRequestFailed)
                .with_cause(SlackError::msg(format!(
                    "Slack API unexpected status code {status} returned from url {url}: {body}"
                )))
                .with_api_method(method));
        }

        let body: Value = response.json().await.map_err(|e| {
            SlackError::new(ErrorCode::HttpResponseInvalid)
                .with_cause(SlackError::msg(e.to_string()))
                .with_api_method(method)
        })?;
        debug!(method, ok = ?body.get("ok"), "Slack API response");
        Ok(body)
    }

    /// POSTs and decodes a successful response into `T`.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        token: &str,
        payload: &(impl Serialize + Sync),
    ) -> SlackResult<T> {
        let body = self.post(method, token, payload).await?;
        let base = decode::<BaseResponse>(method, &body)?;
        if !base.ok {
            return Err(base.into_error(method));
        }
        T::deserialize(body).map_err(|e| invalid_response(method, e))
    }

    /// POSTs and only checks the `ok` flag.
    async fn call_ok(
        &self,
        method: &str,
        token: &str,
        payload: &(impl Serialize + Sync),
    ) -> SlackResult<()> {
        self.call::<Value>(method, token, payload).await.map(|_| ())
    }
}

fn decode<T: DeserializeOwned>(method: &str, body: &Value) -> SlackResult<T> {
    T::deserialize(body).map_err(|e| invalid_response(method, e))
}

fn invalid_response(method: &str, err: serde_json::Error) -> SlackError {
    SlackError::new(ErrorCode::HttpResponseInvalid)
        .with_cause(SlackError::msg(err.to_string()))
        .with_api_method(method)
}

fn request_failed(method: &str, err: reqwest::Error) -> SlackError {
    let message = if err.is_timeout() {
        format!("Request timed out: {err}")
    } else if err.is_connect() {
        format!("Connection failed: {err}")
    } else {
        err.to_string()
    };
    SlackError::new(ErrorCode::HttpRequestFailed)
        .with_cause(SlackError::msg(message))
        .with_api_method(method)
}

#[derive(Deserialize)]
struct ExportResponse {
    manifest: AppManifest,
}

#[derive(Deserialize)]
struct ApprovalCreateResponse {
    #[serde(default)]
    request_id: String,
}

#[async_trait]
impl ApiClient for HttpApiClient {
    fn host(&self) -> &str {
        &self.host
    }

    fn with_host(&self, host: &str) -> Arc<dyn ApiClient> {
        Arc::new(Self {
            client: self.client.clone(),
            host: host.trim_end_matches('/').to_string(),
            user_agent: self.user_agent.clone(),
        })
    }

    async fn validate_session(&self, token: &str) -> SlackResult<AuthSession> {
        self.call("auth.test", token, &json!({})).await
    }

    async fn create_app(
        &self,
        token: &str,
        manifest: &AppManifest,
        enable_distribution: bool,
    ) -> SlackResult<AppManifestResult> {
        let mut payload = json!({ "manifest": manifest });
        if enable_distribution {
            payload["enable_distribution"] = json!(true);
        }
        self.call("apps.manifest.create", token, &payload).await
    }

    async fn update_app(
        &self,
        token: &str,
        app_id: &str,
        manifest: &AppManifest,
        force_update: bool,
        consent_breaking_changes: bool,
    ) -> SlackResult<AppManifestResult> {
        let mut payload = json!({
            "manifest": manifest,
            "app_id": app_id,
            "consent_breaking_changes": consent_breaking_changes,
        });
        if force_update {
            payload["force_update"] = json!(true);
        }
        self.call("apps.manifest.update", token, &payload).await
    }

    async fn validate_app_manifest(
        &self,
        token: &str,
        manifest: &AppManifest,
        app_id: Option<&str>,
    ) -> SlackResult<ManifestValidation> {
        const METHOD: &str = "apps.manifest.validate";
        let mut payload = json!({ "manifest": manifest });
        if let Some(app_id) = app_id.filter(|id| !id.is_empty()) {
            payload["app_id"] = json!(app_id);
        }
        let body = self.post(METHOD, token, &payload).await?;
        let base = decode::<BaseResponse>(METHOD, &body)?;
        let warnings = base.warnings.clone();
        let error = if base.ok && base.errors.is_empty() {
            None
        } else {
            Some(base.into_error(METHOD))
        };
        Ok(ManifestValidation { warnings, error })
    }

    async fn export_app_manifest(&self, token: &str, app_id: &str) -> SlackResult<AppManifest> {
        let response: ExportResponse = self
            .call("apps.manifest.export", token, &json!({ "app_id": app_id }))
            .await?;
        Ok(response.manifest)
    }

    async fn developer_app_install(
        &self,
        token: &str,
        request: &DeveloperInstallRequest,
    ) -> SlackResult<DeveloperInstallOutcome> {
        const METHOD: &str = "apps.developerInstall";
        let body = self.post(METHOD, token, request).await?;
        let base = decode::<BaseResponse>(METHOD, &body)?;
        if base.ok {
            return decode::<InstallResult>(METHOD, &body).map(DeveloperInstallOutcome::Installed);
        }

        let team_id = body
            .get("team_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        match ErrorCode::lookup(&base.error) {
            Some(ErrorCode::AppApprovalRequestEligible) => {
                Ok(DeveloperInstallOutcome::ApprovalRequired {
                    reason: ApprovalReason::Eligible,
                    team_id,
                })
            }
            Some(ErrorCode::AppApprovalRequestPending) => {
                Ok(DeveloperInstallOutcome::ApprovalRequired {
                    reason: ApprovalReason::Pending,
                    team_id,
                })
            }
            Some(ErrorCode::AppApprovalRequestDenied) => Err(base
                .into_error(METHOD)
                .append_remediation(APPROVAL_ALTERNATIVE)),
            _ => Err(base.into_error(METHOD)),
        }
    }

    async fn developer_app_uninstall(
        &self,
        token: &str,
        app_id: &str,
        team_id: &str,
    ) -> SlackResult<()> {
        let mut payload = json!({ "app_id": app_id });
        if !team_id.is_empty() {
            payload["team_id"] = json!(team_id);
        }
        self.call_ok("apps.developerUninstall", token, &payload).await
    }

    async fn request_app_approval(
        &self,
        token: &str,
        request: &ApprovalRequest,
    ) -> SlackResult<String> {
        let response: ApprovalCreateResponse = self
            .call("apps.approvals.requests.create", token, request)
            .await?;
        Ok(response.request_id)
    }

    async fn cancel_app_approval(&self, token: &str, app_id: &str) -> SlackResult<()> {
        self.call_ok(
            "apps.approvals.requests.cancel",
            token,
            &json!({ "app_id": app_id }),
        )
        .await
    }

    async fn delete_app(&self, token: &str, app_id: &str) -> SlackResult<()> {
        self.call_ok("apps.delete", token, &json!({ "app_id": app_id }))
            .await
    }

    async fn get_app_status(
        &self,
        token: &str,
        app_ids: &[String],
        team_id: &str,
    ) -> SlackResult<AppStatusResult> {
        let mut payload = json!({ "app_ids": app_ids });
        if !team_id.is_empty() {
            payload["team_id"] = json!(team_id);
        }
        self.call("apps.status", token, &payload).await
    }

    async fn generate_presigned_post(
        &self,
        token: &str,
        app_id: &str,
    ) -> SlackResult<PresignedPost> {
        self.call(
            "apps.hosted.generatePresignedPost",
            token,
            &json!({ "app_id": app_id }),
        )
        .await
    }

    async fn upload_package_to_s3(
        &self,
        post: &PresignedPost,
        archive: &Path,
    ) -> SlackResult<String> {
        crate::s3::upload_archive(&self.client, post, archive).await
    }

    async fn upload_app(
        &self,
        token: &str,
        runtime: &str,
        app_id: &str,
        file_name: &str,
    ) -> SlackResult<()> {
        self.call_ok(
            "apps.hosted.upload",
            token,
            &json!({
                "app_id": app_id,
                "s3_key": file_name,
                "runtime": runtime,
            }),
        )
        .await
    }

    async fn add_variables(
        &self,
        token: &str,
        app_id: &str,
        variables: &[EnvVariable],
    ) -> SlackResult<()> {
        self.call_ok(
            "apps.hosted.variables.add",
            token,
            &json!({ "app_id": app_id, "variables": variables }),
        )
        .await
    }
}
