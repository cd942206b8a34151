//! The API seam used by the rest of the CLI.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use slack_protocol::{AppManifest, AuthSession, SlackResult};

use crate::types::{
    AppManifestResult, AppStatusResult, ApprovalRequest, DeveloperInstallOutcome,
    DeveloperInstallRequest, EnvVariable, ManifestValidation, PresignedPost,
};

/// Operations the CLI performs against the Slack API.
///
/// Implementations are bound to one API host; [`ApiClient::with_host`]
/// produces an independent client for another host so per-credential
/// requests never share mutable state.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Base URL requests are sent to, e.g. `https://slack.com`.
    fn host(&self) -> &str;

    /// A client for the same backend API bound to `host`.
    fn with_host(&self, host: &str) -> Arc<dyn ApiClient>;

    /// `auth.test`
    async fn validate_session(&self, token: &str) -> SlackResult<AuthSession>;

    /// `apps.manifest.create`
    async fn create_app(
        &self,
        token: &str,
        manifest: &AppManifest,
        enable_distribution: bool,
    ) -> SlackResult<AppManifestResult>;

    /// `apps.manifest.update`
    async fn update_app(
        &self,
        token: &str,
        app_id: &str,
        manifest: &AppManifest,
        force_update: bool,
        consent_breaking_changes: bool,
    ) -> SlackResult<AppManifestResult>;

    /// `apps.manifest.validate`
    async fn validate_app_manifest(
        &self,
        token: &str,
        manifest: &AppManifest,
        app_id: Option<&str>,
    ) -> SlackResult<ManifestValidation>;

    /// `apps.manifest.export`
    async fn export_app_manifest(&self, token: &str, app_id: &str) -> SlackResult<AppManifest>;

    /// `apps.developerInstall`
    async fn developer_app_install(
        &self,
        token: &str,
        request: &DeveloperInstallRequest,
    ) -> SlackResult<DeveloperInstallOutcome>;

    /// `apps.developerUninstall`
    async fn developer_app_uninstall(
        &self,
        token: &str,
        app_id: &str,
        team_id: &str,
    ) -> SlackResult<()>;

    /// `apps.approvals.requests.create`, returning the request ID.
    async fn request_app_approval(
        &self,
        token: &str,
        request: &ApprovalRequest,
    ) -> SlackResult<String>;

    /// `apps.approvals.requests.cancel`
    async fn cancel_app_approval(&self, token: &str, app_id: &str) -> SlackResult<()>;

    /// `apps.delete`
    async fn delete_app(&self, token: &str, app_id: &str) -> SlackResult<()>;

    /// `apps.status`
    async fn get_app_status(
        &self,
        token: &str,
        app_ids: &[String],
        team_id: &str,
    ) -> SlackResult<AppStatusResult>;

    /// `apps.hosted.generatePresignedPost`
    async fn generate_presigned_post(&self, token: &str, app_id: &str)
    -> SlackResult<PresignedPost>;

    /// Uploads an archive with presigned POST parameters, returning the
    /// uploaded file name.
    async fn upload_package_to_s3(
        &self,
        post: &PresignedPost,
        archive: &Path,
    ) -> SlackResult<String>;

    /// `apps.hosted.upload`
    async fn upload_app(
        &self,
        token: &str,
        runtime: &str,
        app_id: &str,
        file_name: &str,
    ) -> SlackResult<()>;

    /// `apps.hosted.variables.add`
    async fn add_variables(
        &self,
        token: &str,
        app_id: &str,
        variables: &[EnvVariable],
    ) -> SlackResult<()>;
}
