//! Deploying a hosted app.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use slack_api::{EnvVariable, is_dev_host};
use slack_protocol::{App, ErrorCode, SlackAuth, SlackError, SlackResult};
use slack_storage::AppRegistry;
use tracing::{debug, info, warn};

use crate::clients::Clients;
use crate::package::{DEPENDENCY_TIMEOUT, package_project};

const API_URL_VARIABLE: &str = "SLACK_API_URL";

/// Creates default triggers for a freshly deployed app.
#[async_trait]
pub trait TriggerGenerator: Send + Sync {
    async fn generate_triggers(&self, clients: &Clients, token: &str, app: &App) -> SlackResult<()>;
}

/// Generates nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTriggers;

#[async_trait]
impl TriggerGenerator for NoopTriggers {
    async fn generate_triggers(&self, _clients: &Clients, _token: &str, _app: &App) -> SlackResult<()> {
        Ok(())
    }
}

/// Summary of a deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployResult {
    pub app: App,
    /// Display name from the app's stored manifest.
    pub app_name: String,
    /// Archive size in bytes.
    pub package_size: u64,
    pub package_time: Duration,
    pub deploy_time: Duration,
}

/// Packages the project and uploads it to an existing hosted app.
///
/// The manifest on app settings is read for its name only; deploying
/// never edits it.
pub async fn deploy(
    clients: &Clients,
    auth: &SlackAuth,
    mut app: App,
    triggers: Option<&dyn TriggerGenerator>,
) -> SlackResult<DeployResult> {
    let token = auth.token.trim();
    if token.is_empty() {
        return Err(SlackError::new(ErrorCode::AuthToken));
    }
    if app.is_new() {
        return Err(SlackError::new(ErrorCode::AppNotFound)
            .with_message("No app found to deploy")
            .wrap(ErrorCode::AppDeploy));
    }

    let session = clients
        .api
        .validate_session(token)
        .await
        .map_err(|e| e.wrap(ErrorCode::SlackAuth))?;
    if let Some(enterprise_id) = session.enterprise_id.filter(|id| !id.is_empty()) {
        app.enterprise_id = enterprise_id;
    }

    let manifest = clients
        .api
        .export_app_manifest(token, app.app_id())
        .await
        .map_err(|e| SlackError::new(ErrorCode::AppManifestAccess).with_cause(e))?;
    let app_name = manifest.display_information.name;

    if let Some(triggers) = triggers {
        triggers
            .generate_triggers(clients, token, &app)
            .await
            .map_err(|e| e.wrap(ErrorCode::AppDeploy))?;
    }

    let (package_size, package_time, deploy_time) = deploy_app(clients, token, &app)
        .await
        .map_err(|e| e.wrap(ErrorCode::AppDeploy))?;

    if !clients.config.skip_local_fs {
        let mut registry = AppRegistry::load(&clients.project)
            .await
            .map_err(|e| e.wrap(ErrorCode::AppDeploy))?;
        registry
            .save_deployed(app.clone())
            .await
            .map_err(|e| e.wrap(ErrorCode::AppDeploy))?;
    }

    info!(app_id = %app.app_id(), app_name = %app_name, package_size, "Deployed app");
    Ok(DeployResult {
        app,
        app_name,
        package_size,
        package_time,
        deploy_time,
    })
}

async fn deploy_app(clients: &Clients, token: &str, app: &App) -> SlackResult<(u64, Duration, Duration)> {
    let runtime = clients.runtime.as_ref().ok_or_else(|| {
        SlackError::new(ErrorCode::RuntimeNotSupported)
            .with_message("The project runtime is not supported by this CLI")
    })?;
    let app_id = app.app_id();

    let started = Instant::now();
    let package = package_project(&**runtime, &clients.project.root, app_id, DEPENDENCY_TIMEOUT).await?;
    let package_time = started.elapsed();
    debug!(
        size_mb = %format!("{:.3}", package.size as f64 / 1_000_000.0),
        secs = %format!("{:.1}", package_time.as_secs_f64()),
        "Packaged app"
    );

    let started = Instant::now();
    let post = clients.api.generate_presigned_post(token, app_id).await?;
    let file_name = clients.api.upload_package_to_s3(&post, &package.archive).await?;
    let runtime_name = runtime.name().to_lowercase();
    clients
        .api
        .upload_app(token, &runtime_name, app_id, &file_name)
        .await?;
    let deploy_time = started.elapsed();

    let size = package.size;
    let archive = package.archive.to_path_buf();
    if let Err(e) = package.archive.close() {
        warn!(path = %archive.display(), error = %e, "Failed to remove package archive");
    }

    let host = clients.api.host();
    if is_dev_host(host) {
        let variable = EnvVariable {
            name: API_URL_VARIABLE.to_string(),
            value: format!("{}/api/", host.trim_end_matches('/')),
        };
        if let Err(e) = clients.api.add_variables(token, app_id, &[variable]).await {
            debug!(app_id, error = %e, "Failed to set the API URL variable");
        }
    }

    Ok((size, package_time, deploy_time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRuntime, TestClients};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    fn hosted_app() -> App {
        App {
            app_id: Some("A1".to_string()),
            team_id: "T1".to_string(),
            team_domain: "acme".to_string(),
            ..Default::default()
        }
    }

    fn setup() -> (TestClients, Arc<FakeRuntime>) {
        let mut t = TestClients::new();
        t.write_project_file("manifest.json", r#"{"display_information":{"name":"Tasks"}}"#);
        t.write_project_file("functions/greet.ts", "export default {}");
        *t.api.state.exported.lock().unwrap() =
            serde_json::from_str(r#"{"display_information":{"name":"Tasks App"}}"#).unwrap();
        let runtime = Arc::new(FakeRuntime::default());
        t.runtime = Some(runtime.clone());
        (t, runtime)
    }

    #[derive(Default)]
    struct RecordingTriggers {
        apps: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TriggerGenerator for RecordingTriggers {
        async fn generate_triggers(&self, _clients: &Clients, _token: &str, app: &App) -> SlackResult<()> {
            self.apps.lock().unwrap().push(app.app_id().to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_deploy_uploads_package_and_records_app() {
        let (t, runtime) = setup();

        let result = deploy(&t.clients(), &t.auth(), hosted_app(), None).await.unwrap();

        assert_eq!(result.app_name, "Tasks App");
        assert!(result.package_size > 0);
        assert_eq!(
            t.api.calls(),
            vec![
                "auth.test",
                "apps.manifest.export",
                "apps.hosted.generatePresignedPost",
                "s3.upload",
                "apps.hosted.upload",
            ]
        );
        assert_eq!(
            t.api.state.uploads.lock().unwrap().clone(),
            vec![("deno".to_string(), "A1".to_string(), "A1.zip".to_string())]
        );

        let (archive, existed) = t.api.state.uploaded_archives.lock().unwrap()[0].clone();
        assert!(existed);
        assert!(!archive.exists());
        assert!(!runtime.staging_dirs()[0].exists());

        let registry = AppRegistry::load(t.project()).await.unwrap();
        assert_eq!(registry.deployed("T1").unwrap().app_id(), "A1");
        assert_eq!(t.api.count("apps.manifest.update"), 0);
    }

    #[tokio::test]
    async fn test_deploy_new_app_fails_before_any_call() {
        let (t, runtime) = setup();

        let err = deploy(&t.clients(), &t.auth(), App::new_deployed("T1"), None)
            .await
            .unwrap_err();

        assert!(err.is(ErrorCode::AppDeploy));
        assert!(t.api.calls().is_empty());
        assert!(runtime.calls.lock().unwrap().is_empty());
        assert!(runtime.staging_dirs().is_empty());
        assert!(!t.project().slack_dir.exists());
    }

    #[tokio::test]
    async fn test_deploy_requires_token() {
        let (t, _) = setup();
        let mut auth = t.auth();
        auth.token = "  ".to_string();

        let err = deploy(&t.clients(), &auth, hosted_app(), None).await.unwrap_err();

        assert!(err.is(ErrorCode::AuthToken));
        assert!(t.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_deploy_without_runtime() {
        let (mut t, _) = setup();
        t.runtime = None;

        let err = deploy(&t.clients(), &t.auth(), hosted_app(), None).await.unwrap_err();

        assert!(err.is(ErrorCode::AppDeploy));
        assert!(err.is(ErrorCode::RuntimeNotSupported));
        assert_eq!(t.api.count("apps.hosted.generatePresignedPost"), 0);
    }

    #[tokio::test]
    async fn test_failed_upload_removes_archive() {
        let (t, _) = setup();
        *t.api.state.s3_error.lock().unwrap() = Some(SlackError::new(ErrorCode::S3Upload));

        let err = deploy(&t.clients(), &t.auth(), hosted_app(), None).await.unwrap_err();

        assert!(err.is(ErrorCode::S3Upload));
        let (archive, existed) = t.api.state.uploaded_archives.lock().unwrap()[0].clone();
        assert!(existed);
        assert!(!archive.exists());
        assert_eq!(t.api.count("apps.hosted.upload"), 0);
        assert!(!t.project().apps_file.exists());
    }

    #[tokio::test]
    async fn test_dev_host_sets_api_url_best_effort() {
        let (t, _) = setup();
        let mut clients = t.clients();
        clients.api = clients.api.with_host("https://dev1234.slack.com");
        *t.api.state.variables_error.lock().unwrap() = Some(SlackError::from_code("internal_error"));

        deploy(&clients, &t.auth(), hosted_app(), None).await.unwrap();

        let variables = t.api.state.variables.lock().unwrap().clone();
        assert_eq!(
            variables,
            vec![EnvVariable {
                name: "SLACK_API_URL".to_string(),
                value: "https://dev1234.slack.com/api/".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_triggers_generated_before_packaging() {
        let (t, _) = setup();
        let triggers = RecordingTriggers::default();

        deploy(&t.clients(), &t.auth(), hosted_app(), Some(&triggers))
            .await
            .unwrap();

        assert_eq!(triggers.apps.lock().unwrap().clone(), vec!["A1".to_string()]);
        assert_eq!(t.api.count("apps.hosted.variables.add"), 0);
    }

    #[tokio::test]
    async fn test_enterprise_session_recorded() {
        let (t, _) = setup();
        t.api.set_session(slack_protocol::AuthSession {
            enterprise_id: Some("E1".to_string()),
            ..Default::default()
        });

        let result = deploy(&t.clients(), &t.auth(), hosted_app(), Some(&NoopTriggers))
            .await
            .unwrap();

        assert_eq!(result.app.enterprise_id, "E1");
    }
}
