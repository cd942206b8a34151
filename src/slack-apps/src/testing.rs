//! Recording test doubles for the collaborators in [`Clients`].

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use slack_api::{
    ApiClient, AppManifestResult, AppStatusResult, ApprovalRequest, DeveloperInstallOutcome,
    DeveloperInstallRequest, EnvVariable, ManifestValidation, PresignedPost,
};
use slack_protocol::{
    AppManifest, AuthSession, InstallResult, InstallTokens, SlackAuth, SlackError, SlackResult,
};
use slack_storage::{ProjectPaths, SystemPaths};
use tempfile::TempDir;

use crate::clients::{Clients, Config};
use crate::env::Environment;
use crate::io::IoStreams;
use crate::runtime::{Runtime, copy_project};

pub(crate) const TEST_HOST: &str = "https://slack.com";
pub(crate) const NEW_APP_ID: &str = "A0NEW";
pub(crate) const BOT_TOKEN: &str = "xoxb-installed";
pub(crate) const APP_TOKEN: &str = "xapp-installed";

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap()
}

/// One `apps.status` call as the fake saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StatusQuery {
    pub host: String,
    pub token: String,
    pub app_ids: Vec<String>,
    pub team_id: String,
}

/// What the fake API returns and records. Shared by every client
/// produced through `with_host`.
#[derive(Default)]
pub(crate) struct FakeState {
    pub calls: Mutex<Vec<String>>,
    pub session: Mutex<AuthSession>,
    pub session_error: Mutex<Option<SlackError>>,
    pub sessions_by_token: Mutex<HashMap<String, AuthSession>>,
    pub create_error: Mutex<Option<SlackError>>,
    pub created_app_id: Mutex<Option<String>>,
    pub update_error: Mutex<Option<SlackError>>,
    pub sent_manifests: Mutex<Vec<AppManifest>>,
    pub validation: Mutex<ManifestValidation>,
    pub exported: Mutex<AppManifest>,
    pub install_outcomes: Mutex<VecDeque<SlackResult<DeveloperInstallOutcome>>>,
    pub install_requests: Mutex<Vec<DeveloperInstallRequest>>,
    pub approval_requests: Mutex<Vec<ApprovalRequest>>,
    pub delete_error: Mutex<Option<SlackError>>,
    pub uninstalls: Mutex<Vec<(String, String)>>,
    pub statuses: Mutex<HashMap<String, SlackResult<AppStatusResult>>>,
    pub status_queries: Mutex<Vec<StatusQuery>>,
    pub s3_error: Mutex<Option<SlackError>>,
    pub uploaded_archives: Mutex<Vec<(PathBuf, bool)>>,
    pub uploads: Mutex<Vec<(String, String, String)>>,
    pub variables: Mutex<Vec<EnvVariable>>,
    pub variables_error: Mutex<Option<SlackError>>,
}

#[derive(Clone)]
pub(crate) struct FakeApi {
    host: String,
    pub state: Arc<FakeState>,
}

impl FakeApi {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            state: Arc::new(FakeState::default()),
        }
    }

    fn record(&self, method: &str) {
        lock(&self.state.calls).push(method.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.state.calls).clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|c| *c == method).count()
    }

    pub fn set_session(&self, session: AuthSession) {
        *lock(&self.state.session) = session;
    }

    pub fn set_validation(&self, validation: ManifestValidation) {
        *lock(&self.state.validation) = validation;
    }

    pub fn push_install(&self, outcome: SlackResult<DeveloperInstallOutcome>) {
        lock(&self.state.install_outcomes).push_back(outcome);
    }

    pub fn set_status(&self, token: &str, result: SlackResult<AppStatusResult>) {
        lock(&self.state.statuses).insert(token.to_string(), result);
    }
}

#[async_trait]
impl ApiClient for FakeApi {
    fn host(&self) -> &str {
        &self.host
    }

    fn with_host(&self, host: &str) -> Arc<dyn ApiClient> {
        Arc::new(Self {
            host: host.to_string(),
            state: Arc::clone(&self.state),
        })
    }

    async fn validate_session(&self, token: &str) -> SlackResult<AuthSession> {
        self.record("auth.test");
        if let Some(err) = lock(&self.state.session_error).clone() {
            return Err(err);
        }
        if let Some(session) = lock(&self.state.sessions_by_token).get(token) {
            return Ok(session.clone());
        }
        Ok(lock(&self.state.session).clone())
    }

    async fn create_app(
        &self,
        _token: &str,
        manifest: &AppManifest,
        _enable_distribution: bool,
    ) -> SlackResult<AppManifestResult> {
        self.record("apps.manifest.create");
        lock(&self.state.sent_manifests).push(manifest.clone());
        if let Some(err) = lock(&self.state.create_error).clone() {
            return Err(err);
        }
        let app_id = lock(&self.state.created_app_id)
            .clone()
            .unwrap_or_else(|| NEW_APP_ID.to_string());
        Ok(AppManifestResult {
            app_id,
            ..Default::default()
        })
    }

    async fn update_app(
        &self,
        _token: &str,
        app_id: &str,
        manifest: &AppManifest,
        _force_update: bool,
        _consent_breaking_changes: bool,
    ) -> SlackResult<AppManifestResult> {
        self.record("apps.manifest.update");
        lock(&self.state.sent_manifests).push(manifest.clone());
        if let Some(err) = lock(&self.state.update_error).clone() {
            return Err(err);
        }
        Ok(AppManifestResult {
            app_id: app_id.to_string(),
            ..Default::default()
        })
    }

    async fn validate_app_manifest(
        &self,
        _token: &str,
        _manifest: &AppManifest,
        _app_id: Option<&str>,
    ) -> SlackResult<ManifestValidation> {
        self.record("apps.manifest.validate");
        Ok(lock(&self.state.validation).clone())
    }

    async fn export_app_manifest(&self, _token: &str, _app_id: &str) -> SlackResult<AppManifest> {
        self.record("apps.manifest.export");
        Ok(lock(&self.state.exported).clone())
    }

    async fn developer_app_install(
        &self,
        _token: &str,
        request: &DeveloperInstallRequest,
    ) -> SlackResult<DeveloperInstallOutcome> {
        self.record("apps.developerInstall");
        lock(&self.state.install_requests).push(request.clone());
        lock(&self.state.install_outcomes).pop_front().unwrap_or_else(|| {
            Ok(DeveloperInstallOutcome::Installed(InstallResult {
                app_id: request.app_id.clone(),
                tokens: InstallTokens {
                    bot: BOT_TOKEN.to_string(),
                    app_level: APP_TOKEN.to_string(),
                    user: String::new(),
                },
            }))
        })
    }

    async fn developer_app_uninstall(
        &self,
        _token: &str,
        app_id: &str,
        team_id: &str,
    ) -> SlackResult<()> {
        self.record("apps.developerUninstall");
        lock(&self.state.uninstalls).push((app_id.to_string(), team_id.to_string()));
        Ok(())
    }

    async fn request_app_approval(
        &self,
        _token: &str,
        request: &ApprovalRequest,
    ) -> SlackResult<String> {
        self.record("apps.approvals.requests.create");
        lock(&self.state.approval_requests).push(request.clone());
        Ok("R0001".to_string())
    }

    async fn cancel_app_approval(&self, _token: &str, _app_id: &str) -> SlackResult<()> {
        self.record("apps.approvals.requests.cancel");
        Ok(())
    }

    async fn delete_app(&self, _token: &str, _app_id: &str) -> SlackResult<()> {
        self.record("apps.delete");
        match lock(&self.state.delete_error).clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn get_app_status(
        &self,
        token: &str,
        app_ids: &[String],
        team_id: &str,
    ) -> SlackResult<AppStatusResult> {
        self.record("apps.status");
        lock(&self.state.status_queries).push(StatusQuery {
            host: self.host.clone(),
            token: token.to_string(),
            app_ids: app_ids.to_vec(),
            team_id: team_id.to_string(),
        });
        lock(&self.state.statuses)
            .get(token)
            .cloned()
            .unwrap_or_else(|| Ok(AppStatusResult::default()))
    }

    async fn generate_presigned_post(
        &self,
        _token: &str,
        app_id: &str,
    ) -> SlackResult<PresignedPost> {
        self.record("apps.hosted.generatePresignedPost");
        Ok(PresignedPost {
            url: "https://s3.example.com/upload".to_string(),
            file_name: format!("{app_id}.zip"),
            ..Default::default()
        })
    }

    async fn upload_package_to_s3(
        &self,
        post: &PresignedPost,
        archive: &Path,
    ) -> SlackResult<String> {
        self.record("s3.upload");
        lock(&self.state.uploaded_archives).push((archive.to_path_buf(), archive.is_file()));
        match lock(&self.state.s3_error).clone() {
            Some(err) => Err(err),
            None => Ok(post.file_name.clone()),
        }
    }

    async fn upload_app(
        &self,
        _token: &str,
        runtime: &str,
        app_id: &str,
        file_name: &str,
    ) -> SlackResult<()> {
        self.record("apps.hosted.upload");
        lock(&self.state.uploads).push((
            runtime.to_string(),
            app_id.to_string(),
            file_name.to_string(),
        ));
        Ok(())
    }

    async fn add_variables(
        &self,
        _token: &str,
        _app_id: &str,
        variables: &[EnvVariable],
    ) -> SlackResult<()> {
        self.record("apps.hosted.variables.add");
        lock(&self.state.variables).extend_from_slice(variables);
        match lock(&self.state.variables_error).clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Scripted terminal. Unscripted prompts take their default answer.
#[derive(Default)]
pub(crate) struct FakeIo {
    pub tty: Mutex<bool>,
    pub confirms: Mutex<VecDeque<bool>>,
    pub inputs: Mutex<VecDeque<String>>,
    pub prompts: Mutex<Vec<String>>,
    pub info: Mutex<Vec<String>>,
    pub warnings: Mutex<Vec<String>>,
}

impl FakeIo {
    pub fn set_tty(&self, tty: bool) {
        *lock(&self.tty) = tty;
    }

    pub fn answer(&self, yes: bool) {
        lock(&self.confirms).push_back(yes);
    }

    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn info(&self) -> String {
        lock(&self.info).join("\n")
    }

    pub fn warnings(&self) -> String {
        lock(&self.warnings).join("\n")
    }
}

impl IoStreams for FakeIo {
    fn print_info(&self, message: &str) {
        lock(&self.info).push(message.to_string());
    }

    fn print_warning(&self, message: &str) {
        lock(&self.warnings).push(message.to_string());
    }

    fn is_tty(&self) -> bool {
        *lock(&self.tty)
    }

    fn confirm(&self, prompt: &str, default: bool) -> SlackResult<bool> {
        lock(&self.prompts).push(prompt.to_string());
        Ok(lock(&self.confirms).pop_front().unwrap_or(default))
    }

    fn input(&self, prompt: &str, default: &str) -> SlackResult<String> {
        lock(&self.prompts).push(prompt.to_string());
        Ok(lock(&self.inputs)
            .pop_front()
            .unwrap_or_else(|| default.to_string()))
    }
}

#[derive(Default)]
pub(crate) struct FakeEnv {
    pub vars: Mutex<HashMap<String, String>>,
}

impl FakeEnv {
    pub fn get(&self, key: &str) -> Option<String> {
        lock(&self.vars).get(key).cloned()
    }
}

impl Environment for FakeEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key)
    }

    fn set(&self, key: &str, value: &str) -> SlackResult<()> {
        lock(&self.vars).insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A runtime that copies for real and fakes dependency installs.
#[derive(Default)]
pub(crate) struct FakeRuntime {
    pub calls: Mutex<Vec<String>>,
    pub staging: Mutex<Vec<PathBuf>>,
    pub install_delay: Option<Duration>,
    /// Written into the package by the dependency install.
    pub vendored_file: Option<(String, String)>,
}

impl FakeRuntime {
    pub fn staging_dirs(&self) -> Vec<PathBuf> {
        lock(&self.staging).clone()
    }
}

#[async_trait]
impl Runtime for FakeRuntime {
    fn name(&self) -> &'static str {
        "Deno"
    }

    fn ignore_directories(&self) -> &'static [&'static str] {
        &["node_modules"]
    }

    async fn prepare_package(&self, src: &Path, dst: &Path) -> SlackResult<()> {
        lock(&self.calls).push("prepare_package".to_string());
        lock(&self.staging).push(dst.to_path_buf());
        copy_project(src, dst, self.ignore_directories()).await
    }

    async fn install_project_dependencies(&self, dir: &Path) -> SlackResult<()> {
        lock(&self.calls).push("install_project_dependencies".to_string());
        if let Some(delay) = self.install_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((name, contents)) = &self.vendored_file {
            tokio::fs::write(dir.join(name), contents).await?;
        }
        Ok(())
    }
}

/// A project directory, a config directory and fakes for everything else.
pub(crate) struct TestClients {
    pub dir: TempDir,
    pub api: FakeApi,
    pub io: Arc<FakeIo>,
    pub env: Arc<FakeEnv>,
    pub runtime: Option<Arc<FakeRuntime>>,
    pub config: Config,
    project: ProjectPaths,
}

impl TestClients {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("project")).unwrap();
        std::fs::create_dir_all(dir.path().join("home/.slack")).unwrap();
        let project = ProjectPaths::new(dir.path().join("project"));
        Self {
            dir,
            project,
            api: FakeApi::new(TEST_HOST),
            io: Arc::new(FakeIo::default()),
            env: Arc::new(FakeEnv::default()),
            runtime: None,
            config: Config {
                command: "deploy".to_string(),
                ..Default::default()
            },
        }
    }

    pub fn root(&self) -> &Path {
        &self.project.root
    }

    pub fn project(&self) -> &ProjectPaths {
        &self.project
    }

    pub fn clients(&self) -> Clients {
        Clients {
            api: Arc::new(self.api.clone()),
            io: self.io.clone(),
            env: self.env.clone(),
            runtime: self
                .runtime
                .clone()
                .map(|r| r as Arc<dyn Runtime>),
            config: self.config.clone(),
            project: self.project.clone(),
            system: SystemPaths::from_root(self.dir.path().join("home/.slack")),
        }
    }

    pub fn write_project_file(&self, rel: &str, contents: &str) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    pub fn read_project_file(&self, rel: &str) -> Option<String> {
        std::fs::read_to_string(self.root().join(rel)).ok()
    }

    /// A stored credential for workspace `T1`.
    pub fn auth(&self) -> SlackAuth {
        SlackAuth {
            token: "xoxp-test".to_string(),
            team_domain: "acme".to_string(),
            team_id: "T1".to_string(),
            user_id: "U1".to_string(),
            ..Default::default()
        }
    }

    /// Writes the credentials file in the fake home directory.
    pub fn write_credentials(&self, auths: &[SlackAuth]) {
        let map: std::collections::BTreeMap<_, _> = auths
            .iter()
            .map(|a| (a.team_id.clone(), a.clone()))
            .collect();
        std::fs::write(
            self.dir.path().join("home/.slack/credentials.json"),
            serde_json::to_vec_pretty(&map).unwrap(),
        )
        .unwrap();
    }
}
