//! App lifecycle against a mocked backend over HTTP.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use slack_api::HttpApiClient;
use slack_apps::install::{APP_TOKEN_ENV, BOT_TOKEN_ENV};
use slack_apps::{Clients, Config, Environment, InstallOptions, IoStreams, Runtime};
use slack_protocol::{App, ErrorCode, InstallState, InstallStatus, SlackAuth, SlackError, SlackResult};
use slack_storage::{AppRegistry, ManifestCache, ProjectPaths, SystemPaths};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct ScriptedIo {
    info: Mutex<Vec<String>>,
}

impl IoStreams for ScriptedIo {
    fn print_info(&self, message: &str) {
        self.info.lock().unwrap().push(message.to_string());
    }

    fn print_warning(&self, message: &str) {
        self.info.lock().unwrap().push(message.to_string());
    }

    fn is_tty(&self) -> bool {
        false
    }

    fn confirm(&self, _prompt: &str, _default: bool) -> SlackResult<bool> {
        Err(SlackError::new(ErrorCode::CancelledByUser))
    }

    fn input(&self, _prompt: &str, default: &str) -> SlackResult<String> {
        Ok(default.to_string())
    }
}

#[derive(Default)]
struct MapEnv {
    vars: Mutex<HashMap<String, String>>,
}

impl Environment for MapEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        self.vars.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> SlackResult<()> {
        self.vars.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Packages the project as is.
struct PlainRuntime;

#[async_trait]
impl Runtime for PlainRuntime {
    fn name(&self) -> &'static str {
        "Deno"
    }

    fn ignore_directories(&self) -> &'static [&'static str] {
        &[]
    }

    async fn install_project_dependencies(&self, _dir: &Path) -> SlackResult<()> {
        Ok(())
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    server: MockServer,
    clients: Clients,
    env: Arc<MapEnv>,
}

impl Harness {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        let home = dir.path().join("home");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::create_dir_all(&home).unwrap();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth.test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "team_id": "T1",
                "user_id": "U1",
                "url": "https://acme.slack.com/",
            })))
            .mount(&server)
            .await;

        let env = Arc::new(MapEnv::default());
        let clients = Clients {
            api: Arc::new(HttpApiClient::new(server.uri()).unwrap()),
            io: Arc::new(ScriptedIo::default()),
            env: env.clone(),
            runtime: Some(Arc::new(PlainRuntime)),
            config: Config {
                command: "install".to_string(),
                ..Default::default()
            },
            project: ProjectPaths::new(root),
            system: SystemPaths::from_root(home),
        };
        Self {
            _dir: dir,
            server,
            clients,
            env,
        }
    }

    fn write_manifest(&self, name: &str) {
        let manifest = json!({
            "display_information": { "name": name },
            "oauth_config": { "scopes": { "bot": ["chat:write"] } },
        });
        std::fs::write(
            self.clients.project.root.join("manifest.json"),
            serde_json::to_vec(&manifest).unwrap(),
        )
        .unwrap();
    }

    async fn mock_ok(&self, api_method: &str, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path(format!("/api/{api_method}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    async fn requests_to(&self, api_method: &str) -> usize {
        let wanted = format!("/api/{api_method}");
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == wanted)
            .count()
    }
}

fn auth() -> SlackAuth {
    SlackAuth {
        token: "xoxp-1".to_string(),
        team_domain: "acme".to_string(),
        team_id: "T1".to_string(),
        user_id: "U1".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn install_creates_then_guards_manifest_changes() {
    let h = Harness::new().await;
    h.write_manifest("Tasks");
    h.mock_ok("apps.manifest.validate", json!({ "ok": true })).await;
    h.mock_ok("apps.manifest.create", json!({ "ok": true, "app_id": "A123" })).await;
    h.mock_ok("apps.manifest.update", json!({ "ok": true, "app_id": "A123" })).await;
    h.mock_ok(
        "apps.developerInstall",
        json!({
            "ok": true,
            "app_id": "A123",
            "api_access_tokens": { "bot": "xoxb-1", "app_level": "xapp-1" },
        }),
    )
    .await;

    let outcome = slack_apps::install(&h.clients, &auth(), App::new_deployed("T1"), &InstallOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.state, InstallState::Success);
    assert_eq!(outcome.app.app_id(), "A123");
    assert_eq!(h.env.lookup(BOT_TOKEN_ENV).as_deref(), Some("xoxb-1"));
    assert_eq!(h.env.lookup(APP_TOKEN_ENV).as_deref(), Some("xapp-1"));
    let registry = AppRegistry::load(&h.clients.project).await.unwrap();
    let saved = registry.deployed("T1").unwrap();
    assert_eq!(saved.app_id(), "A123");
    let hash = ManifestCache::new(&h.clients.project)
        .get_manifest_hash("A123")
        .await
        .unwrap();
    assert!(!hash.is_empty());

    // Unchanged manifest: updated without a prompt.
    slack_apps::install(&h.clients, &auth(), saved.clone(), &InstallOptions::default())
        .await
        .unwrap();
    assert_eq!(h.requests_to("apps.manifest.update").await, 1);

    // Changed manifest without a terminal or --force: nothing is sent.
    h.write_manifest("Tasks v2");
    let err = slack_apps::install(&h.clients, &auth(), saved, &InstallOptions::default())
        .await
        .unwrap_err();
    assert!(err.is(ErrorCode::AppManifestUpdate));
    assert!(err.remediation().unwrap().contains("--force"));
    assert_eq!(h.requests_to("apps.manifest.update").await, 1);
    assert_eq!(h.requests_to("apps.manifest.create").await, 1);
}

#[tokio::test]
async fn install_reports_pending_approval() {
    let h = Harness::new().await;
    h.write_manifest("Tasks");
    h.mock_ok("apps.manifest.validate", json!({ "ok": true })).await;
    h.mock_ok("apps.manifest.create", json!({ "ok": true, "app_id": "A123" })).await;
    h.mock_ok(
        "apps.developerInstall",
        json!({ "ok": false, "error": "app_approval_request_pending", "team_id": "T1" }),
    )
    .await;

    let outcome = slack_apps::install(&h.clients, &auth(), App::new_deployed("T1"), &InstallOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.state, InstallState::RequestPending);
    assert!(outcome.result.is_none());
    assert_eq!(h.requests_to("apps.approvals.requests.cancel").await, 0);
    assert!(h.env.lookup(BOT_TOKEN_ENV).is_none());
}

#[tokio::test]
async fn deploy_uploads_archive_and_lists_installed_app() {
    let h = Harness::new().await;
    h.write_manifest("Tasks");
    std::fs::write(h.clients.project.root.join("main.ts"), "export {}").unwrap();
    h.mock_ok(
        "apps.manifest.export",
        json!({ "ok": true, "manifest": { "display_information": { "name": "Tasks" } } }),
    )
    .await;
    h.mock_ok(
        "apps.hosted.generatePresignedPost",
        json!({
            "ok": true,
            "url": format!("{}/s3-upload", h.server.uri()),
            "file_name": "A123.zip",
            "fields": { "key": "A123.zip" },
        }),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/s3-upload"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/apps.hosted.upload"))
        .and(body_partial_json(json!({ "app_id": "A123", "runtime": "deno", "s3_key": "A123.zip" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&h.server)
        .await;

    let app = App {
        app_id: Some("A123".to_string()),
        team_id: "T1".to_string(),
        team_domain: "acme".to_string(),
        ..Default::default()
    };
    let result = slack_apps::deploy(&h.clients, &auth(), app, None).await.unwrap();

    assert_eq!(result.app_name, "Tasks");
    assert!(result.package_size > 0);
    assert_eq!(h.requests_to("apps.hosted.variables.add").await, 0);

    std::fs::write(
        h.clients.system.credentials_file.clone(),
        serde_json::to_vec(&json!({ "T1": auth() })).unwrap(),
    )
    .unwrap();
    h.mock_ok(
        "apps.status",
        json!({ "ok": true, "apps": [{ "app_id": "A123", "is_installed": true }] }),
    )
    .await;

    let listing = slack_apps::list(&h.clients).await.unwrap();

    assert_eq!(listing.apps.len(), 1);
    assert_eq!(listing.apps[0].app_id(), "A123");
    assert_eq!(listing.apps[0].install_status, InstallStatus::Installed);
}
