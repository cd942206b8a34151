//! Tests for the app registry.

use pretty_assertions::assert_eq;
use slack_protocol::{App, ErrorCode};
use tempfile::tempdir;

use crate::paths::ProjectPaths;
use crate::registry::AppRegistry;

fn deployed(app_id: &str, team_id: &str, team_domain: &str) -> App {
    App {
        app_id: Some(app_id.to_string()),
        team_id: team_id.to_string(),
        team_domain: team_domain.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_load_empty_project() {
    let dir = tempdir().unwrap();
    let paths = ProjectPaths::new(dir.path());

    let registry = AppRegistry::load(&paths).await.unwrap();
    assert!(registry.apps().is_empty());
    assert!(!paths.apps_file.exists());
    assert!(!paths.apps_dev_file.exists());
}

#[tokio::test]
async fn test_save_and_reload() {
    let dir = tempdir().unwrap();
    let paths = ProjectPaths::new(dir.path());

    let mut registry = AppRegistry::load(&paths).await.unwrap();
    registry.save_deployed(deployed("A1", "T1", "acme")).await.unwrap();
    registry.save_local(deployed("A2", "T1", "acme")).await.unwrap();
    registry.save_deployed(deployed("A3", "T2", "beta")).await.unwrap();

    let reloaded = AppRegistry::load(&paths).await.unwrap();
    assert_eq!(reloaded.deployed("T1").unwrap().app_id(), "A1");
    assert_eq!(reloaded.deployed("T2").unwrap().app_id(), "A3");
    let local = reloaded.local("T1").unwrap();
    assert_eq!(local.app_id(), "A2");
    assert!(local.is_dev);
    assert_eq!(reloaded.default_app().unwrap().team_id, "T1");
    assert!(reloaded.local("T2").is_none());
    assert!(reloaded.deployed_or_new("T9").is_new());
}

#[tokio::test]
async fn test_load_migrates_legacy_layout() {
    let dir = tempdir().unwrap();
    let paths = ProjectPaths::new(dir.path());
    std::fs::create_dir_all(&paths.slack_dir).unwrap();
    std::fs::write(
        &paths.apps_file,
        r#"{
            "apps": {"acme": {"app_id": "A1", "name": "acme", "team_id": "T1"}},
            "default": "acme",
            "dev": {"acme": {"app_id": "A2", "name": "acme", "team_id": "T1"}}
        }"#,
    )
    .unwrap();

    let registry = AppRegistry::load(&paths).await.unwrap();
    let app = registry.deployed("T1").unwrap();
    assert_eq!(app.team_domain, "acme");
    assert!(app.legacy_name.is_empty());
    assert_eq!(registry.local("T1").unwrap().app_id(), "A2");

    let rewritten: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&paths.apps_file).unwrap()).unwrap();
    assert!(rewritten.get("dev").is_none());
    assert_eq!(rewritten["apps"]["T1"]["team_domain"], "acme");
    assert!(rewritten["apps"]["T1"].get("name").is_none());

    let local: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&paths.apps_dev_file).unwrap()).unwrap();
    assert_eq!(local["T1"]["app_id"], "A2");
}

#[tokio::test]
async fn test_local_records_without_team_id_use_their_key() {
    let dir = tempdir().unwrap();
    let paths = ProjectPaths::new(dir.path());
    std::fs::create_dir_all(&paths.slack_dir).unwrap();
    std::fs::write(&paths.apps_dev_file, r#"{"T5": {"app_id": "A5", "IsDev": true}}"#).unwrap();

    let registry = AppRegistry::load(&paths).await.unwrap();
    assert_eq!(registry.local("T5").unwrap().app_id(), "A5");
}

#[tokio::test]
async fn test_new_deployed_rejects_existing_team() {
    let dir = tempdir().unwrap();
    let paths = ProjectPaths::new(dir.path());

    let mut registry = AppRegistry::load(&paths).await.unwrap();
    let app = registry.new_deployed("T1").await.unwrap();
    assert!(app.is_new());

    let err = registry.new_deployed("T1").await.unwrap_err();
    assert!(err.is(ErrorCode::AppFound));
}

#[tokio::test]
async fn test_save_requires_team_id() {
    let dir = tempdir().unwrap();
    let paths = ProjectPaths::new(dir.path());

    let mut registry = AppRegistry::load(&paths).await.unwrap();
    let err = registry.save(App::default()).await.unwrap_err();
    assert!(err.is(ErrorCode::MissingAppTeamId));
}

#[tokio::test]
async fn test_remove_repoints_default() {
    let dir = tempdir().unwrap();
    let paths = ProjectPaths::new(dir.path());

    let mut registry = AppRegistry::load(&paths).await.unwrap();
    registry.save_deployed(deployed("A1", "T1", "acme")).await.unwrap();
    registry.save_deployed(deployed("A2", "T2", "beta")).await.unwrap();

    let removed = registry.remove(&deployed("A1", "T1", "acme")).await.unwrap();
    assert_eq!(removed.unwrap().app_id(), "A1");
    assert_eq!(registry.default_app().unwrap().team_id, "T2");

    let missing = registry.remove_local_by_team_id("T1").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_clean_up_removes_empty_project_dir() {
    let dir = tempdir().unwrap();
    let paths = ProjectPaths::new(dir.path());

    let mut registry = AppRegistry::load(&paths).await.unwrap();
    registry.save_deployed(deployed("A1", "T1", "acme")).await.unwrap();
    registry.remove_deployed_by_team_id("T1").await.unwrap();
    registry.clean_up().await;

    assert!(!paths.apps_file.exists());
    assert!(!paths.slack_dir.exists());
}

#[tokio::test]
async fn test_clean_up_keeps_project_config() {
    let dir = tempdir().unwrap();
    let paths = ProjectPaths::new(dir.path());
    std::fs::create_dir_all(&paths.slack_dir).unwrap();
    std::fs::write(&paths.config_file, "{}").unwrap();

    let mut registry = AppRegistry::load(&paths).await.unwrap();
    registry.save_local(deployed("A1", "T1", "acme")).await.unwrap();
    registry.remove_local_by_team_id("T1").await.unwrap();
    registry.clean_up().await;

    assert!(!paths.apps_dev_file.exists());
    assert!(paths.config_file.exists());
}
