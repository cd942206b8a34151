//! Manifest source resolution and manifest loading.

use std::path::Path;

use slack_protocol::{AppManifest, ErrorCode, ErrorDetail, SlackError, SlackResult};
use slack_storage::{BOLT_EXPERIMENT, ManifestSource, ProjectConfig};
use tracing::debug;

use crate::clients::Clients;

/// Manifest file names, in lookup order.
pub const MANIFEST_FILES: [&str; 3] = ["manifest.json", "manifest.yaml", "manifest.yml"];

/// Where the manifest of record lives for this project.
///
/// Always local unless the `bolt` experiment is on, either from
/// `--experiment` or the project's own experiment list.
pub async fn manifest_source(clients: &Clients) -> SlackResult<ManifestSource> {
    let project = ProjectConfig::read(&clients.project).await?;
    if !clients.config.with_experiment_on(BOLT_EXPERIMENT) && !project.has_experiment(BOLT_EXPERIMENT) {
        return Ok(ManifestSource::Local);
    }
    let source = project.manifest_source()?;
    debug!(source = %source, "Resolved manifest source");
    Ok(source)
}

/// Reads the first manifest file found in `root`.
pub async fn read_local_manifest(root: &Path) -> SlackResult<AppManifest> {
    for name in MANIFEST_FILES {
        let path = root.join(name);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(SlackError::new(ErrorCode::AppManifestAccess).with_cause(e)),
        };
        debug!(path = %path.display(), "Reading local manifest");
        let parsed = if name.ends_with(".json") {
            serde_json::from_slice(&bytes).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_slice(&bytes).map_err(|e| e.to_string())
        };
        return parsed.map_err(|message| {
            SlackError::new(ErrorCode::InvalidManifest).with_detail(ErrorDetail {
                code: "parse_error".to_string(),
                message,
                pointer: name.to_string(),
                remediation: String::new(),
            })
        });
    }
    Err(SlackError::new(ErrorCode::InvalidManifestSource).with_remediation(format!(
        "Add one of {} to {}",
        MANIFEST_FILES.join(", "),
        root.display()
    )))
}

/// The manifest stored on app settings.
pub async fn read_remote_manifest(
    clients: &Clients,
    token: &str,
    app_id: &str,
) -> SlackResult<AppManifest> {
    clients
        .api
        .export_app_manifest(token, app_id)
        .await
        .map_err(|e| SlackError::new(ErrorCode::AppManifestAccess).with_cause(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestClients;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_source_is_local_without_experiment() {
        let t = TestClients::new();
        t.write_project_file(".slack/config.json", r#"{"manifest":{"source":"remote"}}"#);
        assert_eq!(manifest_source(&t.clients()).await.unwrap(), ManifestSource::Local);
    }

    #[tokio::test]
    async fn test_source_follows_config_with_experiment() {
        let t = TestClients::new();
        t.write_project_file(
            ".slack/config.json",
            r#"{"experiments":["bolt"],"manifest":{"source":"remote"}}"#,
        );
        assert_eq!(manifest_source(&t.clients()).await.unwrap(), ManifestSource::Remote);
    }

    #[tokio::test]
    async fn test_source_defaults_to_local_with_experiment() {
        let mut t = TestClients::new();
        t.config.experiments.push(BOLT_EXPERIMENT.to_string());
        assert_eq!(manifest_source(&t.clients()).await.unwrap(), ManifestSource::Local);

        t.write_project_file(".slack/config.json", r#"{"manifest":{"source":"elsewhere"}}"#);
        let err = manifest_source(&t.clients()).await.unwrap_err();
        assert!(err.is(ErrorCode::ProjectConfigManifestSource));
    }

    #[tokio::test]
    async fn test_reads_yaml_manifest() {
        let t = TestClients::new();
        t.write_project_file(
            "manifest.yml",
            "display_information:\n  name: Tasks\nsettings:\n  function_runtime: remote\n",
        );
        let manifest = read_local_manifest(t.root()).await.unwrap();
        assert_eq!(manifest.display_information.name, "Tasks");
    }

    #[tokio::test]
    async fn test_missing_and_invalid_manifests() {
        let t = TestClients::new();
        let err = read_local_manifest(t.root()).await.unwrap_err();
        assert!(err.is(ErrorCode::InvalidManifestSource));

        t.write_project_file("manifest.json", "{ not json");
        let err = read_local_manifest(t.root()).await.unwrap_err();
        assert!(err.is(ErrorCode::InvalidManifest));
        assert_eq!(err.details()[0].pointer, "manifest.json");
    }
}
