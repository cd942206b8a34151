//! Project configuration stored at `.slack/config.json`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use slack_protocol::{ErrorCode, SlackError, SlackResult};
use tracing::debug;

use crate::paths::{ProjectPaths, read_optional, write_private};

/// Experiment that lets a project keep its manifest on the backend.
pub const BOLT_EXPERIMENT: &str = "bolt";

/// Where the manifest of record lives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestSource {
    /// The project's manifest file.
    #[default]
    Local,
    /// The copy stored on the backend.
    Remote,
}

impl ManifestSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ManifestSource::Local => "local",
            ManifestSource::Remote => "remote",
        }
    }

    pub fn is_local(self) -> bool {
        self == ManifestSource::Local
    }

    pub fn is_remote(self) -> bool {
        self == ManifestSource::Remote
    }
}

impl fmt::Display for ManifestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ManifestSource {
    type Err = SlackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(ManifestSource::Local),
            "remote" => Ok(ManifestSource::Remote),
            other => Err(SlackError::new(ErrorCode::ProjectConfigManifestSource)
                .with_remediation(format!(
                    "Replace \"{other}\" with \"local\" or \"remote\" in .slack/config.json"
                ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestConfig {
    /// Kept as a string so an invalid value is reported, not rejected on
    /// read.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Contents of `.slack/config.json`. Unknown keys survive a rewrite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<ManifestConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub experiments: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectConfig {
    /// Reads the project config; a missing file is an empty config.
    pub async fn read(paths: &ProjectPaths) -> SlackResult<Self> {
        match read_optional(&paths.config_file).await? {
            Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => {
                Ok(serde_json::from_slice(&bytes)?)
            }
            _ => Ok(Self::default()),
        }
    }

    pub async fn write(&self, paths: &ProjectPaths) -> SlackResult<()> {
        let json = serde_json::to_vec_pretty(self)?;
        write_private(&paths.config_file, &json).await?;
        debug!(path = %paths.config_file.display(), "Saved project config");
        Ok(())
    }

    /// The configured manifest source; unset reads as local.
    pub fn manifest_source(&self) -> SlackResult<ManifestSource> {
        match self.manifest.as_ref().map(|m| m.source.as_str()) {
            None | Some("") => Ok(ManifestSource::Local),
            Some(value) => value.parse(),
        }
    }

    pub fn has_experiment(&self, name: &str) -> bool {
        self.experiments.iter().any(|e| e == name)
    }
}

/// Persists `source` as the project's manifest source.
pub async fn set_manifest_source(paths: &ProjectPaths, source: ManifestSource) -> SlackResult<()> {
    let mut config = ProjectConfig::read(paths).await?;
    config.manifest.get_or_insert_with(ManifestConfig::default).source = source.as_str().to_string();
    config.write(paths).await
}
