//! Manifest hash cache stored at `.slack/cache/manifests.json`.
//!
//! Each entry maps an app ID to the hash of the manifest last sent to the
//! backend for that app. Reconciliation compares it with a fresh hash to
//! detect local changes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use slack_protocol::{AppManifest, SlackResult};
use tracing::debug;

use crate::paths::{ProjectPaths, read_optional, write_private};

/// Lowercase hex SHA-256 of a manifest. Empty when unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestHash(String);

impl ManifestHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ManifestHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CacheEntry {
    #[serde(default)]
    hash: ManifestHash,
    #[serde(flatten)]
    extra: serde_json::Map<String, Value>,
}

/// Hashes `manifest` as canonical JSON: object keys sorted, no
/// whitespace.
pub fn new_manifest_hash(manifest: &AppManifest) -> SlackResult<ManifestHash> {
    let value = canonicalize(serde_json::to_value(manifest)?);
    let bytes = serde_json::to_vec(&value)?;
    Ok(ManifestHash(hex::encode(Sha256::digest(&bytes))))
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Reads and writes saved manifest hashes for one project.
#[derive(Debug, Clone)]
pub struct ManifestCache {
    path: std::path::PathBuf,
}

impl ManifestCache {
    pub fn new(paths: &ProjectPaths) -> Self {
        Self {
            path: paths.manifest_cache_file.clone(),
        }
    }

    /// The saved hash for `app_id`, empty when none was saved.
    pub async fn get_manifest_hash(&self, app_id: &str) -> SlackResult<ManifestHash> {
        let entries = self.read().await?;
        Ok(entries
            .get(app_id)
            .map(|entry| entry.hash.clone())
            .unwrap_or_default())
    }

    /// Saves `hash` for `app_id`, keeping entries for other apps.
    pub async fn set_manifest_hash(&self, app_id: &str, hash: &ManifestHash) -> SlackResult<()> {
        let mut entries = self.read().await?;
        entries.entry(app_id.to_string()).or_default().hash = hash.clone();
        let json = serde_json::to_vec_pretty(&entries)?;
        write_private(&self.path, &json).await?;
        debug!(app_id, hash = %hash, "Saved manifest hash");
        Ok(())
    }

    async fn read(&self) -> SlackResult<BTreeMap<String, CacheEntry>> {
        match read_optional(&self.path).await? {
            Some(bytes) if !bytes.iter().all(u8::is_ascii_whitespace) => {
                Ok(serde_json::from_slice(&bytes)?)
            }
            _ => Ok(BTreeMap::new()),
        }
    }
}
