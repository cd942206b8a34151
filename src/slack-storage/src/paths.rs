//! File locations used by the CLI.
//!
//! Project state lives under `<project>/.slack/`:
//!
//! - `apps.json` - deployed apps per team
//! - `apps.dev.json` - local-run apps per team
//! - `config.json` - project configuration
//! - `cache/manifests.json` - manifest hashes per app
//!
//! User state lives under `~/.slack/` (or `$SLACK_CONFIG_DIR`):
//!
//! - `credentials.json` - stored logins per team

use std::path::{Path, PathBuf};

use slack_protocol::{ErrorCode, SlackError, SlackResult};
use tracing::debug;

pub const SLACK_DIR: &str = ".slack";
pub const APPS_FILE: &str = "apps.json";
pub const APPS_DEV_FILE: &str = "apps.dev.json";
pub const CONFIG_FILE: &str = "config.json";
pub const CACHE_DIR: &str = "cache";
pub const MANIFEST_CACHE_FILE: &str = "manifests.json";
pub const CREDENTIALS_FILE: &str = "credentials.json";

/// Paths inside one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    /// Project root directory.
    pub root: PathBuf,
    /// `.slack` directory.
    pub slack_dir: PathBuf,
    pub apps_file: PathBuf,
    pub apps_dev_file: PathBuf,
    pub config_file: PathBuf,
    pub cache_dir: PathBuf,
    pub manifest_cache_file: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let slack_dir = root.join(SLACK_DIR);
        let cache_dir = slack_dir.join(CACHE_DIR);
        Self {
            apps_file: slack_dir.join(APPS_FILE),
            apps_dev_file: slack_dir.join(APPS_DEV_FILE),
            config_file: slack_dir.join(CONFIG_FILE),
            manifest_cache_file: cache_dir.join(MANIFEST_CACHE_FILE),
            cache_dir,
            slack_dir,
            root,
        }
    }

    /// Paths for the current working directory.
    pub fn current_dir() -> SlackResult<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    /// True when `root` is the user's home directory.
    pub fn is_home_dir(&self) -> bool {
        dirs::home_dir().is_some_and(|home| same_path(&home, &self.root))
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Paths for user-level state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPaths {
    /// `~/.slack` or the `SLACK_CONFIG_DIR` override.
    pub config_dir: PathBuf,
    pub credentials_file: PathBuf,
}

impl SystemPaths {
    /// Create SystemPaths with automatic home directory detection.
    pub fn new() -> SlackResult<Self> {
        Ok(Self::from_root(slack_config_dir()?))
    }

    /// Create SystemPaths from a custom root directory.
    pub fn from_root(config_dir: PathBuf) -> Self {
        Self {
            credentials_file: config_dir.join(CREDENTIALS_FILE),
            config_dir,
        }
    }
}

/// Get the user-level Slack directory, honoring `SLACK_CONFIG_DIR`.
pub fn slack_config_dir() -> SlackResult<PathBuf> {
    if let Ok(val) = std::env::var("SLACK_CONFIG_DIR") {
        if !val.is_empty() {
            let path = PathBuf::from(val);
            debug!(path = %path.display(), "Using SLACK_CONFIG_DIR override");
            return Ok(path);
        }
    }

    let home = dirs::home_dir().ok_or_else(|| {
        SlackError::new(ErrorCode::AppDirectoryAccess)
            .with_cause(SlackError::msg("Could not determine the home directory"))
    })?;
    Ok(home.join(SLACK_DIR))
}

/// Writes `contents` and restricts the file to its owner.
pub(crate) async fn write_private(path: &Path, contents: &[u8]) -> SlackResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    }
    Ok(())
}

/// Reads a file, treating a missing file as `None`.
pub(crate) async fn read_optional(path: &Path) -> SlackResult<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_paths_structure() {
        let paths = ProjectPaths::new("/work/app");
        assert!(paths.slack_dir.ends_with(SLACK_DIR));
        assert!(paths.apps_file.ends_with(".slack/apps.json"));
        assert!(paths.apps_dev_file.ends_with(".slack/apps.dev.json"));
        assert!(paths.config_file.ends_with(".slack/config.json"));
        assert!(paths.manifest_cache_file.ends_with(".slack/cache/manifests.json"));
    }

    #[test]
    fn test_system_paths_from_root() {
        let paths = SystemPaths::from_root(PathBuf::from("/home/dev/.slack"));
        assert!(paths.credentials_file.ends_with("credentials.json"));
    }

    #[tokio::test]
    async fn test_write_private_sets_owner_only_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("secret.json");
        write_private(&path, b"{}").await.unwrap();
        assert_eq!(read_optional(&path).await.unwrap().as_deref(), Some(&b"{}"[..]));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        let missing = dir.path().join("missing.json");
        assert!(read_optional(&missing).await.unwrap().is_none());
    }
}
