//! Packaging a project into a deployable zip archive.
//!
//! The project is copied into a scratch directory, the runtime installs
//! production dependencies there, and the result is zipped into a
//! temporary archive. Both artifacts are removed when dropped, so every
//! exit path cleans up after itself.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use slack_protocol::{ErrorCode, SlackError, SlackResult};
use tempfile::TempPath;
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

use crate::runtime::Runtime;

/// Limit on installing a package's dependencies.
pub const DEPENDENCY_TIMEOUT: Duration = Duration::from_secs(5 * 60);

const STAGING_PREFIX: &str = "slack-cli-package-";

/// A packaged project. The archive is deleted when this is dropped.
#[derive(Debug)]
pub struct Package {
    pub archive: TempPath,
    /// Archive size in bytes.
    pub size: u64,
}

/// Copies, prepares and zips the project at `root`.
pub async fn package_project(
    runtime: &dyn Runtime,
    root: &Path,
    app_id: &str,
    timeout: Duration,
) -> SlackResult<Package> {
    let staging = tempfile::Builder::new().prefix(STAGING_PREFIX).tempdir()?;
    debug!(dir = %staging.path().display(), runtime = runtime.name(), "Packaging project");

    runtime
        .prepare_package(root, staging.path())
        .await
        .map_err(|e| {
            SlackError::new(ErrorCode::AppDeploy)
                .with_message("Couldn't prepare the app package for deployment")
                .with_cause(e)
        })?;

    match tokio::time::timeout(timeout, runtime.install_project_dependencies(staging.path())).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(SlackError::new(ErrorCode::PackageDependenciesTimeout).with_message(
                format!(
                    "Installing project dependencies took longer than {}s",
                    timeout.as_secs()
                ),
            ));
        }
    }

    let package = bundle_archive(staging.path().to_path_buf(), app_id.to_string()).await?;

    let staging_path = staging.path().to_path_buf();
    if let Err(e) = staging.close() {
        warn!(dir = %staging_path.display(), error = %e, "Failed to remove temporary directory");
    }
    Ok(package)
}

/// Zips every regular file under `dir`, named by its path relative to
/// `dir`. Directories get no entries of their own.
pub async fn bundle_archive(dir: PathBuf, app_id: String) -> SlackResult<Package> {
    tokio::task::spawn_blocking(move || write_archive(&dir, &app_id))
        .await
        .map_err(|e| {
            SlackError::new(ErrorCode::AppDeploy)
                .with_message(format!("Packaging task failed: {e}"))
        })?
}

fn write_archive(dir: &Path, app_id: &str) -> SlackResult<Package> {
    let (file, archive) = tempfile::Builder::new()
        .prefix(&format!("slack-cli-package.{app_id}."))
        .suffix(".zip")
        .tempfile()?
        .into_parts();
    debug!(path = %archive.display(), "Writing package archive");

    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut zip = zip::ZipWriter::new(file);
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(dir).map_err(|e| {
            SlackError::new(ErrorCode::AppDeploy).with_message(format!(
                "Unexpected file outside the package: {e}"
            ))
        })?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        zip.start_file(name, options).map_err(zip_error)?;
        let mut source = File::open(entry.path())?;
        std::io::copy(&mut source, &mut zip)?;
    }
    let file = zip.finish().map_err(zip_error)?;
    let size = file.metadata()?.len();

    debug!(path = %archive.display(), size, "Packaging complete");
    Ok(Package { archive, size })
}

fn zip_error(e: zip::result::ZipError) -> SlackError {
    SlackError::new(ErrorCode::AppDeploy).with_message(format!("Couldn't write the package archive: {e}"))
}
