//! Project runtimes and their packaging hooks.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use slack_protocol::{ErrorCode, SlackError, SlackResult};
use tokio::process::Command;
use tracing::debug;
use walkdir::WalkDir;

/// Directories never copied into a package.
const ALWAYS_IGNORED: [&str; 2] = [".git", ".slack"];

/// Packaging hooks for one language runtime.
#[async_trait]
pub trait Runtime: Send + Sync {
    /// Display name, e.g. `Node.js`. Sent lowercased on upload.
    fn name(&self) -> &'static str;

    /// Directories left out of the package copy.
    fn ignore_directories(&self) -> &'static [&'static str];

    /// Copies the project at `src` into `dst`, ready for dependencies.
    async fn prepare_package(&self, src: &Path, dst: &Path) -> SlackResult<()> {
        copy_project(src, dst, self.ignore_directories()).await
    }

    /// Installs production dependencies inside the package copy.
    async fn install_project_dependencies(&self, dir: &Path) -> SlackResult<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Deno;

#[async_trait]
impl Runtime for Deno {
    fn name(&self) -> &'static str {
        "Deno"
    }

    fn ignore_directories(&self) -> &'static [&'static str] {
        &[]
    }

    async fn install_project_dependencies(&self, dir: &Path) -> SlackResult<()> {
        let entry = ["main.ts", "manifest.ts", "manifest.js"]
            .into_iter()
            .find(|name| dir.join(name).is_file());
        let Some(entry) = entry else {
            debug!(dir = %dir.display(), "No Deno entrypoint to cache");
            return Ok(());
        };
        run_install(dir, "deno", &["cache", entry]).await
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Node;

#[async_trait]
impl Runtime for Node {
    fn name(&self) -> &'static str {
        "Node.js"
    }

    fn ignore_directories(&self) -> &'static [&'static str] {
        &["node_modules"]
    }

    async fn install_project_dependencies(&self, dir: &Path) -> SlackResult<()> {
        run_install(dir, "npm", &["install", "--omit=dev", "--no-audit", "--no-fund"]).await
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Python;

#[async_trait]
impl Runtime for Python {
    fn name(&self) -> &'static str {
        "Python"
    }

    fn ignore_directories(&self) -> &'static [&'static str] {
        &[".venv", "venv", "__pycache__"]
    }

    async fn install_project_dependencies(&self, dir: &Path) -> SlackResult<()> {
        if !dir.join("requirements.txt").is_file() {
            return Ok(());
        }
        run_install(
            dir,
            "pip",
            &["install", "-r", "requirements.txt", "--target", "."],
        )
        .await
    }
}

/// Picks the runtime from files in the project root.
pub fn detect(root: &Path) -> Option<Arc<dyn Runtime>> {
    let has = |name: &str| root.join(name).is_file();
    if has("deno.json") || has("deno.jsonc") || has("import_map.json") {
        Some(Arc::new(Deno))
    } else if has("package.json") {
        Some(Arc::new(Node))
    } else if has("requirements.txt") || has("pyproject.toml") {
        Some(Arc::new(Python))
    } else {
        None
    }
}

/// Picks a runtime by name, e.g. from a `--runtime` setting.
pub fn from_name(name: &str) -> SlackResult<Arc<dyn Runtime>> {
    match name.to_ascii_lowercase().as_str() {
        "deno" => Ok(Arc::new(Deno)),
        "node" | "node.js" | "nodejs" => Ok(Arc::new(Node)),
        "python" => Ok(Arc::new(Python)),
        other => Err(SlackError::new(ErrorCode::RuntimeNotSupported)
            .with_message(format!("The runtime '{other}' is not supported by this CLI"))),
    }
}

/// Recursively copies `src` into `dst`, skipping VCS and CLI state plus
/// the runtime's own ignored directories at any depth.
pub async fn copy_project(src: &Path, dst: &Path, ignored: &[&str]) -> SlackResult<()> {
    let src = src.to_path_buf();
    let dst = dst.to_path_buf();
    let ignored: Vec<String> = ignored.iter().map(|d| d.to_string()).collect();
    tokio::task::spawn_blocking(move || copy_tree(&src, &dst, &ignored))
        .await
        .map_err(|e| {
            SlackError::new(ErrorCode::AppDeploy).with_message(format!("Copy task failed: {e}"))
        })?
}

fn copy_tree(src: &Path, dst: &Path, ignored: &[String]) -> SlackResult<()> {
    let walker = WalkDir::new(src).into_iter().filter_entry(|entry| {
        entry.depth() == 0
            || !entry.file_type().is_dir()
            || entry.file_name().to_str().is_none_or(|name| {
                !ALWAYS_IGNORED.contains(&name) && !ignored.iter().any(|d| d == name)
            })
    });
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry.path().strip_prefix(src).map_err(|e| {
            SlackError::new(ErrorCode::AppDeploy)
                .with_message(format!("Unexpected file outside the project: {e}"))
        })?;
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

async fn run_install(dir: &Path, program: &str, args: &[&str]) -> SlackResult<()> {
    debug!(dir = %dir.display(), program, ?args, "Installing project dependencies");
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            SlackError::new(ErrorCode::AppDeploy)
                .with_message(format!("Couldn't run `{program}` to install dependencies"))
                .with_cause(e)
        })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SlackError::new(ErrorCode::AppDeploy).with_message(format!(
            "`{program} {}` failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }
    Ok(())
}
