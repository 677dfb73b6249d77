//! Best-effort version lookups against locally installed toolchains.
//!
//! Every lookup degrades to `None` on any failure; callers substitute
//! [`LATEST`](super::devpack::LATEST).
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

/// Capability for running a read-only tool query and capturing its stdout.
pub trait ToolQuery {
    /// Run `program args` in `cwd`; `Some(stdout)` only when it exits successfully.
    fn stdout(&self, cwd: &Path, program: &str, args: &[&str]) -> Option<String>;
}

/// Queries the host toolchain found on `PATH`.
pub struct SystemToolQuery;

impl ToolQuery for SystemToolQuery {
    fn stdout(&self, cwd: &Path, program: &str, args: &[&str]) -> Option<String> {
        let resolved = which::which(program).ok()?;
        let start = Instant::now();
        let output = Command::new(resolved)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .ok()?;
        tracing::debug!(
            program,
            elapsed_ms = start.elapsed().as_millis() as u64,
            status = %output.status,
            "tool query complete"
        );
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[derive(Deserialize)]
struct PackageJson {
    #[serde(default)]
    version: Option<String>,
}

#[derive(Deserialize)]
struct NpmList {
    #[serde(default)]
    dependencies: BTreeMap<String, PackageJson>,
}

/// Installed version of an npm package: the local `node_modules` copy first,
/// then `npm list`.
pub fn node_version(root: &Path, query: &dyn ToolQuery, package: &str) -> Option<String> {
    let manifest = root.join("node_modules").join(package).join("package.json");
    if let Ok(bytes) = fs::read(&manifest) {
        if let Ok(pkg) = serde_json::from_slice::<PackageJson>(&bytes) {
            if let Some(version) = non_empty(pkg.version) {
                return Some(version);
            }
        }
    }
    let stdout = query.stdout(root, "npm", &["list", package, "--json", "--depth=0"])?;
    let listing: NpmList = serde_json::from_str(&stdout).ok()?;
    listing
        .dependencies
        .get(package)
        .and_then(|entry| non_empty(entry.version.clone()))
}

/// Latest version of a Go module according to the local module resolver.
pub fn go_version(root: &Path, query: &dyn ToolQuery, module: &str) -> Option<String> {
    let target = format!("{module}@latest");
    let stdout = query.stdout(root, "go", &["list", "-m", "-f", "{{.Version}}", &target])?;
    non_empty(Some(stdout.trim().to_string()))
}

/// Installed version of a Python distribution according to `pip show`.
pub fn python_version(root: &Path, query: &dyn ToolQuery, package: &str) -> Option<String> {
    let stdout = query.stdout(root, "pip", &["show", package])?;
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("Version:"))
        .and_then(|version| non_empty(Some(version.trim().to_string())))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
