//! Project detection.
//!
//! Manifest files at the project root are checked first, in a fixed priority
//! order; heuristic rules then fill in languages no manifest claimed by reading
//! loose source files. Rules are additive, so polyglot trees yield several
//! environments in detection order.
mod heuristic;
mod secrets;

use crate::metadata::{EnvironmentConfig, LifecycleCommands, Runtime};
use crate::resolve::versions::ToolQuery;
use crate::resolve::{Resolver, WrittenDevpack};
use crate::scanner::{collect_code_files, IgnoreSet};
use anyhow::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

use secrets::scan_required_vars;

const GO_FALLBACK_VERSION: &str = "1.21";

/// Everything detection learned about a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub name: String,
    pub environments: Vec<EnvironmentConfig>,
    pub commands: LifecycleCommands,
    pub required_vars: Vec<String>,
    pub devpacks: Vec<WrittenDevpack>,
}

/// Classify the project rooted at `root`.
///
/// Devpack files for heuristic environments are written into `root`, so
/// callers that archive the tree should scan it after detection.
pub fn detect_project(root: &Path, ignores: &IgnoreSet, query: &dyn ToolQuery) -> Result<Detection> {
    let code_files = collect_code_files(root, ignores);
    let required_vars = scan_required_vars(&code_files);
    let resolver = Resolver::new(root, query);
    let go_directive =
        Regex::new(r"(?m)^\s*go\s+([0-9]+\.[0-9]+)").expect("regex for go directive");

    let mut environments = manifest_environments(root, &resolver, &go_directive);
    let heuristic = heuristic::heuristic_environments(root, &code_files, &environments, &resolver)?;
    environments.extend(heuristic.environments);

    if environments.is_empty() {
        environments.push(EnvironmentConfig::new(Runtime::Generic));
    }

    tracing::debug!(
        root = %root.display(),
        code_files = code_files.len(),
        environments = environments.len(),
        "detection complete"
    );

    Ok(Detection {
        name: project_name(root),
        environments,
        commands: LifecycleCommands::default(),
        required_vars,
        devpacks: heuristic.devpacks,
    })
}

fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "snapshot".to_string())
}

/// Environments implied by well-known manifest files at the root.
fn manifest_environments(
    root: &Path,
    resolver: &Resolver<'_>,
    go_directive: &Regex,
) -> Vec<EnvironmentConfig> {
    let mut environments = Vec::new();

    if exists(root, "angular.json") {
        let version = resolver
            .installed_node_version("@angular/core")
            .unwrap_or_else(|| ">=14.0.0".to_string());
        environments.push(
            EnvironmentConfig::new(Runtime::Angular)
                .with_version(&version)
                .with_setup("npm install")
                .with_run("npm start"),
        );
    }

    // Angular already implies a Node toolchain and the same npm commands.
    let has_angular = environments
        .iter()
        .any(|env| env.runtime() == Some(Runtime::Angular));
    if !has_angular && exists(root, "package.json") {
        let runtime = if exists(root, "tsconfig.json") {
            Runtime::TypeScript
        } else {
            Runtime::Node
        };
        environments.push(
            EnvironmentConfig::new(runtime)
                .with_version(">=18.0.0")
                .with_setup("npm install")
                .with_run("npm start"),
        );
    }

    if exists(root, "composer.json") {
        let run = if exists(root, "public/index.php") {
            "php -S localhost:8000 -t public"
        } else if exists(root, "artisan") {
            "php artisan serve"
        } else {
            "php -S localhost:8000"
        };
        environments.push(
            EnvironmentConfig::new(Runtime::Php)
                .with_version(">=8.0")
                .with_setup("composer install")
                .with_run(run),
        );
    }

    if exists(root, "go.mod") {
        let version = go_mod_version(&root.join("go.mod"), go_directive)
            .unwrap_or_else(|| GO_FALLBACK_VERSION.to_string());
        environments.push(
            EnvironmentConfig::new(Runtime::Go)
                .with_version(&version)
                .with_setup("go mod download")
                .with_run("go run ."),
        );
    }

    if exists(root, "Cargo.toml") {
        environments.push(
            EnvironmentConfig::new(Runtime::Rust)
                .with_version("1.70.0")
                .with_setup("cargo build")
                .with_run("cargo run"),
        );
    }

    if exists(root, "pom.xml") {
        let spring_boot = exists(root, "src/main/resources/application.properties")
            || exists(root, "src/main/resources/application.yml");
        let run = if spring_boot {
            "mvn spring-boot:run"
        } else {
            "java -jar target/app.jar"
        };
        environments.push(
            EnvironmentConfig::new(Runtime::Java)
                .with_version("17")
                .with_setup("mvn clean install")
                .with_run(run),
        );
    }

    environments
}

/// `<major>.<minor>` from the `go` directive of a `go.mod` file.
fn go_mod_version(path: &Path, directive: &Regex) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    directive
        .captures(&content)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

fn exists(root: &Path, rel: &str) -> bool {
    root.join(rel).exists()
}

#[cfg(test)]
#[path = "detect_tests.rs"]
mod tests;
