//! Heuristic ("Sherlock") detection from loose source files.
//!
//! Only languages that no manifest rule claimed are considered. Python's
//! `requirements.txt` rule lives here too because it competes with the
//! heuristic Python rule rather than with the other manifests.
use super::exists;
use crate::metadata::{EnvironmentConfig, Runtime};
use crate::resolve::devpack::devpack_sentinel;
use crate::resolve::{Ecosystem, Resolver, WrittenDevpack};
use crate::util::{archive_name, summarize_deps};
use anyhow::Result;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub(super) struct HeuristicOutcome {
    pub(super) environments: Vec<EnvironmentConfig>,
    pub(super) devpacks: Vec<WrittenDevpack>,
}

pub(super) fn heuristic_environments(
    root: &Path,
    code_files: &[PathBuf],
    detected: &[EnvironmentConfig],
    resolver: &Resolver<'_>,
) -> Result<HeuristicOutcome> {
    let claimed = |predicate: fn(Runtime) -> bool| {
        detected
            .iter()
            .filter_map(EnvironmentConfig::runtime)
            .any(predicate)
    };
    let mut outcome = HeuristicOutcome::default();

    if !claimed(|runtime| runtime == Runtime::Go) {
        if let Some(env) = sniff(root, code_files, Ecosystem::Go, resolver, &mut outcome)? {
            outcome.environments.push(env.with_run("go run ."));
        }
    }

    if !claimed(|runtime| runtime.is_node_family()) {
        if let Some(env) = sniff(root, code_files, Ecosystem::Node, resolver, &mut outcome)? {
            let run = if exists(root, "index.js") {
                "node index.js".to_string()
            } else {
                format!("node {}", first_source(root, code_files, Ecosystem::Node))
            };
            outcome.environments.push(env.with_run(run));
        }
    }

    if !claimed(|runtime| runtime == Runtime::Python) {
        if exists(root, "requirements.txt") {
            let run = if exists(root, "manage.py") {
                "python manage.py runserver"
            } else {
                "python main.py"
            };
            outcome.environments.push(
                EnvironmentConfig::new(Runtime::Python)
                    .with_version(">=3.9")
                    .with_setup("pip install -r requirements.txt")
                    .with_run(run),
            );
        } else if let Some(env) =
            sniff(root, code_files, Ecosystem::Python, resolver, &mut outcome)?
        {
            let run = if exists(root, "main.py") {
                "python main.py".to_string()
            } else if exists(root, "app.py") {
                "python app.py".to_string()
            } else {
                format!(
                    "python {}",
                    first_source(root, code_files, Ecosystem::Python)
                )
            };
            outcome.environments.push(env.with_run(run));
        }
    }

    Ok(outcome)
}

/// Synthesize an environment for `ecosystem` when any of its source files
/// exist, attaching a devpack install step when external imports were found.
fn sniff(
    root: &Path,
    code_files: &[PathBuf],
    ecosystem: Ecosystem,
    resolver: &Resolver<'_>,
    outcome: &mut HeuristicOutcome,
) -> Result<Option<EnvironmentConfig>> {
    if !code_files.iter().any(|file| ecosystem.owns(file)) {
        return Ok(None);
    }
    let (runtime, version) = match ecosystem {
        Ecosystem::Go => (Runtime::Go, "1.21"),
        Ecosystem::Node => (Runtime::Node, ">=18.0.0"),
        Ecosystem::Python => (Runtime::Python, "3.10"),
    };
    let mut env = EnvironmentConfig::new(runtime).with_version(version);
    if let Some(devpack) = resolver.write_devpack(code_files, ecosystem)? {
        tracing::info!(
            root = %root.display(),
            ecosystem = ecosystem.as_str(),
            dependencies = %summarize_deps(&devpack.dependencies),
            "inferred dependencies from source imports"
        );
        env = env.with_setup(&devpack_sentinel(&devpack.file_name));
        outcome.devpacks.push(devpack);
    }
    Ok(Some(env))
}

fn first_source(root: &Path, code_files: &[PathBuf], ecosystem: Ecosystem) -> String {
    code_files
        .iter()
        .find(|file| ecosystem.owns(file))
        .map(|file| archive_name(root, file))
        .unwrap_or_default()
}
