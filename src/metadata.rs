//! Schema types for snapshot metadata.
//!
//! The metadata is the only state that crosses from `create` to `start`, so
//! its JSON shape is kept stable: absent optional fields are omitted rather
//! than written as `null`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const SCHEMA_VERSION: &str = "1.0";

/// Runtime families the detector knows how to emit and the runner knows how
/// to preflight and install for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runtime {
    Node,
    TypeScript,
    Angular,
    Python,
    Go,
    Rust,
    Java,
    Php,
    Generic,
}

impl Runtime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Runtime::Node => "node",
            Runtime::TypeScript => "typescript",
            Runtime::Angular => "angular",
            Runtime::Python => "python",
            Runtime::Go => "go",
            Runtime::Rust => "rust",
            Runtime::Java => "java",
            Runtime::Php => "php",
            Runtime::Generic => "generic",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        let runtime = match tag.trim() {
            "node" => Runtime::Node,
            "typescript" => Runtime::TypeScript,
            "angular" => Runtime::Angular,
            "python" => Runtime::Python,
            "go" => Runtime::Go,
            "rust" => Runtime::Rust,
            "java" => Runtime::Java,
            "php" => Runtime::Php,
            "generic" => Runtime::Generic,
            _ => return None,
        };
        Some(runtime)
    }

    /// Node, TypeScript and Angular projects share the npm toolchain.
    pub fn is_node_family(&self) -> bool {
        matches!(self, Runtime::Node | Runtime::TypeScript | Runtime::Angular)
    }

    /// Command whose success proves the runtime is installed on the host.
    pub fn probe_command(&self) -> Option<&'static [&'static str]> {
        match self {
            Runtime::Go => Some(&["go", "version"]),
            Runtime::Node | Runtime::TypeScript | Runtime::Angular => Some(&["node", "-v"]),
            Runtime::Python => Some(&["python", "--version"]),
            Runtime::Rust => Some(&["cargo", "--version"]),
            Runtime::Java => Some(&["mvn", "-version"]),
            Runtime::Php => Some(&["php", "-v"]),
            Runtime::Generic => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub setup: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
}

impl EnvironmentConfig {
    pub fn new(runtime: Runtime) -> Self {
        Self {
            kind: runtime.as_str().to_string(),
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn with_setup(mut self, command: &str) -> Self {
        self.setup.push(command.to_string());
        self
    }

    pub fn with_run(mut self, command: impl Into<String>) -> Self {
        self.run = Some(command.into());
        self
    }

    pub fn runtime(&self) -> Option<Runtime> {
        Runtime::from_tag(&self.kind)
    }

    /// Human-readable label such as `go 1.22`.
    pub fn label(&self) -> String {
        match self.version.as_deref() {
            Some(version) if !version.is_empty() => format!("{} {}", self.kind, version),
            _ => self.kind.clone(),
        }
    }
}

/// Global lifecycle commands kept for snapshots written before
/// per-environment commands existed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleCommands {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub setup: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
}

impl LifecycleCommands {
    pub fn is_empty(&self) -> bool {
        self.setup.is_empty() && self.run.is_none() && self.test.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub schema_version: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub created_at: String,
    #[serde(default)]
    pub environments: Vec<EnvironmentConfig>,
    #[serde(default)]
    pub commands: LifecycleCommands,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_vars: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manifest: Vec<String>,
}

impl SnapshotMetadata {
    pub fn new(
        name: &str,
        created_at: String,
        environments: Vec<EnvironmentConfig>,
        commands: LifecycleCommands,
        required_vars: Vec<String>,
    ) -> Self {
        let mut meta = Self {
            schema_version: SCHEMA_VERSION.to_string(),
            name: name.to_string(),
            description: None,
            author: None,
            tags: Vec::new(),
            created_at,
            environments,
            commands,
            required_vars,
            manifest: Vec::new(),
        };
        meta.normalize();
        meta
    }

    /// Re-establish the schema invariants: at least one environment, unique
    /// tags and unique required variables in first-seen order.
    ///
    /// Legacy snapshots that only carry global `commands` keep an empty
    /// environment list so the runner replays them through the legacy path.
    pub fn normalize(&mut self) {
        if self.environments.is_empty() && self.commands.is_empty() {
            self.environments.push(EnvironmentConfig::new(Runtime::Generic));
        }
        dedup_in_order(&mut self.required_vars);
        dedup_in_order(&mut self.tags);
    }
}

/// Drop repeated entries, keeping the first occurrence of each.
pub fn dedup_in_order(values: &mut Vec<String>) {
    let mut seen = BTreeSet::new();
    values.retain(|value| seen.insert(value.clone()));
}
