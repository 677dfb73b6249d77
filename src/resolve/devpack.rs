//! Devpack descriptors: generated dependency lists for one ecosystem.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Version placeholder meaning "unconstrained".
pub const LATEST: &str = "latest";
pub const DEVPACK_SENTINEL_PREFIX: &str = "#DEVPACK:";
pub const LEGACY_DEVPACK_SENTINEL: &str = "#DEVPACK_INSTALL";
pub const LEGACY_DEVPACK_FILE: &str = "dependencies.devpack";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Devpack {
    /// Ecosystem tag; legacy `dependencies.devpack` files omit it.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl Devpack {
    pub fn new(kind: &str, dependencies: BTreeMap<String, String>) -> Self {
        Self {
            kind: Some(kind.to_string()),
            dependencies,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("read devpack {}", path.display()))?;
        serde_json::from_slice(&bytes).with_context(|| format!("parse devpack {}", path.display()))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("serialize devpack")?;
        fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))
    }
}

/// Setup-step sentinel that installs from `file_name`.
pub fn devpack_sentinel(file_name: &str) -> String {
    format!("{DEVPACK_SENTINEL_PREFIX}{file_name}")
}

/// Devpack file referenced by a setup command, if it is a sentinel.
pub fn devpack_reference(command: &str) -> Option<&str> {
    let command = command.trim();
    if command == LEGACY_DEVPACK_SENTINEL {
        return Some(LEGACY_DEVPACK_FILE);
    }
    command
        .strip_prefix(DEVPACK_SENTINEL_PREFIX)
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_resolve_to_file_names() {
        assert_eq!(devpack_reference("#DEVPACK:go.devpack"), Some("go.devpack"));
        assert_eq!(devpack_reference("#DEVPACK_INSTALL"), Some("dependencies.devpack"));
        assert_eq!(devpack_reference("#DEVPACK:"), None);
        assert_eq!(devpack_reference("npm install"), None);
        assert_eq!(devpack_sentinel("node.devpack"), "#DEVPACK:node.devpack");
    }

    #[test]
    fn writes_two_space_json_with_sorted_keys() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("node.devpack");
        let mut deps = BTreeMap::new();
        deps.insert("zod".to_string(), "3.22.4".to_string());
        deps.insert("axios".to_string(), LATEST.to_string());
        Devpack::new("node", deps).write(&path).expect("write devpack");

        let text = fs::read_to_string(&path).expect("read devpack");
        assert_eq!(
            text,
            "{\n  \"type\": \"node\",\n  \"dependencies\": {\n    \"axios\": \"latest\",\n    \"zod\": \"3.22.4\"\n  }\n}"
        );
        let loaded = Devpack::load(&path).expect("load devpack");
        assert_eq!(loaded.kind.as_deref(), Some("node"));
        assert_eq!(loaded.dependencies.len(), 2);
    }

    #[test]
    fn legacy_devpack_without_type_loads() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join(LEGACY_DEVPACK_FILE);
        fs::write(&path, r#"{"dependencies": {"express": "4.18.2"}}"#).expect("write");
        let loaded = Devpack::load(&path).expect("load devpack");
        assert_eq!(loaded.kind, None);
        assert_eq!(loaded.dependencies["express"], "4.18.2");
    }
}
