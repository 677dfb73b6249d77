//! Workspace configuration for devsnap.
//!
//! An optional `devsnap.json` in the working directory overrides the sandbox
//! location, the secrets file name, and adds directory names to the scan
//! ignore set. A missing file means defaults.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "devsnap.json";
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_SANDBOX_DIR: &str = ".devsnap_sandbox";
pub const DEFAULT_SECRETS_FILE: &str = ".env";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default = "default_sandbox_dir")]
    pub sandbox_dir: String,
    #[serde(default = "default_secrets_file")]
    pub secrets_file: String,
    #[serde(default)]
    pub extra_ignores: Vec<String>,
}

fn default_schema_version() -> u32 {
    CONFIG_SCHEMA_VERSION
}

fn default_sandbox_dir() -> String {
    DEFAULT_SANDBOX_DIR.to_string()
}

fn default_secrets_file() -> String {
    DEFAULT_SECRETS_FILE.to_string()
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            sandbox_dir: default_sandbox_dir(),
            secrets_file: default_secrets_file(),
            extra_ignores: Vec::new(),
        }
    }
}

/// Load `devsnap.json` from `dir`, falling back to defaults when absent.
pub fn load_config(dir: &Path) -> Result<SnapConfig> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.is_file() {
        return Ok(SnapConfig::default());
    }
    let bytes = fs::read(&path).with_context(|| format!("read config {}", path.display()))?;
    let config: SnapConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config {}", path.display()))?;
    validate_config(&config)?;
    tracing::debug!(path = %path.display(), "loaded devsnap config");
    Ok(config)
}

/// Validate schema version and path-like fields.
pub fn validate_config(config: &SnapConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported devsnap config schema_version {}",
            config.schema_version
        ));
    }
    validate_relative_path(&config.sandbox_dir, "sandbox_dir")?;
    validate_relative_path(&config.secrets_file, "secrets_file")?;
    for name in &config.extra_ignores {
        if name.trim().is_empty() || name.contains('/') || name.contains('\\') {
            return Err(anyhow!(
                "extra_ignores entries must be plain directory names (got {name:?})"
            ));
        }
    }
    Ok(())
}

fn validate_relative_path(rel: &str, label: &str) -> Result<()> {
    if rel.trim().is_empty() {
        return Err(anyhow!("{label} must be non-empty"));
    }
    let path = Path::new(rel);
    if path.is_absolute() || has_parent_components(path) {
        return Err(anyhow!(
            "{label} must be a relative path without '..' (got {rel:?})"
        ));
    }
    Ok(())
}

fn has_parent_components(path: &Path) -> bool {
    path.components()
        .any(|component| matches!(component, std::path::Component::ParentDir))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
