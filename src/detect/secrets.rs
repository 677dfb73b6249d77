//! Required-secret discovery.
//!
//! Source files are searched for the conventional "read an environment
//! variable" call shapes of Node, Go and Python.
use crate::metadata::dedup_in_order;
use regex::Regex;
use std::fs;
use std::path::PathBuf;

/// Names every runtime provides itself; never worth prompting for.
const NOISE_VARS: &[&str] = &["NODE_ENV", "PATH"];

struct EnvPatterns {
    patterns: Vec<Regex>,
}

impl EnvPatterns {
    fn compile() -> Self {
        let patterns = [
            r#"process\.env\.([A-Z_0-9]+)|process\.env\[\s*['"]([A-Z_0-9]+)['"]\s*\]"#,
            r#"os\.(?:Getenv|LookupEnv)\(\s*"([A-Z_0-9]+)"\s*\)"#,
            r#"os\.(?:environ\.get\(|getenv\(|environ\[)\s*["']([A-Z_0-9]+)["']"#,
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("regex for environment variable reads"))
        .collect();
        Self { patterns }
    }

    /// Variable names in `source`, ordered by where they appear.
    fn scan(&self, source: &str) -> Vec<String> {
        let mut found: Vec<(usize, String)> = Vec::new();
        for pattern in &self.patterns {
            for cap in pattern.captures_iter(source) {
                let Some(name) = cap.iter().skip(1).flatten().next() else {
                    continue;
                };
                found.push((name.start(), name.as_str().to_string()));
            }
        }
        found.sort_by_key(|(offset, _)| *offset);
        found.into_iter().map(|(_, name)| name).collect()
    }
}

/// Required variable names across `files`, in discovery order without
/// duplicates. Unreadable files are skipped.
pub fn scan_required_vars(files: &[PathBuf]) -> Vec<String> {
    let patterns = EnvPatterns::compile();
    let mut vars = Vec::new();
    for file in files {
        let Ok(bytes) = fs::read(file) else {
            continue;
        };
        vars.extend(patterns.scan(&String::from_utf8_lossy(&bytes)));
    }
    vars.retain(|name| !NOISE_VARS.contains(&name.as_str()));
    dedup_in_order(&mut vars);
    vars
}
