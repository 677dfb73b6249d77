//! Dependency resolution for heuristic detection.
//!
//! Imports found in loose source files are resolved to versions and written
//! as a `<ecosystem>.devpack` next to the sources, so the runner can install
//! them on the other side.
pub mod devpack;
pub mod imports;
pub mod versions;

use crate::scanner::extension_in;
use anyhow::Result;
use devpack::{Devpack, LATEST};
use imports::{GoImports, ImportExtractor, NodeImports, PythonImports};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use versions::ToolQuery;

/// Ecosystems whose imports can be inferred from raw source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ecosystem {
    Node,
    Go,
    Python,
}

impl Ecosystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Node => "node",
            Ecosystem::Go => "go",
            Ecosystem::Python => "python",
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Ecosystem::Node => &["js", "ts", "jsx", "tsx"],
            Ecosystem::Go => &["go"],
            Ecosystem::Python => &["py"],
        }
    }

    pub fn devpack_file_name(&self) -> String {
        format!("{}.devpack", self.as_str())
    }

    pub fn owns(&self, path: &Path) -> bool {
        extension_in(path, self.extensions())
    }

    fn extractor(&self) -> Box<dyn ImportExtractor> {
        match self {
            Ecosystem::Node => Box::new(NodeImports::default()),
            Ecosystem::Go => Box::new(GoImports::default()),
            Ecosystem::Python => Box::new(PythonImports::default()),
        }
    }
}

/// Devpack produced for one ecosystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenDevpack {
    pub file_name: String,
    pub dependencies: Vec<String>,
}

pub struct Resolver<'a> {
    root: &'a Path,
    query: &'a dyn ToolQuery,
}

impl<'a> Resolver<'a> {
    pub fn new(root: &'a Path, query: &'a dyn ToolQuery) -> Self {
        Self { root, query }
    }

    /// External imports across every file belonging to `ecosystem`.
    /// Unreadable files are skipped.
    pub fn external_imports(&self, files: &[PathBuf], ecosystem: Ecosystem) -> BTreeSet<String> {
        let extractor = ecosystem.extractor();
        let mut names = BTreeSet::new();
        for file in files.iter().filter(|file| ecosystem.owns(file)) {
            let Ok(bytes) = fs::read(file) else {
                tracing::debug!(path = %file.display(), "skipping unreadable source file");
                continue;
            };
            names.extend(extractor.extract(&String::from_utf8_lossy(&bytes)));
        }
        names
    }

    /// Best-effort version for one package; `latest` when nothing is found.
    pub fn resolve_version(&self, ecosystem: Ecosystem, package: &str) -> String {
        let resolved = match ecosystem {
            Ecosystem::Node => versions::node_version(self.root, self.query, package),
            Ecosystem::Go => versions::go_version(self.root, self.query, package),
            Ecosystem::Python => versions::python_version(self.root, self.query, package),
        };
        resolved.unwrap_or_else(|| LATEST.to_string())
    }

    /// Installed npm version of `package`, if any.
    pub fn installed_node_version(&self, package: &str) -> Option<String> {
        versions::node_version(self.root, self.query, package)
    }

    /// Resolve the ecosystem's imports and write its devpack at the project
    /// root. Returns `None` without writing when there are no external imports.
    pub fn write_devpack(
        &self,
        files: &[PathBuf],
        ecosystem: Ecosystem,
    ) -> Result<Option<WrittenDevpack>> {
        let names = self.external_imports(files, ecosystem);
        if names.is_empty() {
            return Ok(None);
        }
        let dependencies: BTreeMap<String, String> = names
            .iter()
            .map(|name| (name.clone(), self.resolve_version(ecosystem, name)))
            .collect();
        let file_name = ecosystem.devpack_file_name();
        Devpack::new(ecosystem.as_str(), dependencies).write(&self.root.join(&file_name))?;
        tracing::info!(
            ecosystem = ecosystem.as_str(),
            dependencies = names.len(),
            "wrote devpack"
        );
        Ok(Some(WrittenDevpack {
            file_name,
            dependencies: names.into_iter().collect(),
        }))
    }
}
