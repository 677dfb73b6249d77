//! Lexical import extraction.
//!
//! These extractors pattern-match source text; they are not parsers. Each one
//! reports only names that look like external packages for its ecosystem.
use regex::Regex;
use std::collections::BTreeSet;

/// Extract external package names from one source file's text.
pub trait ImportExtractor {
    fn extract(&self, source: &str) -> BTreeSet<String>;
}

const NODE_BUILTINS: &[&str] = &[
    "fs",
    "path",
    "os",
    "http",
    "https",
    "crypto",
    "util",
    "events",
    "child_process",
];

const NODE_LOCAL_PREFIXES: &[&str] = &["./", "../", "/", "~/", "@/"];

const PYTHON_STDLIB: &[&str] = &[
    "os",
    "sys",
    "math",
    "json",
    "time",
    "random",
    "datetime",
    "re",
    "subprocess",
    "pathlib",
    "typing",
    "collections",
    "itertools",
    "functools",
    "logging",
    "threading",
    "multiprocessing",
    "socket",
    "email",
    "argparse",
    "shutil",
    "glob",
    "pickle",
    "copy",
    "hashlib",
    "base64",
    "uuid",
    "csv",
    "io",
];

/// `require('x')`, `from 'x'` and `import('x')` call shapes.
pub struct NodeImports {
    patterns: Vec<Regex>,
}

impl Default for NodeImports {
    fn default() -> Self {
        let patterns = [
            r#"require\(\s*['"]([^'"]+)['"]\s*\)"#,
            r#"from\s+['"]([^'"]+)['"]"#,
            r#"import\(\s*['"]([^'"]+)['"]\s*\)"#,
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("regex for node import shapes"))
        .collect();
        Self { patterns }
    }
}

impl ImportExtractor for NodeImports {
    fn extract(&self, source: &str) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for pattern in &self.patterns {
            for cap in pattern.captures_iter(source) {
                let spec = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
                if let Some(name) = node_package_name(spec) {
                    names.insert(name);
                }
            }
        }
        names
    }
}

/// Collapse an import specifier to its installable package name, or `None`
/// for local paths and built-in modules.
pub fn node_package_name(spec: &str) -> Option<String> {
    let spec = spec.trim();
    if spec.is_empty()
        || spec.starts_with("node:")
        || NODE_LOCAL_PREFIXES
            .iter()
            .any(|prefix| spec.starts_with(prefix))
    {
        return None;
    }
    let name = if spec.starts_with('@') {
        let mut parts = spec.splitn(3, '/');
        match (parts.next(), parts.next()) {
            (Some(scope), Some(package)) if !package.is_empty() => format!("{scope}/{package}"),
            _ => spec.to_string(),
        }
    } else {
        spec.split('/').next().unwrap_or(spec).to_string()
    };
    if NODE_BUILTINS.contains(&name.as_str()) {
        return None;
    }
    Some(name)
}

/// Single-line and parenthesized Go import declarations.
pub struct GoImports {
    pattern: Regex,
}

impl Default for GoImports {
    fn default() -> Self {
        let pattern = Regex::new(
            r#"(?m)^\s*import\s*\(([^)]*)\)|^\s*import\s+(?:[A-Za-z_.][A-Za-z0-9_]*\s+)?"([^"]+)""#,
        )
        .expect("regex for go import declarations");
        Self { pattern }
    }
}

impl ImportExtractor for GoImports {
    fn extract(&self, source: &str) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for cap in self.pattern.captures_iter(source) {
            if let Some(single) = cap.get(2) {
                insert_go_module(&mut names, single.as_str());
            } else if let Some(block) = cap.get(1) {
                for line in block.as_str().lines() {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with("//") {
                        continue;
                    }
                    let (Some(start), Some(end)) = (line.find('"'), line.rfind('"')) else {
                        continue;
                    };
                    if end > start {
                        insert_go_module(&mut names, &line[start + 1..end]);
                    }
                }
            }
        }
        names
    }
}

fn insert_go_module(names: &mut BTreeSet<String>, path: &str) {
    if is_go_external(path) {
        names.insert(path.to_string());
    }
}

/// Domain-qualified module paths (`github.com/...`) are external; anything
/// else (`fmt`, `net/http`) is treated as standard library.
pub fn is_go_external(path: &str) -> bool {
    path.split('/')
        .next()
        .map(|first| first.contains('.'))
        .unwrap_or(false)
}

/// Line-start `import X` and `from X import ...` statements.
pub struct PythonImports {
    pattern: Regex,
}

impl Default for PythonImports {
    fn default() -> Self {
        let pattern =
            Regex::new(r"(?m)^(?:import\s+([A-Za-z0-9_]+)|from\s+([A-Za-z0-9_]+)\s+import)")
                .expect("regex for python import statements");
        Self { pattern }
    }
}

impl ImportExtractor for PythonImports {
    fn extract(&self, source: &str) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for cap in self.pattern.captures_iter(source) {
            let Some(module) = cap.get(1).or_else(|| cap.get(2)) else {
                continue;
            };
            let module = module.as_str();
            if !PYTHON_STDLIB.contains(&module) {
                names.insert(module.to_string());
            }
        }
        names
    }
}
