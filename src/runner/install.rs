//! Turning a devpack into installer invocations.
use super::exec::Invocation;
use crate::metadata::Runtime;
use crate::resolve::devpack::{Devpack, LATEST};

/// What installing a devpack amounts to for its ecosystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallPlan {
    Commands(Vec<Invocation>),
    /// The ecosystem's build step fetches dependencies itself.
    BuildToolManaged(Runtime),
    Unsupported(String),
}

/// Plan the installer commands for `devpack`. Untyped devpacks predate the
/// `type` field and are always npm dependency lists.
pub fn plan_install(devpack: &Devpack) -> InstallPlan {
    let kind = devpack.kind.as_deref().unwrap_or(Runtime::Node.as_str());
    let Some(runtime) = Runtime::from_tag(kind) else {
        return InstallPlan::Unsupported(kind.to_string());
    };
    let deps = &devpack.dependencies;
    match runtime {
        Runtime::Node | Runtime::TypeScript | Runtime::Angular => {
            let specs = deps
                .iter()
                .map(|(name, version)| pinned(name, version, "@"))
                .collect::<Vec<_>>();
            InstallPlan::Commands(batch("npm", "install", specs))
        }
        Runtime::Python => {
            let specs = deps
                .iter()
                .map(|(name, version)| pinned(name, version, "=="))
                .collect::<Vec<_>>();
            InstallPlan::Commands(batch("pip", "install", specs))
        }
        Runtime::Go => InstallPlan::Commands(
            deps.iter()
                .map(|(module, version)| {
                    let version = if is_unpinned(version) { LATEST } else { version.as_str() };
                    Invocation::new("go", vec!["get".to_string(), format!("{module}@{version}")])
                })
                .collect(),
        ),
        Runtime::Rust | Runtime::Java | Runtime::Php => InstallPlan::BuildToolManaged(runtime),
        Runtime::Generic => InstallPlan::Unsupported(kind.to_string()),
    }
}

fn batch(program: &str, subcommand: &str, specs: Vec<String>) -> Vec<Invocation> {
    if specs.is_empty() {
        return Vec::new();
    }
    let mut args = vec![subcommand.to_string()];
    args.extend(specs);
    vec![Invocation::new(program, args)]
}

fn pinned(name: &str, version: &str, separator: &str) -> String {
    if is_unpinned(version) {
        name.to_string()
    } else {
        format!("{name}{separator}{version}")
    }
}

fn is_unpinned(version: &str) -> bool {
    let version = version.trim();
    version.is_empty() || version == LATEST
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn devpack(kind: Option<&str>, deps: &[(&str, &str)]) -> Devpack {
        Devpack {
            kind: kind.map(str::to_string),
            dependencies: deps
                .iter()
                .map(|(name, version)| (name.to_string(), version.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn lines(plan: InstallPlan) -> Vec<String> {
        match plan {
            InstallPlan::Commands(commands) => commands.iter().map(ToString::to_string).collect(),
            other => panic!("expected commands, got {other:?}"),
        }
    }

    #[test]
    fn node_family_installs_in_one_invocation() {
        let pack = devpack(Some("node"), &[("zod", "3.22.4"), ("express", "latest")]);
        assert_eq!(lines(plan_install(&pack)), vec!["npm install express zod@3.22.4"]);
        let untyped = devpack(None, &[("@scope/ui", "1.0.0")]);
        assert_eq!(lines(plan_install(&untyped)), vec!["npm install @scope/ui@1.0.0"]);
    }

    #[test]
    fn go_installs_one_module_at_a_time() {
        let pack = devpack(
            Some("go"),
            &[("github.com/foo/bar", "latest"), ("github.com/acme/kit", "v0.3.1")],
        );
        assert_eq!(
            lines(plan_install(&pack)),
            vec![
                "go get github.com/acme/kit@v0.3.1",
                "go get github.com/foo/bar@latest",
            ]
        );
    }

    #[test]
    fn python_pins_with_double_equals() {
        let pack = devpack(Some("python"), &[("requests", "2.31.0"), ("flask", "")]);
        assert_eq!(lines(plan_install(&pack)), vec!["pip install flask requests==2.31.0"]);
    }

    #[test]
    fn build_tool_ecosystems_install_nothing() {
        for kind in ["rust", "java", "php"] {
            let plan = plan_install(&devpack(Some(kind), &[("serde", "1.0")]));
            assert!(matches!(plan, InstallPlan::BuildToolManaged(_)), "{kind}");
        }
        assert_eq!(
            plan_install(&devpack(Some("cobol"), &[])),
            InstallPlan::Unsupported("cobol".to_string())
        );
        assert_eq!(lines(plan_install(&devpack(Some("node"), &[]))), Vec::<String>::new());
    }
}
