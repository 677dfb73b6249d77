use std::path::Path;

const SUMMARY_NAMES: usize = 3;

/// Short human summary of a dependency list: the first few names, then `...`.
pub fn summarize_deps(names: &[String]) -> String {
    let mut summary = names
        .iter()
        .take(SUMMARY_NAMES)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if names.len() > SUMMARY_NAMES {
        summary.push_str(", ...");
    }
    summary
}

pub fn display_path(path: &Path, base: Option<&Path>) -> String {
    if let Some(base) = base {
        if let Ok(relative) = path.strip_prefix(base) {
            return relative.display().to_string();
        }
    }
    path.display().to_string()
}

/// Archive entry name for `path`: root-relative with forward slashes.
pub fn archive_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn summary_truncates_after_three() {
        assert_eq!(summarize_deps(&[]), "");
        assert_eq!(summarize_deps(&names(&["a", "b"])), "a, b");
        assert_eq!(summarize_deps(&names(&["a", "b", "c"])), "a, b, c");
        assert_eq!(summarize_deps(&names(&["a", "b", "c", "d"])), "a, b, c, ...");
    }

    #[test]
    fn archive_names_use_forward_slashes() {
        let root = Path::new("/work/app");
        assert_eq!(
            archive_name(root, &root.join("src").join("main.go")),
            "src/main.go"
        );
        assert_eq!(display_path(&root.join("a.txt"), Some(root)), "a.txt");
        assert_eq!(display_path(Path::new("/elsewhere"), Some(root)), "/elsewhere");
    }
}
