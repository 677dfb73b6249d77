//! Secrets file handling for the restore session.
//!
//! Values are collected into a session environment handed to every spawned
//! command; the process environment itself is never modified.
use super::prompt::Prompter;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Make sure `path` lists every required name, load it, and ask for whatever
/// is still unset. Returns the session environment.
pub fn prepare_secrets(
    path: &Path,
    required: &[String],
    prompter: &dyn Prompter,
) -> Result<BTreeMap<String, String>> {
    let existing = if path.exists() {
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?
    } else {
        String::new()
    };
    let loaded = load_secrets(path)?;
    append_missing_keys(path, &existing, &loaded, required)?;

    let mut session: BTreeMap<String, String> = loaded
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .collect();

    for name in required {
        if session.contains_key(name) || is_set_in_process(name) {
            continue;
        }
        let answer = prompter.input(&format!("Enter value for {name}"));
        let answer = answer.trim();
        if answer.is_empty() {
            tracing::warn!(name = %name, "no value provided for required variable");
            continue;
        }
        session.insert(name.clone(), answer.to_string());
    }
    tracing::debug!(
        path = %path.display(),
        provided = session.len(),
        required = required.len(),
        "secrets loaded"
    );
    Ok(session)
}

fn is_set_in_process(name: &str) -> bool {
    env::var(name).is_ok_and(|value| !value.is_empty())
}

/// Create the file if needed and append `NAME=` for required names it lacks.
fn append_missing_keys(
    path: &Path,
    existing: &str,
    present: &BTreeMap<String, String>,
    required: &[String],
) -> Result<()> {
    let mut addition = String::new();
    if !existing.is_empty() && !existing.ends_with('\n') {
        addition.push('\n');
    }
    let mut missing = 0;
    for name in required.iter().filter(|name| !present.contains_key(*name)) {
        addition.push_str(name);
        addition.push_str("=\n");
        missing += 1;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {}", path.display()))?;
    if missing > 0 {
        file.write_all(addition.as_bytes())
            .with_context(|| format!("write {}", path.display()))?;
        println!("Added {missing} placeholder(s) to {}", path.display());
    }
    Ok(())
}

/// Entries of the secrets file at `path`; empty when the file is absent.
/// Lines the dotenv grammar rejects are skipped with a warning.
pub fn load_secrets(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let entries =
        dotenv::from_path_iter(path).with_context(|| format!("open {}", path.display()))?;
    let mut secrets = BTreeMap::new();
    for entry in entries {
        match entry {
            Ok((key, value)) => {
                secrets.insert(key, value);
            }
            Err(dotenv::Error::Io(err)) => {
                return Err(err).with_context(|| format!("read {}", path.display()));
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "skipping malformed secrets line");
            }
        }
    }
    Ok(secrets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedPrompter;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn loads_quotes_comments_and_blanks() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join(".env");
        fs::write(
            &path,
            "# comment\n\nA=1\nB = \"two words\"\nC='x'\nD=\nnot a pair\n=orphan\n",
        )
        .expect("write .env");
        let loaded = load_secrets(&path).expect("load secrets");
        assert_eq!(loaded["A"], "1");
        assert_eq!(loaded["B"], "two words");
        assert_eq!(loaded["C"], "x");
        assert_eq!(loaded["D"], "");
        assert_eq!(loaded.len(), 4);
        assert!(load_secrets(&temp.path().join("absent.env")).expect("load").is_empty());
    }

    #[test]
    fn export_prefix_and_trailing_comments_are_understood() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join(".env");
        fs::write(
            &path,
            "export DEVSNAP_EXPORTED_KEY=abc\nDEVSNAP_EXPORTED_DSN=postgres://x # local db\n",
        )
        .expect("write .env");
        let prompter = ScriptedPrompter::default();
        let required = names(&["DEVSNAP_EXPORTED_KEY", "DEVSNAP_EXPORTED_DSN"]);

        let session = prepare_secrets(&path, &required, &prompter).expect("prepare secrets");
        assert_eq!(session["DEVSNAP_EXPORTED_KEY"], "abc");
        assert_eq!(session["DEVSNAP_EXPORTED_DSN"], "postgres://x");
        assert!(prompter.questions.borrow().is_empty());
        // Both keys count as present, so no placeholders are appended.
        assert_eq!(
            fs::read_to_string(&path).expect("read .env"),
            "export DEVSNAP_EXPORTED_KEY=abc\nDEVSNAP_EXPORTED_DSN=postgres://x # local db\n"
        );
    }

    #[test]
    fn creates_file_with_placeholders_and_prompts_for_unset() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join(".env");
        let prompter = ScriptedPrompter::with_inputs(&["sk-live", ""]);
        let required = names(&["DEVSNAP_FIXTURE_TOKEN", "DEVSNAP_FIXTURE_DSN"]);

        let session = prepare_secrets(&path, &required, &prompter).expect("prepare secrets");
        assert_eq!(
            fs::read_to_string(&path).expect("read .env"),
            "DEVSNAP_FIXTURE_TOKEN=\nDEVSNAP_FIXTURE_DSN=\n"
        );
        assert_eq!(session.get("DEVSNAP_FIXTURE_TOKEN").map(String::as_str), Some("sk-live"));
        // A blank answer only warns.
        assert!(!session.contains_key("DEVSNAP_FIXTURE_DSN"));
        assert_eq!(prompter.questions.borrow().len(), 2);
    }

    #[test]
    fn existing_values_are_loaded_without_prompting() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join(".env");
        fs::write(&path, "DEVSNAP_FIXTURE_TOKEN=\"abc\"\nEXTRA=1").expect("write .env");
        let prompter = ScriptedPrompter::with_inputs(&["postgres://db"]);
        let required = names(&["DEVSNAP_FIXTURE_TOKEN", "DEVSNAP_FIXTURE_DSN"]);

        let session = prepare_secrets(&path, &required, &prompter).expect("prepare secrets");
        assert_eq!(session["DEVSNAP_FIXTURE_TOKEN"], "abc");
        assert_eq!(session["DEVSNAP_FIXTURE_DSN"], "postgres://db");
        assert_eq!(session["EXTRA"], "1");
        assert_eq!(
            fs::read_to_string(&path).expect("read .env"),
            "DEVSNAP_FIXTURE_TOKEN=\"abc\"\nEXTRA=1\nDEVSNAP_FIXTURE_DSN=\n"
        );
        assert_eq!(
            prompter.questions.borrow().as_slice(),
            ["Enter value for DEVSNAP_FIXTURE_DSN"]
        );
    }
}
