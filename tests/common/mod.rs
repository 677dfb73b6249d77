//! Shared test infrastructure for integration tests.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

/// Command for the built `devsnap` binary, run from `cwd` with logging quiet.
pub fn devsnap(cwd: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_devsnap"));
    command.current_dir(cwd).env("DEVSNAP_LOG", "error");
    command
}

/// Run `command` and panic with its output unless it succeeded.
pub fn run_ok(command: &mut Command) -> Output {
    let output = command.output().expect("spawn devsnap");
    assert!(
        output.status.success(),
        "devsnap failed with {}\nstdout:\n{}\nstderr:\n{}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

pub fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(&path, contents).expect("write fixture file");
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}
