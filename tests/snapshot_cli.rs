mod common;

use common::{devsnap, run_ok, stdout, write_file};
use serde_json::Value;
use std::fs;

#[test]
fn create_then_inspect_node_project() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let project = temp.path().join("webapp");
    write_file(&project, "package.json", r#"{"name":"webapp"}"#);
    write_file(&project, "README.md", "hello\n");
    write_file(&project, "node_modules/left-pad/index.js", "module.exports = 1;\n");

    let created = run_ok(devsnap(temp.path()).arg("create").arg(&project));
    assert!(stdout(&created).contains("environment: node >=18.0.0"));
    let snapshot = temp.path().join("webapp.devsnap");
    assert!(snapshot.is_file());

    let inspected = run_ok(
        devsnap(temp.path())
            .arg("inspect")
            .arg(&snapshot)
            .arg("--json"),
    );
    let meta: Value = serde_json::from_slice(&inspected.stdout).expect("parse inspect json");
    assert_eq!(meta["schema_version"], "1.0");
    assert_eq!(meta["name"], "webapp");
    assert_eq!(meta["commands"], serde_json::json!({}));
    let environments = meta["environments"].as_array().expect("environments");
    assert_eq!(environments.len(), 1);
    assert_eq!(environments[0]["type"], "node");
    assert_eq!(environments[0]["setup"], serde_json::json!(["npm install"]));
    assert_eq!(environments[0]["run"], "npm start");

    let text = run_ok(devsnap(temp.path()).arg("inspect").arg(&snapshot));
    assert!(stdout(&text).contains("  - node >=18.0.0"));
}

#[test]
fn empty_project_round_trips_through_start() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let project = temp.path().join("blank");
    fs::create_dir_all(&project).expect("create project dir");
    let snapshot = temp.path().join("blank.devsnap");

    run_ok(
        devsnap(temp.path())
            .arg("create")
            .arg(&project)
            .arg("--out")
            .arg(&snapshot),
    );
    let meta: Value = serde_json::from_slice(
        &run_ok(devsnap(temp.path()).arg("inspect").arg(&snapshot).arg("--json")).stdout,
    )
    .expect("parse inspect json");
    assert_eq!(meta["environments"], serde_json::json!([{"type": "generic"}]));

    // A stale sandbox is wiped before unpacking.
    write_file(temp.path(), ".devsnap_sandbox/stale.txt", "old");
    let started = run_ok(devsnap(temp.path()).arg("start").arg(&snapshot).arg("--yes"));
    assert!(stdout(&started).contains("Snapshot blank"));
    let sandbox = temp.path().join(".devsnap_sandbox");
    assert!(sandbox.join("metadata.json").is_file());
    assert!(!sandbox.join("stale.txt").exists());
    assert!(!sandbox.join(".env").exists());
}

#[test]
fn start_restores_files_into_configured_sandbox() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let project = temp.path().join("notes");
    write_file(&project, "docs/guide.md", "# Guide\n");
    write_file(&project, "scratch/tmp.txt", "ignored");
    write_file(
        temp.path(),
        "devsnap.json",
        r#"{"schema_version": 1, "sandbox_dir": "restore", "extra_ignores": ["scratch"]}"#,
    );

    run_ok(devsnap(temp.path()).arg("create").arg(&project));
    run_ok(
        devsnap(temp.path())
            .arg("start")
            .arg("notes.devsnap")
            .arg("-y"),
    );
    let restored = temp.path().join("restore");
    assert_eq!(
        fs::read_to_string(restored.join("docs/guide.md")).expect("read restored file"),
        "# Guide\n"
    );
    assert!(!restored.join("scratch").exists());
}

#[test]
fn missing_snapshot_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let output = devsnap(temp.path())
        .arg("inspect")
        .arg("absent.devsnap")
        .output()
        .expect("spawn devsnap");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}

#[test]
fn invalid_config_is_reported() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_file(temp.path(), "devsnap.json", r#"{"sandbox_dir": "../outside"}"#);
    let output = devsnap(temp.path())
        .arg("create")
        .output()
        .expect("spawn devsnap");
    assert!(!output.status.success());
}
