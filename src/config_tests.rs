use super::{load_config, validate_config, SnapConfig, CONFIG_FILE_NAME};

fn write_config(dir: &std::path::Path, contents: &str) {
    std::fs::write(dir.join(CONFIG_FILE_NAME), contents.as_bytes()).expect("write config");
}

#[test]
fn missing_config_yields_defaults() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let config = load_config(temp.path()).expect("load defaults");
    assert_eq!(config, SnapConfig::default());
    assert_eq!(config.sandbox_dir, ".devsnap_sandbox");
    assert_eq!(config.secrets_file, ".env");
}

#[test]
fn partial_config_fills_remaining_defaults() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_config(temp.path(), r#"{"extra_ignores": ["target", ".venv"]}"#);
    let config = load_config(temp.path()).expect("load config");
    assert_eq!(config.extra_ignores, vec!["target", ".venv"]);
    assert_eq!(config.sandbox_dir, ".devsnap_sandbox");
}

#[test]
fn rejects_escaping_sandbox_dir() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_config(temp.path(), r#"{"sandbox_dir": "../elsewhere"}"#);
    let err = load_config(temp.path()).expect_err("escaping path rejected");
    assert!(err.to_string().contains("sandbox_dir"), "{err}");
}

#[test]
fn rejects_unknown_schema_version() {
    let config = SnapConfig {
        schema_version: 7,
        ..SnapConfig::default()
    };
    let err = validate_config(&config).expect_err("schema version rejected");
    assert!(err.to_string().contains("schema_version"));
}

#[test]
fn rejects_nested_ignore_names() {
    let config = SnapConfig {
        extra_ignores: vec!["a/b".to_string()],
        ..SnapConfig::default()
    };
    assert!(validate_config(&config).is_err());
}
