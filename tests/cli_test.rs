// tests/cli_test.rs

use clap::Parser;
use ecs_deploy::cli::{load_config, run_environment, run_priority, Args, OutputFormat};
use ecs_deploy::config::DeployConfig;
use ecs_deploy::DeployError;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const RULES: &str = r#"{"Rules":[
  {"RuleArn":"arn:1","Priority":"1","Conditions":[],"Actions":[],"IsDefault":false},
  {"RuleArn":"arn:3","Priority":"3","Conditions":[],"Actions":[],"IsDefault":false},
  {"RuleArn":"arn:d","Priority":"default","Conditions":[],"Actions":[],"IsDefault":true}
]}"#;

fn no_env() -> HashMap<String, String> {
    HashMap::new()
}

fn manifest_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_priority_from_stdin() {
    let mut out = Vec::new();
    run_priority(None, RULES.as_bytes(), &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "2\n");
}

#[test]
fn test_priority_from_dash_reads_stdin() {
    let mut out = Vec::new();
    run_priority(Some(Path::new("-")), RULES.as_bytes(), &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "2\n");
}

#[test]
fn test_priority_from_file() {
    let file = manifest_file(RULES);
    let mut out = Vec::new();
    run_priority(Some(file.path()), std::io::empty(), &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "2\n");
}

#[test]
fn test_priority_with_bad_input() {
    let mut out = Vec::new();
    let err = run_priority(None, "{".as_bytes(), &mut out).unwrap_err();
    assert!(matches!(err, DeployError::JsonError(_)));
    assert!(out.is_empty());
}

#[test]
fn test_environment_json_output() {
    let file = manifest_file("ENV=Dev\nREALM\nAWS_SECRET_ACCESS_KEY\n");
    let config = DeployConfig {
        manifest: file.path().to_path_buf(),
        ..Default::default()
    };
    let env: HashMap<String, String> = HashMap::from([
        ("REALM".to_string(), "NonProd".to_string()),
        ("AWS_SECRET_ACCESS_KEY".to_string(), "secret".to_string()),
    ]);

    let mut out = Vec::new();
    run_environment(&config, &env, OutputFormat::Json, false, &mut out).unwrap();

    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(
        value,
        serde_json::json!([
            {"name": "ENV", "value": "Dev"},
            {"name": "REALM", "value": "NonProd"}
        ])
    );
}

#[test]
fn test_environment_text_output() {
    let file = manifest_file("ENV=Dev\nREALM=NonProd\n");
    let config = DeployConfig {
        manifest: file.path().to_path_buf(),
        ..Default::default()
    };

    let mut out = Vec::new();
    run_environment(&config, &no_env(), OutputFormat::Text, false, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "ENV=Dev\nREALM=NonProd\n");
}

#[test]
fn test_environment_missing_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let config = DeployConfig {
        manifest: dir.path().join("absent.env"),
        ..Default::default()
    };

    let mut out = Vec::new();
    let err = run_environment(&config, &no_env(), OutputFormat::Json, false, &mut out)
        .unwrap_err();
    assert!(matches!(err, DeployError::ManifestError { .. }));
    assert!(out.is_empty());
}

#[test]
fn test_explicit_config_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("deploy.yaml");
    let args = Args::try_parse_from([
        "ecs-deploy",
        "--config",
        missing.to_str().unwrap(),
        "environment",
    ])
    .unwrap();
    assert!(matches!(load_config(&args), Err(DeployError::ConfigError(_))));

    let file = manifest_file("manifest: app.env\n");
    let args = Args::try_parse_from([
        "ecs-deploy",
        "environment",
        "-c",
        file.path().to_str().unwrap(),
    ])
    .unwrap();
    let config = load_config(&args).unwrap();
    assert_eq!(config.manifest, PathBuf::from("app.env"));
}
