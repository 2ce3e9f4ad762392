// tests/config_loading.rs

mod common;
use crate::common::*;

use std::fs;

use serde_json::json;
use tempfile::tempdir;

use keydag::config::load_and_validate;
use keydag::errors::KeydagError;
use keydag::{run, RendererKind, RunOptions};

const PIPELINE: &str = r#"
[config]
renderer = "quiet"

[locks]
disk = 1

[context]
greeting = "hello"

[task.write]
title = "Write file"
cmd = "echo \"$KEYDAG_GREETING\""
requires = ["greeting"]
provides = ["written"]
locks = ["disk"]

[task.check]
cmd = "exit 75"
requires = ["written"]
provides = ["checked"]
skip_exit_code = 75
"#;

#[test]
fn loads_sections_into_tasks_locks_and_context() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("Keydag.toml");
    fs::write(&path, PIPELINE)?;

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.config.renderer, RendererKind::Quiet);

    let titles: Vec<String> = cfg.tasks().iter().map(|t| t.title().to_string()).collect();
    assert_eq!(titles, vec!["check", "Write file"]);

    assert_eq!(cfg.lock_table()["disk"].capacity(), 1);
    assert_eq!(cfg.seeded_context().get("greeting"), Some(&json!("hello")));
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let err = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, KeydagError::IoError(_)));
}

#[test]
fn malformed_toml_is_reported() -> TestResult {
    let dir = tempdir()?;
    let path = dir.path().join("Keydag.toml");
    fs::write(&path, "[task.a\ncmd = 1")?;

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, KeydagError::TomlError(_)));
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn configured_commands_run_end_to_end() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let path = dir.path().join("Keydag.toml");
    fs::write(&path, PIPELINE)?;
    let cfg = load_and_validate(&path)?;

    let renderer = FakeRenderer::new();
    let mut options = RunOptions::new()
        .renderer(renderer.clone())
        .context(cfg.seeded_context());
    for (name, lock) in cfg.lock_table() {
        options = options.lock(name, lock);
    }

    let ctx = with_timeout(run(cfg.tasks(), options)).await?;

    assert_eq!(ctx.get("written"), Some(&json!(true)));
    assert_eq!(ctx.get("checked"), Some(&json!(true)));
    assert_eq!(renderer.logs_of("Write file"), vec!["hello"]);
    assert_eq!(
        renderer.states_of("check"),
        vec![keydag::NodeState::Running, keydag::NodeState::Skipped]
    );
    Ok(())
}
