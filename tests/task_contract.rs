// tests/task_contract.rs

mod common;
use crate::common::*;

use serde_json::json;

use keydag::{run, NodeError, NodeState, RunError, RunOptions, Skip, Status, Task, Update, Values};

fn options(renderer: &FakeRenderer) -> RunOptions {
    RunOptions::new().renderer(renderer.clone())
}

#[tokio::test]
async fn single_key_task_returning_nothing_provides_true() -> TestResult {
    init_tracing();

    let tasks = vec![Task::new("one", |_r, _u| async { Ok(None) }).provides(["ready"])];
    let ctx = with_timeout(run(tasks, RunOptions::new())).await?;

    assert_eq!(ctx.get("ready"), Some(&json!(true)));
    assert_eq!(ctx.len(), 1);
    Ok(())
}

#[tokio::test]
async fn missing_provide_names_the_key() {
    init_tracing();

    let tasks = vec![
        Task::new("half", |_r, _u| async {
            Ok(Some(Values::from([("a".to_string(), json!(1))])))
        })
        .provides(["a", "b"]),
    ];

    let renderer = FakeRenderer::new();
    let err = with_timeout(run(tasks, options(&renderer))).await.unwrap_err();

    assert_eq!(err.to_string(), "task 'half' did not provide expected b");
    assert!(matches!(err.node_error(), Some(NodeError::MissingProvide { .. })));
    assert_eq!(renderer.states_of("half"), vec![NodeState::Running, NodeState::Failed]);
}

#[tokio::test]
async fn providing_a_seeded_key_fails() {
    init_tracing();

    let tasks = vec![
        Task::new("dup", |_r, _u| async {
            Ok(Some(Values::from([("token".to_string(), json!("new"))])))
        })
        .provides(["token"]),
    ];
    let seeded: keydag::Context = [("token".to_string(), json!("old"))].into_iter().collect();

    let err = with_timeout(run(tasks, RunOptions::new().context(seeded)))
        .await
        .unwrap_err();
    assert!(matches!(err.node_error(), Some(NodeError::AlreadyProvided { key, .. }) if key == "token"));
}

#[tokio::test]
async fn requirements_are_projected_from_the_context() -> TestResult {
    init_tracing();

    let tasks = vec![
        Task::new("produce", |_r, _u| async {
            Ok(Some(Values::from([("n".to_string(), json!(41))])))
        })
        .provides(["n"]),
        Task::new("consume", |req, _u| async move {
            assert_eq!(req.keys().collect::<Vec<_>>(), vec!["n"]);
            let n = req["n"].as_i64().unwrap_or_default();
            Ok(Some(Values::from([("m".to_string(), json!(n + 1))])))
        })
        .requires(["n"])
        .provides(["m"]),
        Task::new("bystander", |_r, _u| async { Ok(None) }).provides(["other"]),
    ];

    let ctx = with_timeout(run(tasks, RunOptions::new())).await?;
    assert_eq!(ctx.get("m"), Some(&json!(42)));
    Ok(())
}

#[tokio::test]
async fn skip_keeps_skipped_state_and_supplied_values() -> TestResult {
    init_tracing();

    let renderer = FakeRenderer::new();
    let tasks = vec![
        Task::new("cached", |_r, utils| async move {
            let provides = Values::from([("artifact".to_string(), json!("from-cache"))]);
            Ok(utils.skip(Skip::new().provides(provides).reason("cache hit")))
        })
        .provides(["artifact"]),
        Task::new("after", |_r, _u| async { Ok(None) }).requires(["artifact"]),
    ];

    let ctx = with_timeout(run(tasks, options(&renderer))).await?;
    assert_eq!(ctx.get("artifact"), Some(&json!("from-cache")));

    assert_eq!(
        renderer.states_of("cached"),
        vec![NodeState::Running, NodeState::Skipped]
    );
    let skip_reasons: Vec<String> = renderer
        .updates()
        .into_iter()
        .filter_map(|(t, u)| match u {
            Update::Skip(reason) if t == "cached" => Some(reason),
            _ => None,
        })
        .collect();
    assert_eq!(skip_reasons, vec!["cache hit"]);
    assert_eq!(
        renderer.states_of("after"),
        vec![NodeState::Running, NodeState::Finished]
    );
    Ok(())
}

#[tokio::test]
async fn skip_without_provides_still_checks_the_contract() {
    init_tracing();

    let renderer = FakeRenderer::new();
    let tasks = vec![
        Task::new("lazy", |_r, utils| async move { Ok(utils.skip(Skip::new())) })
            .provides(["a", "b"]),
    ];

    let err = with_timeout(run(tasks, options(&renderer))).await.unwrap_err();
    assert!(matches!(err.node_error(), Some(NodeError::NoResult { .. })));
    assert_eq!(
        renderer.states_of("lazy"),
        vec![NodeState::Running, NodeState::Skipped, NodeState::Failed]
    );
}

#[tokio::test]
async fn panicking_body_fails_its_node() {
    init_tracing();

    let tasks = vec![Task::new("explodes", |_r, _u| async {
        if true {
            panic!("kaboom");
        }
        Ok(None)
    })];

    let err = with_timeout(run(tasks, RunOptions::new())).await.unwrap_err();
    match err.node_error() {
        Some(NodeError::Panicked { task, message }) => {
            assert_eq!(task, "explodes");
            assert_eq!(message, "kaboom");
        }
        other => panic!("expected a panic failure, got {other:?}"),
    }
}

#[tokio::test]
async fn status_and_steps_reach_the_renderer_before_completion() -> TestResult {
    init_tracing();

    let renderer = FakeRenderer::new();
    let tasks = vec![Task::new("chatty", |_r, utils| async move {
        utils.step("compile");
        utils.status(Status::message("halfway").with_progress(0.5));
        utils.log("hello");
        Ok(None)
    })];

    with_timeout(run(tasks, options(&renderer))).await?;

    let updates = renderer.updates();
    let kinds: Vec<&str> = updates.iter().map(|(_, u)| u.kind()).collect();
    assert_eq!(kinds, vec!["state", "step", "status", "log", "state"]);
    assert_eq!(renderer.logs_of("chatty"), vec!["hello"]);
    Ok(())
}

#[tokio::test]
async fn undeclared_lock_fails_before_anything_runs() {
    init_tracing();

    let renderer = FakeRenderer::new();
    let tasks = vec![Task::new("t", |_r, _u| async { Ok(None) }).locks(["gpu"])];

    let err = run(tasks, options(&renderer)).await.unwrap_err();
    assert!(matches!(err, RunError::UnknownLock { ref lock, .. } if lock == "gpu"));
    assert!(renderer.events().is_empty());
}

#[tokio::test]
async fn unsatisfiable_requirement_reports_stall() {
    init_tracing();

    let tasks = vec![Task::new("waits", |_r, _u| async { Ok(None) }).requires(["never"])];
    let err = with_timeout(run(tasks, RunOptions::new())).await.unwrap_err();
    assert!(matches!(err, RunError::Stalled { ref pending } if pending == &["waits"]));
}
