// tests/runtime_fake_executor.rs

mod common;
use crate::common::*;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use keydag::dag::Scheduler;
use keydag::engine::{CoreRuntime, Runtime, RuntimeEvent};
use keydag::{Context, NodeState, RunError, Task};
use keydag_test_utils::FakeExecutor;

fn noop(title: &str) -> Task {
    Task::new(title, |_r, _u| async { Ok(None) })
}

/// Very simple chain: A -> B -> C through keys.
fn chain() -> Vec<Task> {
    vec![
        noop("C").requires(["b"]),
        noop("B").requires(["a"]).provides(["b"]),
        noop("A").provides(["a"]),
    ]
}

#[tokio::test]
async fn runtime_with_fake_executor_runs_simple_chain() -> TestResult {
    init_tracing();

    let scheduler = Scheduler::new(chain(), Context::new(), HashMap::new(), &[])?;
    let (rt_tx, rt_rx) = mpsc::unbounded_channel::<RuntimeEvent>();

    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx, executed.clone());
    let renderer = FakeRenderer::new();

    let runtime = Runtime::new(
        CoreRuntime::new(scheduler),
        Box::new(renderer.clone()),
        rt_rx,
        executor,
    );
    let ctx = with_timeout(runtime.run()).await?;

    assert_eq!(*executed.lock().unwrap(), vec!["A", "B", "C"]);
    assert_eq!(ctx.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(renderer.entered(NodeState::Finished), vec!["A", "B", "C"]);
    Ok(())
}

#[tokio::test]
async fn scripted_failure_stops_downstream_tasks() -> TestResult {
    init_tracing();

    let scheduler = Scheduler::new(chain(), Context::new(), HashMap::new(), &[])?;
    let (rt_tx, rt_rx) = mpsc::unbounded_channel::<RuntimeEvent>();

    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx, executed.clone()).with_failure("B", "broken");

    let runtime = Runtime::new(
        CoreRuntime::new(scheduler),
        Box::new(keydag::SilentRenderer),
        rt_rx,
        executor,
    );
    let err = with_timeout(runtime.run()).await.unwrap_err();

    assert_eq!(err.to_string(), "broken");
    assert_eq!(*executed.lock().unwrap(), vec!["A", "B"]);
    Ok(())
}

#[tokio::test]
async fn closed_channel_is_reported() -> TestResult {
    init_tracing();

    /// Drops every admission without reporting back.
    struct BlackHole;

    impl keydag::exec::ExecutorBackend for BlackHole {
        fn spawn_admitted(
            &mut self,
            _admitted: Vec<keydag::dag::Admission>,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), RunError>> + Send + '_>>
        {
            Box::pin(async { Ok(()) })
        }
    }

    let scheduler = Scheduler::new(vec![noop("lost")], Context::new(), HashMap::new(), &[])?;
    let (rt_tx, rt_rx) = mpsc::unbounded_channel::<RuntimeEvent>();
    drop(rt_tx);

    let renderer = FakeRenderer::new();
    let runtime = Runtime::new(
        CoreRuntime::new(scheduler),
        Box::new(renderer.clone()),
        rt_rx,
        BlackHole,
    );
    let err = with_timeout(runtime.run()).await.unwrap_err();

    assert!(matches!(err, RunError::ChannelClosed));
    assert!(matches!(
        renderer.events().last(),
        Some(keydag_test_utils::RenderEvent::Stop)
    ));
    Ok(())
}
