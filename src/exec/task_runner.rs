// src/exec/task_runner.rs

//! Runs one admitted node's body to completion.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::dag::Admission;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::errors::NodeError;
use crate::exec::Utils;

/// Invoke the body with its requirements and a fresh [`Utils`], then send
/// exactly one `TaskCompleted` event.
///
/// Errors and panics from the body both end up as `TaskOutcome::Failed`;
/// locks are released by the scheduler when the event is processed, whatever
/// the outcome.
pub async fn run_node(admission: Admission, runtime_tx: mpsc::UnboundedSender<RuntimeEvent>) {
    let Admission {
        node,
        title,
        body,
        requirements,
    } = admission;

    let utils = Utils::new(node, runtime_tx.clone());
    debug!(task = %title, node = %node, "task body started");

    // Call the body inside the future so a panic before its first await is
    // caught as well.
    let fut = async move { body(requirements, utils).await };

    let outcome = match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(values)) => TaskOutcome::Returned(values),
        Ok(Err(err)) => {
            debug!(task = %title, error = %err, "task body returned an error");
            TaskOutcome::Failed(NodeError::Task(err))
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(task = %title, panic = %message, "task body panicked");
            TaskOutcome::Failed(NodeError::Panicked {
                task: title.clone(),
                message,
            })
        }
    };

    let event = RuntimeEvent::TaskCompleted {
        node,
        outcome,
        at: Instant::now(),
    };

    if runtime_tx.send(event).is_err() {
        warn!(task = %title, "runtime gone before task completion could be reported");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
