// src/engine/mod.rs

//! Orchestration engine for keydag.
//!
//! This module ties together:
//! - the synchronous scheduler core (`dag::Scheduler`)
//! - the renderer the caller picked
//! - the executor backend that runs admitted task bodies
//! - the runtime event loop that reacts to updates, skips and completions
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`]. [`run`] wires both together for library
//! callers.

use std::time::Instant;

use tokio::sync::mpsc;

use crate::dag::{Context, NodeId, Scheduler, Task, Values};
use crate::errors::{NodeError, RunError};
use crate::exec::TokioExecutor;
use crate::render::Update;

/// What a task body produced.
#[derive(Debug)]
pub enum TaskOutcome {
    /// The body returned; the mapping is checked against its provides.
    Returned(Option<Values>),
    /// The body failed or panicked.
    Failed(NodeError),
}

/// Events flowing into the runtime from running task bodies.
#[derive(Debug)]
pub enum RuntimeEvent {
    /// `log`, `status` or `step` from inside a body.
    Update { node: NodeId, update: Update },
    /// The body called `utils.skip(..)`.
    Skipped { node: NodeId, reason: String },
    /// The body finished; `at` is when the runner observed it.
    TaskCompleted {
        node: NodeId,
        outcome: TaskOutcome,
        at: Instant,
    },
}

pub mod core;
pub mod event_handlers;
pub mod options;
pub mod runtime;

pub use self::core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use options::RunOptions;
pub use runtime::Runtime;

/// Run `tasks` to completion and return the final context.
///
/// On failure this resolves only after every already-running task has
/// finished, with the error of the earliest failing task.
pub async fn run(tasks: Vec<Task>, options: RunOptions) -> Result<Context, RunError> {
    let RunOptions {
        renderer,
        locks,
        targets,
        context,
    } = options;

    let scheduler = Scheduler::new(tasks, context, locks, &targets)?;

    let (rt_tx, rt_rx) = mpsc::unbounded_channel::<RuntimeEvent>();
    let executor = TokioExecutor::new(rt_tx);

    let core = CoreRuntime::new(scheduler);
    Runtime::new(core, renderer, rt_rx, executor).run().await
}
