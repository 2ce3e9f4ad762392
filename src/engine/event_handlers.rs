// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::time::Instant;

use tracing::trace;

use crate::dag::{Admission, NodeId, Scheduler, SchedulerStep};
use crate::engine::TaskOutcome;
use crate::errors::RunError;
use crate::render::Update;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug)]
pub enum CoreCommand {
    /// Hand this update for `node` to the renderer. The node's display
    /// fields already reflect it.
    Render { node: NodeId, update: Update },
    /// Start the bodies of these admitted nodes.
    Dispatch(Vec<Admission>),
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

pub fn handle_start(scheduler: &mut Scheduler) -> Result<CoreStep, RunError> {
    let step = scheduler.start()?;
    Ok(into_core_step(scheduler, step))
}

/// Forward a `log`/`status`/`step` update from a running body.
pub fn handle_update(scheduler: &mut Scheduler, node: NodeId, update: Update) -> CoreStep {
    let mut commands = Vec::new();

    if scheduler.record_update(node, &update).is_some() {
        commands.push(CoreCommand::Render { node, update });
    } else {
        trace!(node = %node, kind = update.kind(), "update for unknown node dropped");
    }

    CoreStep {
        commands,
        keep_running: !scheduler.is_settled(),
    }
}

pub fn handle_skip(scheduler: &mut Scheduler, node: NodeId, reason: String) -> CoreStep {
    let step = scheduler.skip(node, reason);
    into_core_step(scheduler, step)
}

pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    node: NodeId,
    outcome: TaskOutcome,
    at: Instant,
) -> Result<CoreStep, RunError> {
    let step = scheduler.complete(node, outcome, at)?;
    Ok(into_core_step(scheduler, step))
}

/// Record each update on its node, then emit render commands followed by a
/// single dispatch for everything admitted in the step.
fn into_core_step(scheduler: &mut Scheduler, step: SchedulerStep) -> CoreStep {
    let SchedulerStep {
        admitted,
        updates,
        run_settled,
    } = step;

    let mut commands = Vec::with_capacity(updates.len() + 1);

    for (node, update) in updates {
        scheduler.record_update(node, &update);
        commands.push(CoreCommand::Render { node, update });
    }

    if !admitted.is_empty() {
        commands.push(CoreCommand::Dispatch(admitted));
    }

    CoreStep {
        commands,
        keep_running: !run_settled,
    }
}
