// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated scheduler state
//! - a list of commands describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for reading
//! events, calling the renderer and handing admissions to the executor.
//! The core can be unit tested without Tokio, channels or task bodies.

use crate::dag::{Context, Scheduler};
use crate::engine::event_handlers::{
    handle_skip, handle_start, handle_task_completion, handle_update, CoreStep,
};
use crate::engine::RuntimeEvent;
use crate::errors::RunError;

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler) -> Self {
        Self { scheduler }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn is_settled(&self) -> bool {
        self.scheduler.is_settled()
    }

    /// Initial admission pass.
    pub fn start(&mut self) -> Result<CoreStep, RunError> {
        handle_start(&mut self.scheduler)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> Result<CoreStep, RunError> {
        match event {
            RuntimeEvent::Update { node, update } => {
                Ok(handle_update(&mut self.scheduler, node, update))
            }
            RuntimeEvent::Skipped { node, reason } => {
                Ok(handle_skip(&mut self.scheduler, node, reason))
            }
            RuntimeEvent::TaskCompleted { node, outcome, at } => {
                handle_task_completion(&mut self.scheduler, node, outcome, at)
            }
        }
    }

    pub fn into_result(self) -> Result<Context, RunError> {
        self.scheduler.into_result()
    }
}
