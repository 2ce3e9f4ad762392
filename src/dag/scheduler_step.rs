// src/dag/scheduler_step.rs

//! Step-by-step execution result types for the scheduler.

use std::fmt;

use crate::dag::node::NodeId;
use crate::dag::task::{TaskFn, Values};
use crate::render::Update;

/// A node that was just moved to `Running` and must have its body started.
///
/// Its locks are already held and `requirements` is the context projected
/// onto the task's `requires`.
pub struct Admission {
    pub node: NodeId,
    pub title: String,
    pub body: TaskFn,
    pub requirements: Values,
}

impl fmt::Debug for Admission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Admission")
            .field("node", &self.node)
            .field("title", &self.title)
            .field("requirements", &self.requirements)
            .finish_non_exhaustive()
    }
}

/// Structured result of a single scheduler "step".
///
/// This is useful for tests that want to manually step the scheduler and
/// make assertions about what changed.
#[derive(Debug, Default)]
pub struct SchedulerStep {
    /// Nodes admitted by this step, in submission order.
    pub admitted: Vec<Admission>,
    /// Renderer notifications produced by this step, in order.
    pub updates: Vec<(NodeId, Update)>,
    /// Whether nothing is in flight any more, so the run is over.
    pub run_settled: bool,
}

impl SchedulerStep {
    /// Titles of the admitted nodes.
    pub fn admitted_titles(&self) -> Vec<&str> {
        self.admitted.iter().map(|a| a.title.as_str()).collect()
    }
}
