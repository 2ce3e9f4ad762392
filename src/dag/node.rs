// src/dag/node.rs

//! Runtime wrapper pairing a task with its lifecycle state.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::dag::task::Task;
use crate::errors::NodeError;
use crate::render::{Status, Step, Update};

/// Number of output lines a node keeps for display.
pub const RECENT_OUTPUT_LINES: usize = 8;

/// Index of a node in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state: `Pending -> Running -> {Skipped | Finished | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Pending,
    Running,
    Skipped,
    Finished,
    Failed,
}

impl NodeState {
    /// Finished or skipped: the states a successful run ends with.
    pub fn is_done(self) -> bool {
        matches!(self, NodeState::Finished | NodeState::Skipped)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeState::Pending => "pending",
            NodeState::Running => "running",
            NodeState::Skipped => "skipped",
            NodeState::Finished => "finished",
            NodeState::Failed => "failed",
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One task plus its run state.
///
/// The display fields (`started_at` .. `failure`) exist for renderers only.
/// They are written by [`Node::record`] and scheduling logic never reads them.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    task: Task,
    state: NodeState,
    /// Admitted and not yet completed. A skipped node stays in flight until
    /// its body returns.
    pub(crate) in_flight: bool,

    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    pub steps: Vec<Step>,
    pub output: VecDeque<String>,
    pub status: Option<Status>,
    pub skip_reason: Option<String>,
    pub failure: Option<Arc<NodeError>>,
}

impl Node {
    pub fn new(id: NodeId, task: Task) -> Self {
        Self {
            id,
            task,
            state: NodeState::Pending,
            in_flight: false,
            started_at: None,
            finished_at: None,
            steps: Vec::new(),
            output: VecDeque::new(),
            status: None,
            skip_reason: None,
            failure: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn title(&self) -> &str {
        self.task.title()
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: NodeState) {
        self.state = state;
    }

    /// Apply a renderer update to the display fields.
    pub fn record(&mut self, update: &Update) {
        match update {
            Update::State(NodeState::Running) => {
                self.started_at = Some(Instant::now());
            }
            Update::State(state) if *state != NodeState::Pending => {
                self.finished_at.get_or_insert_with(Instant::now);
            }
            Update::State(_) => {}
            Update::Log(line) => {
                if self.output.len() == RECENT_OUTPUT_LINES {
                    self.output.pop_front();
                }
                self.output.push_back(line.clone());
            }
            Update::Status(status) => self.status = Some(status.clone()),
            Update::Step(step) => self.steps.push(step.clone()),
            Update::Skip(reason) => self.skip_reason = Some(reason.clone()),
            Update::Fail(error) => self.failure = Some(Arc::clone(error)),
        }
    }
}
