use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::dag::context::Context;
use crate::dag::graph::prune_to_targets;
use crate::dag::lock::Lock;
use crate::dag::node::{Node, NodeId, NodeState};
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::StateManager;
use crate::dag::task::Task;
use crate::engine::TaskOutcome;
use crate::errors::{NodeError, RunError};
use crate::exec::contract::validate_result;
use crate::render::Update;

/// The failure that will be handed to the caller once the run drains.
#[derive(Debug)]
struct FirstFailure {
    at: Instant,
    node: NodeId,
    error: Arc<NodeError>,
}

/// Scheduler holds the node set plus all mutable per-run state.
///
/// It is responsible for:
/// - validating the submitted tasks against the lock table
/// - pruning to the subgraph needed for the targets
/// - deciding which pending nodes may start (keys present, locks free,
///   no failure recorded yet) and admitting them
/// - validating results and merging them into the context
/// - recording the first failure and draining in-flight work
///
/// Every method is synchronous; the async runtime feeds it one event at a
/// time, which makes it the single writer of context and lock counters.
#[derive(Debug)]
pub struct Scheduler {
    nodes: Vec<Node>,
    context: Context,
    locks: HashMap<String, Lock>,
    first_failure: Option<FirstFailure>,
}

impl Scheduler {
    /// Build a scheduler, rejecting structurally invalid input before
    /// anything runs.
    ///
    /// When `targets` is non-empty, only the tasks needed to produce those
    /// keys are kept.
    pub fn new(
        tasks: Vec<Task>,
        context: Context,
        locks: HashMap<String, Lock>,
        targets: &[String],
    ) -> Result<Self, RunError> {
        for (index, task) in tasks.iter().enumerate() {
            if task.title().trim().is_empty() {
                return Err(RunError::MissingTitle { index });
            }
        }

        if let Some((name, _)) = locks.iter().find(|(_, lock)| lock.capacity() == 0) {
            return Err(RunError::InvalidLockCapacity { lock: name.clone() });
        }

        for task in &tasks {
            if let Some(lock) = task.lock_names().iter().find(|l| !locks.contains_key(*l)) {
                return Err(RunError::UnknownLock {
                    task: task.title().to_string(),
                    lock: lock.clone(),
                });
            }
        }

        let submitted = tasks.len();
        let tasks = if targets.is_empty() {
            tasks
        } else {
            prune_to_targets(tasks, targets, &context)?
        };

        if tasks.len() != submitted {
            info!(
                ?targets,
                kept = tasks.len(),
                submitted,
                "pruned tasks to targeted subgraph"
            );
        }

        let nodes = tasks
            .into_iter()
            .enumerate()
            .map(|(idx, task)| Node::new(NodeId(idx), task))
            .collect();

        Ok(Self {
            nodes,
            context,
            locks,
            first_failure: None,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Look a node up by task title (first match).
    pub fn node_by_title(&self, title: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.title() == title)
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn lock(&self, name: &str) -> Option<&Lock> {
        self.locks.get(name)
    }

    /// Nodes admitted and not completed yet.
    pub fn in_flight(&self) -> usize {
        self.nodes.iter().filter(|n| n.in_flight).count()
    }

    /// Whether a failure has been recorded; no more nodes are admitted then.
    pub fn has_failed(&self) -> bool {
        self.first_failure.is_some()
    }

    /// Whether the run is over: nothing is in flight and, since every step
    /// ends with an admission pass, nothing more can start.
    pub fn is_settled(&self) -> bool {
        self.in_flight() == 0
    }

    /// Initial admission pass.
    pub fn start(&mut self) -> Result<SchedulerStep, RunError> {
        debug!(nodes = self.nodes.len(), "scheduler: starting run");
        let mut step = SchedulerStep::default();
        self.admission_pass(&mut step)?;
        Ok(step)
    }

    /// Apply a renderer update to a node's display fields.
    pub fn record_update(&mut self, id: NodeId, update: &Update) -> Option<&Node> {
        let node = self.nodes.get_mut(id.0)?;
        node.record(update);
        Some(node)
    }

    /// A running node asked to be skipped.
    pub fn skip(&mut self, id: NodeId, reason: String) -> SchedulerStep {
        let mut step = SchedulerStep::default();

        match self.nodes.get_mut(id.0) {
            Some(node) if node.state() == NodeState::Running => {
                node.set_state(NodeState::Skipped);
                info!(task = %node.title(), reason = %reason, "task skipped");
                step.updates.push((id, Update::State(NodeState::Skipped)));
                step.updates.push((id, Update::Skip(reason)));
            }
            Some(node) => {
                warn!(
                    task = %node.title(),
                    state = %node.state(),
                    "skip requested for a node that is not running; ignoring"
                );
            }
            None => warn!(node = %id, "skip for unknown node; ignoring"),
        }

        step.run_settled = self.is_settled();
        step
    }

    /// A node's body returned (or failed). Releases its locks, validates its
    /// result, updates the context and runs an admission pass.
    ///
    /// `at` is when the completion was observed; it orders failures.
    pub fn complete(
        &mut self,
        id: NodeId,
        outcome: TaskOutcome,
        at: Instant,
    ) -> Result<SchedulerStep, RunError> {
        let mut step = SchedulerStep::default();

        match self.nodes.get(id.0) {
            Some(node) if node.in_flight => {}
            Some(node) => {
                warn!(task = %node.title(), "completion for a node that is not in flight; ignoring");
                step.run_settled = self.is_settled();
                return Ok(step);
            }
            None => {
                warn!(node = %id, "completion for unknown node; ignoring");
                step.run_settled = self.is_settled();
                return Ok(step);
            }
        }

        StateManager::new(&mut self.nodes, &self.context, &mut self.locks).release_locks(id)?;

        let node = &mut self.nodes[id.0];
        node.in_flight = false;

        let result = match outcome {
            TaskOutcome::Returned(values) => validate_result(node.task(), values, &self.context),
            TaskOutcome::Failed(error) => Err(error),
        };

        match result {
            Ok(values) => {
                let keys: Vec<&String> = values.keys().collect();
                info!(task = %node.title(), ?keys, "task completed");
                self.context.merge_validated(values);

                if node.state() == NodeState::Running {
                    node.set_state(NodeState::Finished);
                    step.updates.push((id, Update::State(NodeState::Finished)));
                }
            }
            Err(error) => {
                warn!(
                    task = %node.title(),
                    error = %error,
                    contract = error.is_contract_violation(),
                    "task failed; no further tasks will be started"
                );
                let error = Arc::new(error);
                node.set_state(NodeState::Failed);
                step.updates.push((id, Update::State(NodeState::Failed)));
                step.updates.push((id, Update::Fail(Arc::clone(&error))));
                self.record_failure(id, at, error);
            }
        }

        self.admission_pass(&mut step)?;
        Ok(step)
    }

    /// Final result once the run settled.
    pub fn into_result(self) -> Result<Context, RunError> {
        if let Some(failure) = self.first_failure {
            let task = self.nodes[failure.node.0].title().to_string();
            return Err(RunError::TaskFailed {
                task,
                error: failure.error,
            });
        }

        let pending: Vec<String> = self
            .nodes
            .iter()
            .filter(|n| !n.state().is_done())
            .map(|n| n.title().to_string())
            .collect();

        if !pending.is_empty() {
            return Err(RunError::Stalled { pending });
        }

        Ok(self.context)
    }

    /// Keep the earliest failure; ties go to the earlier-submitted node.
    fn record_failure(&mut self, node: NodeId, at: Instant, error: Arc<NodeError>) {
        let replace = match &self.first_failure {
            None => true,
            Some(current) => (at, node) < (current.at, current.node),
        };

        if replace {
            self.first_failure = Some(FirstFailure { at, node, error });
        }
    }

    fn admission_pass(&mut self, step: &mut SchedulerStep) -> Result<(), RunError> {
        if self.first_failure.is_none() {
            let mut manager = StateManager::new(&mut self.nodes, &self.context, &mut self.locks);
            step.admitted = manager.admit_ready(&mut step.updates)?;
        }

        step.run_settled = self.is_settled();

        if step.run_settled {
            info!(
                failed = self.has_failed(),
                provided = self.context.len(),
                "scheduler: nothing in flight; run settled"
            );
        }

        Ok(())
    }
}
