// src/dag/state_manager.rs

//! Readiness evaluation and the admission pass.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::dag::context::Context;
use crate::dag::lock::Lock;
use crate::dag::node::{Node, NodeId, NodeState};
use crate::dag::scheduler_step::Admission;
use crate::errors::RunError;
use crate::render::Update;

/// Borrowed view over the mutable scheduling state used by one admission
/// pass.
pub struct StateManager<'a> {
    nodes: &'a mut [Node],
    context: &'a Context,
    locks: &'a mut HashMap<String, Lock>,
}

impl<'a> StateManager<'a> {
    pub fn new(
        nodes: &'a mut [Node],
        context: &'a Context,
        locks: &'a mut HashMap<String, Lock>,
    ) -> Self {
        Self {
            nodes,
            context,
            locks,
        }
    }

    /// Scan every node once and admit each that is startable right now.
    ///
    /// Lock counters are updated as nodes are admitted, so later nodes in the
    /// same pass see the slots taken by earlier ones.
    pub fn admit_ready(
        &mut self,
        updates: &mut Vec<(NodeId, Update)>,
    ) -> Result<Vec<Admission>, RunError> {
        let mut admitted = Vec::new();

        for idx in 0..self.nodes.len() {
            if !is_startable(&self.nodes[idx], self.context, self.locks) {
                continue;
            }

            let node = &mut self.nodes[idx];
            node.set_state(NodeState::Running);
            node.in_flight = true;
            updates.push((node.id(), Update::State(NodeState::Running)));

            for name in node.task().lock_names() {
                if let Some(lock) = self.locks.get_mut(name) {
                    lock.acquire()?;
                    debug!(
                        task = %node.title(),
                        lock = %name,
                        held = lock.held(),
                        capacity = lock.capacity(),
                        "lock acquired"
                    );
                }
            }

            let requirements = self.context.project(node.task().required_keys());

            info!(task = %node.title(), node = %node.id(), "dependencies satisfied; admitting");

            admitted.push(Admission {
                node: node.id(),
                title: node.title().to_string(),
                body: node.task().body(),
                requirements,
            });
        }

        Ok(admitted)
    }

    /// Release every lock `node` declares.
    pub fn release_locks(&mut self, node: NodeId) -> Result<(), RunError> {
        let Some(node) = self.nodes.get(node.0) else {
            return Ok(());
        };

        for name in node.task().lock_names() {
            if let Some(lock) = self.locks.get_mut(name) {
                lock.release()?;
                debug!(
                    task = %node.title(),
                    lock = %name,
                    held = lock.held(),
                    "lock released"
                );
            }
        }

        Ok(())
    }
}

/// Readiness predicate for one node, ignoring the run-wide failure flag
/// (the scheduler skips the whole pass once a failure is recorded).
pub fn is_startable(node: &Node, context: &Context, locks: &HashMap<String, Lock>) -> bool {
    node.state() == NodeState::Pending
        && node
            .task()
            .required_keys()
            .iter()
            .all(|key| context.contains(key))
        && node
            .task()
            .lock_names()
            .iter()
            .all(|name| locks.get(name).is_some_and(Lock::available))
}
