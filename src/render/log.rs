// src/render/log.rs

use tracing::{debug, info, warn};

use crate::dag::{Node, NodeState};
use crate::render::{Renderer, Update};

/// Renderer that reports through `tracing`.
#[derive(Debug, Default)]
pub struct TracingRenderer {
    total: usize,
    settled: usize,
}

impl TracingRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for TracingRenderer {
    fn start(&mut self, nodes: &[Node]) {
        self.total = nodes.len();
        self.settled = 0;
        info!(tasks = nodes.len(), "run started");
    }

    fn update(&mut self, node: &Node, update: &Update) {
        let task = node.title();
        match update {
            Update::State(NodeState::Running) => info!(task = %task, "running"),
            Update::State(state @ (NodeState::Finished | NodeState::Skipped)) => {
                self.settled += 1;
                let elapsed_ms = node
                    .started_at
                    .zip(node.finished_at)
                    .map(|(s, f)| f.duration_since(s).as_millis() as u64);
                info!(
                    task = %task,
                    state = %state,
                    elapsed_ms,
                    done = self.settled,
                    total = self.total,
                    "task settled"
                );
            }
            Update::State(state) => debug!(task = %task, state = %state, "state changed"),
            Update::Log(line) => info!(task = %task, "{line}"),
            Update::Status(status) => debug!(
                task = %task,
                message = status.message.as_deref(),
                progress = status.progress,
                "status"
            ),
            Update::Step(step) => info!(task = %task, step = %step.title, "step"),
            Update::Skip(reason) => info!(task = %task, reason = %reason, "skipped"),
            Update::Fail(error) => warn!(task = %task, error = %error, "task failed"),
        }
    }

    fn stop(&mut self) {
        info!(done = self.settled, total = self.total, "run stopped");
    }
}
