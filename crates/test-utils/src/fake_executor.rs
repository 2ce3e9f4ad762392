use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc;
use keydag::dag::Admission;
use keydag::engine::{RuntimeEvent, TaskOutcome};
use keydag::exec::ExecutorBackend;
use keydag::{NodeError, RunError, Values};

/// A fake executor that:
/// - records which tasks were "run", without invoking their bodies
/// - immediately reports `TaskCompleted` for each admitted node, with a
///   scripted result (`Returned(None)` unless configured otherwise).
pub struct FakeExecutor {
    runtime_tx: mpsc::UnboundedSender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    results: HashMap<String, Values>,
    failures: HashMap<String, String>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::UnboundedSender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            results: HashMap::new(),
            failures: HashMap::new(),
        }
    }

    /// Complete `title` with this mapping instead of nothing.
    pub fn with_result(mut self, title: &str, values: Values) -> Self {
        self.results.insert(title.to_string(), values);
        self
    }

    /// Complete `title` with an error carrying `message`.
    pub fn with_failure(mut self, title: &str, message: &str) -> Self {
        self.failures.insert(title.to_string(), message.to_string());
        self
    }

    fn outcome_for(&self, title: &str) -> TaskOutcome {
        if let Some(message) = self.failures.get(title) {
            return TaskOutcome::Failed(NodeError::Task(anyhow::anyhow!(message.clone())));
        }
        TaskOutcome::Returned(self.results.get(title).cloned())
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_admitted(
        &mut self,
        admitted: Vec<Admission>,
    ) -> Pin<Box<dyn Future<Output = Result<(), RunError>> + Send + '_>> {
        Box::pin(async move {
            for admission in admitted {
                self.executed.lock().unwrap().push(admission.title.clone());

                let outcome = self.outcome_for(&admission.title);
                self.runtime_tx
                    .send(RuntimeEvent::TaskCompleted {
                        node: admission.node,
                        outcome,
                        at: Instant::now(),
                    })
                    .map_err(|_| RunError::ChannelClosed)?;
            }
            Ok(())
        })
    }
}
