// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime hands admitted nodes to an `ExecutorBackend` instead of
//! spawning them itself. This makes it easy to swap in a fake executor in
//! tests while keeping the production executor in [`TokioExecutor`].
//!
//! Whatever the backend does, every admitted node must eventually produce
//! exactly one `RuntimeEvent::TaskCompleted`, or the run never settles.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;
use tracing::debug;

use crate::dag::Admission;
use crate::engine::RuntimeEvent;
use crate::errors::RunError;

use super::task_runner::run_node;

/// Trait abstracting how admitted nodes are executed.
///
/// Production code uses [`TokioExecutor`]; tests can provide their own
/// implementation that completes nodes synthetically.
pub trait ExecutorBackend: Send {
    /// Start the bodies of the given admitted nodes.
    fn spawn_admitted(
        &mut self,
        admitted: Vec<Admission>,
    ) -> Pin<Box<dyn Future<Output = Result<(), RunError>> + Send + '_>>;
}

/// Real executor backend: every admitted body runs in its own Tokio task and
/// reports back over the runtime event channel.
pub struct TokioExecutor {
    tx: mpsc::UnboundedSender<RuntimeEvent>,
}

impl TokioExecutor {
    pub fn new(runtime_tx: mpsc::UnboundedSender<RuntimeEvent>) -> Self {
        Self { tx: runtime_tx }
    }
}

impl ExecutorBackend for TokioExecutor {
    fn spawn_admitted(
        &mut self,
        admitted: Vec<Admission>,
    ) -> Pin<Box<dyn Future<Output = Result<(), RunError>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for admission in admitted {
                debug!(task = %admission.title, node = %admission.node, "spawning task body");
                tokio::spawn(run_node(admission, tx.clone()));
            }
            Ok(())
        })
    }
}
