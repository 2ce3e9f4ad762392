// src/exec/utils.rs

//! Instrumentation handle passed to every running task body.

use futures::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::dag::{NodeId, Values};
use crate::engine::RuntimeEvent;
use crate::exec::wait::{lines, Awaitable};
use crate::render::{Status, Step, Update};

pub const DEFAULT_SKIP_REASON: &str = "skipped";

/// Arguments to [`Utils::skip`].
#[derive(Debug, Clone, Default)]
pub struct Skip {
    pub provides: Option<Values>,
    pub reason: Option<String>,
}

impl Skip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn provides(mut self, provides: Values) -> Self {
        self.provides = Some(provides);
        self
    }
}

/// Handle a task body uses to report progress, drain output and skip.
///
/// Everything goes to the runtime as [`RuntimeEvent`]s on the same channel
/// the completion is sent on, so updates are always seen before the task's
/// own completion. If the runtime is gone the updates are dropped.
#[derive(Debug, Clone)]
pub struct Utils {
    node: NodeId,
    events: mpsc::UnboundedSender<RuntimeEvent>,
}

impl Utils {
    pub fn new(node: NodeId, events: mpsc::UnboundedSender<RuntimeEvent>) -> Self {
        Self { node, events }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Wait for a value, a byte stream or an observable.
    ///
    /// Stream and observable items are forwarded as `log` updates; the call
    /// resolves with `Value::Null` once they complete. A pending value
    /// resolves with whatever it settles to, after draining it if it settles
    /// to a stream or observable.
    pub async fn wait_for(&self, awaitable: impl Into<Awaitable>) -> anyhow::Result<Value> {
        let mut current = awaitable.into();

        loop {
            current = match current {
                Awaitable::Ready(value) => return Ok(value),
                Awaitable::Pending(fut) => fut.await?,
                Awaitable::Stream(reader) => Awaitable::Observable(lines(reader)),
                Awaitable::Observable(mut source) => {
                    let mut count = 0usize;
                    while let Some(item) = source.next().await {
                        self.log(item?);
                        count += 1;
                    }
                    debug!(node = %self.node, lines = count, "observable completed");
                    return Ok(Value::Null);
                }
            };
        }
    }

    /// Forward one output line as a `log` update.
    pub fn log(&self, line: impl Into<String>) {
        self.send(Update::Log(line.into()));
    }

    pub fn status(&self, status: Status) {
        self.send(Update::Status(status));
    }

    pub fn step(&self, title: impl Into<String>) {
        self.send(Update::Step(Step {
            title: title.into(),
        }));
    }

    /// Mark the node skipped right away and hand back `provides`, meant to
    /// be returned from the body as-is:
    ///
    /// ```no_run
    /// # use keydag::{Skip, Task};
    /// let task = Task::new("maybe", |_req, utils| async move {
    ///     Ok(utils.skip(Skip::new().reason("nothing changed")))
    /// });
    /// # let _ = task;
    /// ```
    ///
    /// The returned mapping is still checked against the task's provides.
    pub fn skip(&self, skip: Skip) -> Option<Values> {
        let reason = skip
            .reason
            .unwrap_or_else(|| DEFAULT_SKIP_REASON.to_string());
        let _ = self.events.send(RuntimeEvent::Skipped {
            node: self.node,
            reason,
        });
        skip.provides
    }

    fn send(&self, update: Update) {
        let _ = self.events.send(RuntimeEvent::Update {
            node: self.node,
            update,
        });
    }
}
