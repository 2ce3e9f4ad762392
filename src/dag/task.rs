// src/dag/task.rs

//! Caller-supplied units of work.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use crate::exec::Utils;

/// Key/value mapping used for requirements and results.
pub type Values = BTreeMap<String, Value>;

/// What a task body resolves with: its provides mapping, or nothing.
pub type TaskResult = anyhow::Result<Option<Values>>;

pub type TaskFuture = BoxFuture<'static, TaskResult>;

/// Type-erased task body.
pub type TaskFn = Arc<dyn Fn(Values, Utils) -> TaskFuture + Send + Sync>;

/// A unit of work: what it needs, what it produces, which shared resources
/// it holds while running, and the body itself.
///
/// ```no_run
/// use keydag::Task;
///
/// let task = Task::new("compile", |req, _utils| async move {
///     let _sources = &req["sources"];
///     Ok(None)
/// })
/// .requires(["sources"])
/// .provides(["binary"])
/// .locks(["cpu"]);
/// # let _ = task;
/// ```
#[derive(Clone)]
pub struct Task {
    title: String,
    requires: Vec<String>,
    provides: Vec<String>,
    locks: Vec<String>,
    run: TaskFn,
}

impl Task {
    pub fn new<F, Fut>(title: impl Into<String>, run: F) -> Self
    where
        F: Fn(Values, Utils) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskResult> + Send + 'static,
    {
        Self {
            title: title.into(),
            requires: Vec::new(),
            provides: Vec::new(),
            locks: Vec::new(),
            run: Arc::new(move |req, utils| run(req, utils).boxed()),
        }
    }

    /// Keys that must exist in the context before this task may start.
    pub fn requires<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_unique(&mut self.requires, keys);
        self
    }

    /// Keys this task contributes to the context.
    pub fn provides<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_unique(&mut self.provides, keys);
        self
    }

    /// Named locks held for the whole time the task runs.
    pub fn locks<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_unique(&mut self.locks, names);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn required_keys(&self) -> &[String] {
        &self.requires
    }

    pub fn provided_keys(&self) -> &[String] {
        &self.provides
    }

    pub fn lock_names(&self) -> &[String] {
        &self.locks
    }

    pub(crate) fn body(&self) -> TaskFn {
        Arc::clone(&self.run)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("title", &self.title)
            .field("requires", &self.requires)
            .field("provides", &self.provides)
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

/// Append keys, keeping first-seen order and dropping duplicates.
fn extend_unique<I, S>(target: &mut Vec<String>, keys: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    for key in keys {
        let key = key.into();
        if !target.contains(&key) {
            target.push(key);
        }
    }
}
