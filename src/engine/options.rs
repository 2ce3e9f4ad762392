// src/engine/options.rs

use std::collections::HashMap;
use std::fmt;

use crate::dag::{Context, Lock};
use crate::render::{Renderer, TracingRenderer};

/// Everything `run` accepts besides the tasks.
///
/// ```
/// use keydag::{Lock, RunOptions, SilentRenderer};
///
/// let options = RunOptions::new()
///     .renderer(SilentRenderer)
///     .lock("network", Lock::new(2))
///     .target("bundle");
/// # let _ = options;
/// ```
pub struct RunOptions {
    pub renderer: Box<dyn Renderer>,
    pub locks: HashMap<String, Lock>,
    /// Keys to produce; empty means run everything.
    pub targets: Vec<String>,
    /// Values present before any task runs.
    pub context: Context,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    pub fn boxed_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn lock(mut self, name: impl Into<String>, lock: Lock) -> Self {
        self.locks.insert(name.into(), lock);
        self
    }

    pub fn target(mut self, key: impl Into<String>) -> Self {
        self.targets.push(key.into());
        self
    }

    pub fn targets<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            renderer: Box::new(TracingRenderer::new()),
            locks: HashMap::new(),
            targets: Vec::new(),
            context: Context::new(),
        }
    }
}

impl fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("locks", &self.locks)
            .field("targets", &self.targets)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
