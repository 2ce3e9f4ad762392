// src/render/mod.rs

//! Renderer contract and the bundled renderers.
//!
//! The scheduler talks to exactly one [`Renderer`]. Calls are synchronous,
//! made from the runtime loop, and must not block. There is no way for a
//! renderer to fail back into the scheduler.
//!
//! - [`log::TracingRenderer`] turns every update into a `tracing` event
//!   (default for [`crate::RunOptions`]).
//! - [`lines::LineRenderer`] writes one plain line per update.
//! - [`SilentRenderer`] drops everything.
//!
//! Picking a renderer from the environment is left to callers; see
//! [`select_renderer`].

pub mod lines;
pub mod log;

use std::io::IsTerminal;
use std::sync::Arc;

use crate::dag::{Node, NodeState};
use crate::errors::NodeError;
use crate::types::RendererKind;

pub use lines::LineRenderer;
pub use log::TracingRenderer;

/// Payload of `utils.status(..)`, forwarded verbatim.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Status {
    pub message: Option<String>,
    /// Fraction of work done, `0.0..=1.0`.
    pub progress: Option<f64>,
}

impl Status {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            progress: None,
        }
    }

    pub fn progress(progress: f64) -> Self {
        Self {
            message: None,
            progress: Some(progress),
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// A labelled checkpoint inside a running task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub title: String,
}

/// One change reported to the renderer.
#[derive(Debug, Clone)]
pub enum Update {
    State(NodeState),
    Log(String),
    Status(Status),
    Step(Step),
    Skip(String),
    Fail(Arc<NodeError>),
}

impl Update {
    /// Short name of the change kind (`state`, `log`, ...).
    pub fn kind(&self) -> &'static str {
        match self {
            Update::State(_) => "state",
            Update::Log(_) => "log",
            Update::Status(_) => "status",
            Update::Step(_) => "step",
            Update::Skip(_) => "skip",
            Update::Fail(_) => "fail",
        }
    }
}

pub trait Renderer: Send {
    /// Called once before anything is admitted, with every node of the run.
    fn start(&mut self, nodes: &[Node]);

    /// Called for every lifecycle or progress change of `node`.
    ///
    /// The node's display fields already include `update`.
    fn update(&mut self, node: &Node, update: &Update);

    /// Called once after the run settled, successfully or not.
    fn stop(&mut self);
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn start(&mut self, nodes: &[Node]) {
        (**self).start(nodes)
    }

    fn update(&mut self, node: &Node, update: &Update) {
        (**self).update(node, update)
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentRenderer;

impl Renderer for SilentRenderer {
    fn start(&mut self, _nodes: &[Node]) {}

    fn update(&mut self, _node: &Node, _update: &Update) {}

    fn stop(&mut self) {}
}

/// Build the renderer for `kind`.
///
/// `Auto` writes plain lines to stderr when stderr is a terminal and falls
/// back to `tracing` events otherwise.
pub fn select_renderer(kind: RendererKind) -> Box<dyn Renderer> {
    match kind {
        RendererKind::Auto if std::io::stderr().is_terminal() => {
            Box::new(LineRenderer::new(std::io::stderr()))
        }
        RendererKind::Auto | RendererKind::Log => Box::new(TracingRenderer::new()),
        RendererKind::Lines => Box::new(LineRenderer::new(std::io::stderr())),
        RendererKind::Quiet => Box::new(SilentRenderer),
    }
}
