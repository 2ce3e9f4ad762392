// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`backend`] provides the `ExecutorBackend` trait and the
//!   [`TokioExecutor`] the runtime uses in production, which tests can
//!   replace with a fake implementation.
//! - [`task_runner`] runs one admitted body and reports its completion.
//! - [`contract`] checks a body's result against its declared provides.
//! - [`utils`] is the handle passed to every body.
//! - [`wait`] covers what `Utils::wait_for` accepts.
//! - [`command`] builds shell-command task bodies.

pub mod backend;
pub mod command;
pub mod contract;
pub mod task_runner;
pub mod utils;
pub mod wait;

pub use backend::{ExecutorBackend, TokioExecutor};
pub use command::CommandSpec;
pub use utils::{Skip, Utils, DEFAULT_SKIP_REASON};
pub use wait::{lines, Awaitable, ByteStream, Observable};
