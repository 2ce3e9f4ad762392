// src/dag/mod.rs

//! Task graph representation and scheduling.
//!
//! - [`task`] holds the caller-supplied task definition.
//! - [`node`] wraps a task with its lifecycle state and display fields.
//! - [`lock`] is the counting semaphore used for shared resources.
//! - [`context`] is the run-scoped, monotonic key/value store.
//! - [`graph`] indexes tasks by the keys they require/provide (targeting,
//!   cycle detection).
//! - [`scheduler`] contains the synchronous state machine that admits
//!   nodes, applies results and implements the failure drain.
//! - [`state_manager`] holds the readiness predicate and admission pass.
//! - [`scheduler_step`] defines the result type for scheduler steps.

pub mod context;
pub mod graph;
pub mod lock;
pub mod node;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task;

pub use context::Context;
pub use graph::{prune_to_targets, KeyGraph};
pub use lock::Lock;
pub use node::{Node, NodeId, NodeState};
pub use scheduler::Scheduler;
pub use scheduler_step::{Admission, SchedulerStep};
pub use task::{Task, TaskFn, TaskFuture, TaskResult, Values};
