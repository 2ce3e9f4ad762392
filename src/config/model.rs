// src/config/model.rs

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use serde_json::Value;

use crate::dag::{Context, Lock, Task};
use crate::exec::CommandSpec;
use crate::types::RendererKind;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// renderer = "auto"
/// target = ["bundle"]
///
/// [locks]
/// network = 2
///
/// [context]
/// channel = "stable"
///
/// [task.fetch]
/// cmd = "git fetch"
/// provides = ["sources"]
/// locks = ["network"]
/// ```
///
/// All sections except `[task.<id>]` are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Lock name to capacity.
    #[serde(default)]
    pub locks: BTreeMap<String, usize>,

    /// Values seeded into the run context before anything starts.
    #[serde(default)]
    pub context: BTreeMap<String, Value>,

    /// All tasks from `[task.<id>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigSection {
    #[serde(default)]
    pub renderer: RendererKind,

    /// Keys to produce when none are given on the command line; empty runs
    /// every task.
    #[serde(default)]
    pub target: Vec<String>,
}

/// `[task.<id>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfig {
    /// Display title; defaults to the task id.
    #[serde(default)]
    pub title: Option<String>,

    /// Shell command to run.
    pub cmd: String,

    #[serde(default)]
    pub requires: Vec<String>,

    #[serde(default)]
    pub provides: Vec<String>,

    #[serde(default)]
    pub locks: Vec<String>,

    /// Exit code meaning "skipped" instead of "failed".
    #[serde(default)]
    pub skip_exit_code: Option<i32>,
}

impl TaskConfig {
    pub fn effective_title<'a>(&'a self, id: &'a str) -> &'a str {
        self.title.as_deref().unwrap_or(id)
    }
}

/// A validated configuration. Obtain one with `ConfigFile::try_from(raw)`
/// or [`crate::config::load_and_validate`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub locks: BTreeMap<String, usize>,
    pub context: BTreeMap<String, Value>,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            locks: raw.locks,
            context: raw.context,
            task: raw.task,
        }
    }

    /// One command task per `[task.<id>]`, submitted in id order.
    pub fn tasks(&self) -> Vec<Task> {
        self.task
            .iter()
            .map(|(id, task)| {
                CommandSpec {
                    title: task.effective_title(id).to_string(),
                    cmd: task.cmd.clone(),
                    requires: task.requires.clone(),
                    provides: task.provides.clone(),
                    locks: task.locks.clone(),
                    skip_exit_code: task.skip_exit_code,
                }
                .into_task()
            })
            .collect()
    }

    pub fn lock_table(&self) -> HashMap<String, Lock> {
        self.locks
            .iter()
            .map(|(name, capacity)| (name.clone(), Lock::new(*capacity)))
            .collect()
    }

    pub fn seeded_context(&self) -> Context {
        self.context
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
