// src/config/validate.rs

use std::collections::HashMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::dag::KeyGraph;
use crate::errors::{KeydagError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = KeydagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_commands(cfg)?;
    validate_locks(cfg)?;
    let providers = provider_index(cfg)?;
    validate_requirements(cfg, &providers)?;
    validate_dag(cfg)?;
    validate_targets(cfg, &providers)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(KeydagError::ConfigError(
            "config must contain at least one [task.<id>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_commands(cfg: &RawConfigFile) -> Result<()> {
    for (id, task) in cfg.task.iter() {
        if task.cmd.trim().is_empty() {
            return Err(KeydagError::ConfigError(format!(
                "task '{id}' has an empty `cmd`"
            )));
        }
        if task.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(KeydagError::ConfigError(format!(
                "task '{id}' has an empty `title`"
            )));
        }
    }
    Ok(())
}

fn validate_locks(cfg: &RawConfigFile) -> Result<()> {
    for (name, capacity) in cfg.locks.iter() {
        if *capacity == 0 {
            return Err(KeydagError::ConfigError(format!(
                "[locks].{name} must be >= 1 (got 0)"
            )));
        }
    }

    for (id, task) in cfg.task.iter() {
        for lock in task.locks.iter() {
            if !cfg.locks.contains_key(lock) {
                return Err(KeydagError::ConfigError(format!(
                    "task '{id}' uses lock '{lock}', which is not declared in [locks]"
                )));
            }
        }
    }
    Ok(())
}

/// Key to the id of the task providing it. Also rejects keys provided twice
/// or provided by a task while already seeded in `[context]`.
fn provider_index(cfg: &RawConfigFile) -> Result<HashMap<&str, &str>> {
    let mut providers: HashMap<&str, &str> = HashMap::new();

    for (id, task) in cfg.task.iter() {
        for key in task.provides.iter() {
            if cfg.context.contains_key(key) {
                return Err(KeydagError::ConfigError(format!(
                    "task '{id}' provides '{key}', which is already seeded in [context]"
                )));
            }
            if let Some(other) = providers.insert(key.as_str(), id.as_str()) {
                if other != id {
                    return Err(KeydagError::ConfigError(format!(
                        "key '{key}' is provided by both '{other}' and '{id}'"
                    )));
                }
            }
        }
    }

    Ok(providers)
}

fn validate_requirements(cfg: &RawConfigFile, providers: &HashMap<&str, &str>) -> Result<()> {
    for (id, task) in cfg.task.iter() {
        for key in task.requires.iter() {
            if !providers.contains_key(key.as_str()) && !cfg.context.contains_key(key) {
                return Err(KeydagError::ConfigError(format!(
                    "task '{id}' requires '{key}', which no task provides and [context] does not seed"
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    let graph = KeyGraph::from_keys(
        cfg.task
            .values()
            .map(|t| (t.requires.as_slice(), t.provides.as_slice())),
    );

    match graph.find_cycle() {
        None => Ok(()),
        Some(node) => {
            let id = cfg
                .task
                .keys()
                .nth(node.0)
                .map(String::as_str)
                .unwrap_or("?");
            Err(KeydagError::DagCycle(format!(
                "cycle detected in task graph involving task '{id}'"
            )))
        }
    }
}

fn validate_targets(cfg: &RawConfigFile, providers: &HashMap<&str, &str>) -> Result<()> {
    for key in cfg.config.target.iter() {
        if !providers.contains_key(key.as_str()) && !cfg.context.contains_key(key) {
            return Err(KeydagError::ConfigError(format!(
                "[config].target '{key}' is not provided by any task"
            )));
        }
    }
    Ok(())
}
