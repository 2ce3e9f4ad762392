// src/lib.rs

//! keydag runs async tasks ordered by the keys they require and provide.
//!
//! ```no_run
//! use keydag::{run, RunOptions, Task, Values};
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), keydag::RunError> {
//! let tasks = vec![
//!     Task::new("fetch", |_req, _utils| async {
//!         Ok(Some(Values::from([("sources".to_string(), json!("/tmp/src"))])))
//!     })
//!     .provides(["sources"]),
//!     Task::new("build", |req, _utils| async move {
//!         println!("building {}", req["sources"]);
//!         Ok(None)
//!     })
//!     .requires(["sources"])
//!     .provides(["binary"]),
//! ];
//!
//! let context = run(tasks, RunOptions::new()).await?;
//! assert_eq!(context.get("binary"), Some(&json!(true)));
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod render;
pub mod types;

use std::path::PathBuf;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::prune_to_targets;
use crate::errors::Result;
use crate::render::select_renderer;

pub use crate::dag::{Context, Lock, Node, NodeId, NodeState, Task, Values};
pub use crate::engine::{run, RunOptions};
pub use crate::errors::{LockError, NodeError, RunError};
pub use crate::exec::{Awaitable, Skip, Utils};
pub use crate::render::{LineRenderer, Renderer, SilentRenderer, Status, Step, TracingRenderer, Update};
pub use crate::types::RendererKind;

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the config, runs its tasks and prints the final
/// context as JSON on stdout.
pub async fn run_cli(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let targets = if args.targets.is_empty() {
        cfg.config.target.clone()
    } else {
        args.targets.clone()
    };

    if args.dry_run {
        print_dry_run(&cfg, &targets)?;
        return Ok(());
    }

    let renderer = args.renderer.unwrap_or(cfg.config.renderer);
    info!(config = %config_path.display(), ?targets, ?renderer, "starting run");

    let options = RunOptions::new()
        .boxed_renderer(select_renderer(renderer))
        .context(cfg.seeded_context())
        .targets(targets);
    let options = cfg
        .lock_table()
        .into_iter()
        .fold(options, |opts, (name, lock)| opts.lock(name, lock));

    let context = run(cfg.tasks(), options).await?;

    let json = serde_json::to_string_pretty(&context.into_inner()).map_err(anyhow::Error::from)?;
    println!("{json}");
    Ok(())
}

/// Simple dry-run output: print the tasks that would run and their keys.
fn print_dry_run(cfg: &ConfigFile, targets: &[String]) -> Result<()> {
    let selected = if targets.is_empty() {
        cfg.tasks()
    } else {
        prune_to_targets(cfg.tasks(), targets, &cfg.seeded_context())?
    };

    println!("keydag dry-run");
    if !targets.is_empty() {
        println!("  targets = {targets:?}");
    }
    if !cfg.locks.is_empty() {
        println!("  locks = {:?}", cfg.locks);
    }
    println!();

    println!("tasks ({} of {}):", selected.len(), cfg.task.len());
    for task in &selected {
        println!("  - {}", task.title());
        if !task.required_keys().is_empty() {
            println!("      requires: {:?}", task.required_keys());
        }
        if !task.provided_keys().is_empty() {
            println!("      provides: {:?}", task.provided_keys());
        }
        if !task.lock_names().is_empty() {
            println!("      locks: {:?}", task.lock_names());
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
