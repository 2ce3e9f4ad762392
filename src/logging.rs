// src/logging.rs

//! `tracing` subscriber for the `keydag` binary.
//!
//! A run writes to two streams. Stdout carries nothing but the final
//! context as pretty JSON, so `keydag > out.json` stays machine-readable.
//! Everything else goes to stderr: the `LineRenderer`'s progress lines, the
//! `TracingRenderer`'s node events and the diagnostics below.
//!
//! The level comes from `--log-level`, then `KEYDAG_LOG`, then `info`. A
//! command's own stderr is logged at `debug` under `keydag::exec::command`,
//! so `KEYDAG_LOG=debug` is the way to see it.

use std::str::FromStr;

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "KEYDAG_LOG";

const DEFAULT_LEVEL: Level = Level::INFO;

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let level = resolve_level(cli_level, env_value.as_deref());

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(())
}

/// An unparsable `KEYDAG_LOG` falls back to the default rather than failing
/// the run.
fn resolve_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Level {
    cli_level
        .map(Level::from)
        .or_else(|| env_value.and_then(parse_level_str))
        .unwrap_or(DEFAULT_LEVEL)
}

fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "warning" => Some(Level::WARN),
        other => Level::from_str(other).ok(),
    }
}

impl From<LogLevel> for Level {
    fn from(lvl: LogLevel) -> Self {
        match lvl {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
