// src/exec/command.rs

//! Shell-command task bodies, used for tasks declared in a config file.

use std::process::Stdio;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::dag::{Task, Values};
use crate::exec::{Awaitable, Skip, Utils};

/// A task whose body runs `cmd` through the platform shell.
#[derive(Debug, Clone, Default)]
pub struct CommandSpec {
    pub title: String,
    pub cmd: String,
    pub requires: Vec<String>,
    pub provides: Vec<String>,
    pub locks: Vec<String>,
    /// Exit code that means "nothing to do": the task is skipped instead of
    /// failed.
    pub skip_exit_code: Option<i32>,
}

impl CommandSpec {
    pub fn into_task(self) -> Task {
        let CommandSpec {
            title,
            cmd,
            requires,
            provides,
            locks,
            skip_exit_code,
        } = self;

        let body_title = title.clone();
        let body_provides = provides.clone();

        Task::new(title, move |requirements, utils| {
            run_command(
                body_title.clone(),
                cmd.clone(),
                body_provides.clone(),
                skip_exit_code,
                requirements,
                utils,
            )
        })
        .requires(requires)
        .provides(provides)
        .locks(locks)
    }
}

/// Environment variable a requirement is exported as: `KEYDAG_` plus the
/// key uppercased, with anything not alphanumeric replaced by `_`.
pub fn env_var_name(key: &str) -> String {
    let suffix: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("KEYDAG_{suffix}")
}

fn env_var_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn shell(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

async fn run_command(
    title: String,
    cmd: String,
    provides: Vec<String>,
    skip_exit_code: Option<i32>,
    requirements: Values,
    utils: Utils,
) -> Result<Option<Values>> {
    info!(task = %title, cmd = %cmd, "starting task process");

    let mut command = shell(&cmd);
    for (key, value) in &requirements {
        command.env(env_var_name(key), env_var_value(value));
    }

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning process for task '{title}'"))?;

    // Always consume stderr so buffers don't fill; log at debug.
    if let Some(stderr) = child.stderr.take() {
        let task_name = title.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(task = %task_name, "stderr: {}", line);
            }
        });
    }

    if let Some(stdout) = child.stdout.take() {
        utils
            .wait_for(Awaitable::stream(stdout))
            .await
            .with_context(|| format!("reading stdout of task '{title}'"))?;
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{title}'"))?;

    info!(
        task = %title,
        exit_code = ?status.code(),
        success = status.success(),
        "task process exited"
    );

    let provided: Values = provides
        .into_iter()
        .map(|key| (key, Value::Bool(true)))
        .collect();

    match status.code() {
        _ if status.success() => Ok(Some(provided)),
        Some(code) if Some(code) == skip_exit_code => Ok(utils.skip(
            Skip::new()
                .provides(provided)
                .reason(format!("exit code {code}")),
        )),
        Some(code) => bail!("command `{cmd}` exited with code {code}"),
        None => bail!("command `{cmd}` was terminated by a signal"),
    }
}
