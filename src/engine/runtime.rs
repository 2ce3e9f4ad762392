// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dag::{Admission, Context};
use crate::errors::RunError;
use crate::exec::ExecutorBackend;
use crate::render::Renderer;

use super::core::CoreRuntime;
use super::{CoreCommand, CoreStep, RuntimeEvent};

/// Drives the scheduler in response to `RuntimeEvent`s, forwards updates to
/// the renderer and delegates task bodies to an `ExecutorBackend`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    renderer: Box<dyn Renderer>,
    event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(
        core: CoreRuntime,
        renderer: Box<dyn Renderer>,
        event_rx: mpsc::UnboundedReceiver<RuntimeEvent>,
        executor: E,
    ) -> Self {
        Self {
            core,
            renderer,
            event_rx,
            executor,
        }
    }

    /// Run until nothing is in flight, then return the final context or the
    /// first failure.
    ///
    /// The renderer's `start` is called before the first admission and its
    /// `stop` once the loop ends, whatever the result.
    pub async fn run(mut self) -> Result<Context, RunError> {
        info!(
            tasks = self.core.scheduler().nodes().len(),
            "keydag runtime started"
        );
        self.renderer.start(self.core.scheduler().nodes());

        let driven = self.drive().await;
        self.renderer.stop();

        driven?;
        info!("runtime exiting");
        self.core.into_result()
    }

    async fn drive(&mut self) -> Result<(), RunError> {
        let step = self.core.start()?;
        let mut keep_running = self.execute_step(step).await?;

        while keep_running {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    warn!(
                        in_flight = self.core.scheduler().in_flight(),
                        "runtime event channel closed before the run settled"
                    );
                    return Err(RunError::ChannelClosed);
                }
            };

            debug!(?event, "runtime received event");

            // Feed the event into the pure core and get commands back.
            let step = self.core.step(event)?;
            keep_running = self.execute_step(step).await?;
        }

        Ok(())
    }

    async fn execute_step(&mut self, step: CoreStep) -> Result<bool, RunError> {
        for command in step.commands {
            self.execute_command(command).await?;
        }
        Ok(step.keep_running)
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<(), RunError> {
        match command {
            CoreCommand::Render { node, update } => {
                if let Some(node) = self.core.scheduler().node(node) {
                    self.renderer.update(node, &update);
                }
            }
            CoreCommand::Dispatch(admitted) => {
                self.dispatch(admitted).await?;
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self, admitted: Vec<Admission>) -> Result<(), RunError> {
        let titles: Vec<_> = admitted.iter().map(|a| a.title.as_str()).collect();
        debug!(?titles, "dispatching admitted tasks");

        self.executor.spawn_admitted(admitted).await
    }
}
