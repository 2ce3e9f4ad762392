// src/render/lines.rs

use std::io::Write;

use crate::dag::{Node, NodeState};
use crate::render::{Renderer, Update};

/// Line-oriented renderer: one `[title] ...` line per update.
///
/// Write errors are ignored; a broken output stream must not affect the run.
#[derive(Debug)]
pub struct LineRenderer<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> LineRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, title: &str, text: &str) {
        let _ = writeln!(self.out, "[{title}] {text}");
    }
}

impl<W: Write + Send> Renderer for LineRenderer<W> {
    fn start(&mut self, nodes: &[Node]) {
        let _ = writeln!(self.out, "starting {} task(s)", nodes.len());
    }

    fn update(&mut self, node: &Node, update: &Update) {
        let title = node.title();
        match update {
            Update::State(NodeState::Running) => self.line(title, "running"),
            Update::State(NodeState::Finished) => {
                let text = match node.started_at.zip(node.finished_at) {
                    Some((s, f)) => format!("finished in {:.1?}", f.duration_since(s)),
                    None => "finished".to_string(),
                };
                self.line(title, &text);
            }
            Update::State(state) => self.line(title, state.as_str()),
            Update::Log(text) => self.line(title, &format!("| {text}")),
            Update::Status(status) => {
                let text = match (&status.message, status.progress) {
                    (Some(m), Some(p)) => format!("{m} ({:.0}%)", p * 100.0),
                    (Some(m), None) => m.clone(),
                    (None, Some(p)) => format!("{:.0}%", p * 100.0),
                    (None, None) => return,
                };
                self.line(title, &text);
            }
            Update::Step(step) => self.line(title, &format!("> {}", step.title)),
            Update::Skip(reason) => self.line(title, &format!("skipped: {reason}")),
            Update::Fail(error) => self.line(title, &format!("error: {error}")),
        }
    }

    fn stop(&mut self) {
        let _ = self.out.flush();
    }
}
