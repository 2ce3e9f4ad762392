use std::sync::{Arc, Mutex};

use keydag::{Node, NodeState, Renderer, Update};

/// One call the renderer received.
#[derive(Debug, Clone)]
pub enum RenderEvent {
    Start(Vec<String>),
    Update { title: String, update: Update },
    Stop,
}

/// A renderer that records every call. Clones share the same record, so a
/// test keeps one clone and hands the other to `RunOptions`.
#[derive(Debug, Clone, Default)]
pub struct FakeRenderer {
    events: Arc<Mutex<Vec<RenderEvent>>>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RenderEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Every `(title, update)` pair, in the order received.
    pub fn updates(&self) -> Vec<(String, Update)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RenderEvent::Update { title, update } => Some((title, update)),
                _ => None,
            })
            .collect()
    }

    /// The state transitions reported for `title`.
    pub fn states_of(&self, title: &str) -> Vec<NodeState> {
        self.updates()
            .into_iter()
            .filter(|(t, _)| t == title)
            .filter_map(|(_, u)| match u {
                Update::State(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    /// Titles in the order they entered `state`.
    pub fn entered(&self, state: NodeState) -> Vec<String> {
        self.updates()
            .into_iter()
            .filter(|(_, u)| matches!(u, Update::State(s) if *s == state))
            .map(|(t, _)| t)
            .collect()
    }

    pub fn logs_of(&self, title: &str) -> Vec<String> {
        self.updates()
            .into_iter()
            .filter(|(t, _)| t == title)
            .filter_map(|(_, u)| match u {
                Update::Log(line) => Some(line),
                _ => None,
            })
            .collect()
    }

    /// Error messages of every `fail` update, in order.
    pub fn failures(&self) -> Vec<(String, String)> {
        self.updates()
            .into_iter()
            .filter_map(|(t, u)| match u {
                Update::Fail(err) => Some((t, err.to_string())),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: RenderEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl Renderer for FakeRenderer {
    fn start(&mut self, nodes: &[Node]) {
        self.push(RenderEvent::Start(
            nodes.iter().map(|n| n.title().to_string()).collect(),
        ));
    }

    fn update(&mut self, node: &Node, update: &Update) {
        self.push(RenderEvent::Update {
            title: node.title().to_string(),
            update: update.clone(),
        });
    }

    fn stop(&mut self) {
        self.push(RenderEvent::Stop);
    }
}
