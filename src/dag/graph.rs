// src/dag/graph.rs

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::context::Context;
use crate::dag::node::NodeId;
use crate::dag::task::Task;
use crate::errors::RunError;

/// Task graph expressed through keys: task B depends on task A when B
/// requires a key that A provides.
///
/// Nothing here is consulted while a run is in progress; readiness is
/// always decided against the live context. The graph is used for target
/// pruning and for diagnostics (cycle detection).
#[derive(Debug, Clone)]
pub struct KeyGraph {
    /// Which tasks declare each key in `provides`.
    providers: HashMap<String, Vec<NodeId>>,
    /// Required keys per task, indexed by `NodeId`.
    requires: Vec<Vec<String>>,
}

impl KeyGraph {
    pub fn new(tasks: &[Task]) -> Self {
        Self::from_keys(
            tasks
                .iter()
                .map(|t| (t.required_keys(), t.provided_keys())),
        )
    }

    /// Build from `(requires, provides)` pairs in submission order, for
    /// callers that hold task declarations rather than [`Task`]s.
    pub fn from_keys<'a, I>(decls: I) -> Self
    where
        I: IntoIterator<Item = (&'a [String], &'a [String])>,
    {
        let mut providers: HashMap<String, Vec<NodeId>> = HashMap::new();
        let mut requires = Vec::new();

        for (idx, (required, provided)) in decls.into_iter().enumerate() {
            for key in provided {
                providers.entry(key.clone()).or_default().push(NodeId(idx));
            }
            requires.push(required.to_vec());
        }

        Self {
            providers,
            requires,
        }
    }

    /// Tasks declaring `key` in their provides.
    pub fn providers_of(&self, key: &str) -> &[NodeId] {
        self.providers
            .get(key)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Tasks that provide at least one key `id` requires.
    pub fn dependencies_of(&self, id: NodeId) -> Vec<NodeId> {
        let mut deps = BTreeSet::new();
        if let Some(keys) = self.requires.get(id.0) {
            for key in keys {
                deps.extend(self.providers_of(key).iter().copied());
            }
        }
        deps.into_iter().collect()
    }

    /// Smallest set of tasks needed to produce `targets`.
    ///
    /// Walks backwards from the targeted keys through `requires`, selecting
    /// every provider on the way. Keys already present in `seeded` need no
    /// provider and stop the walk.
    pub fn covering(&self, targets: &[String], seeded: &Context) -> BTreeSet<NodeId> {
        let mut selected = BTreeSet::new();
        let mut visited_keys = BTreeSet::new();
        let mut stack: Vec<&str> = targets.iter().map(|k| k.as_str()).collect();

        while let Some(key) = stack.pop() {
            if !visited_keys.insert(key) || seeded.contains(key) {
                continue;
            }

            for &id in self.providers_of(key) {
                if selected.insert(id) {
                    stack.extend(self.requires[id.0].iter().map(|k| k.as_str()));
                }
            }
        }

        selected
    }

    /// Some task that sits on a dependency cycle, if there is one.
    pub fn find_cycle(&self) -> Option<NodeId> {
        // Edge direction: provider -> consumer.
        let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();

        for idx in 0..self.requires.len() {
            graph.add_node(idx);
        }

        for idx in 0..self.requires.len() {
            for dep in self.dependencies_of(NodeId(idx)) {
                graph.add_edge(dep.0, idx, ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => None,
            Err(cycle) => Some(NodeId(cycle.node_id())),
        }
    }
}

/// Drop every task not needed to produce `targets`.
///
/// Each target must be provided by some task or already be in `seeded`.
/// Surviving tasks keep their relative submission order.
pub fn prune_to_targets(
    tasks: Vec<Task>,
    targets: &[String],
    seeded: &Context,
) -> Result<Vec<Task>, RunError> {
    let graph = KeyGraph::new(&tasks);

    if let Some(key) = targets
        .iter()
        .find(|k| graph.providers_of(k).is_empty() && !seeded.contains(k))
    {
        return Err(RunError::UnknownTarget { key: key.clone() });
    }

    let keep = graph.covering(targets, seeded);

    Ok(tasks
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| keep.contains(&NodeId(*idx)))
        .map(|(_, task)| task)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(title: &str, requires: &[&str], provides: &[&str]) -> Task {
        Task::new(title, |_r, _u| async { Ok(None) })
            .requires(requires.iter().copied())
            .provides(provides.iter().copied())
    }

    fn diamond() -> Vec<Task> {
        vec![
            task("D1", &[], &["1"]),
            task("D2", &["1"], &["2", "3"]),
            task("D3", &["1"], &["4", "5"]),
            task("D4", &["3", "4"], &["6"]),
            task("D5", &["4", "6"], &["7"]),
        ]
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title()).collect()
    }

    #[test]
    fn dependencies_follow_provided_keys() {
        let graph = KeyGraph::new(&diamond());
        assert_eq!(graph.dependencies_of(NodeId(3)), vec![NodeId(1), NodeId(2)]);
        assert_eq!(graph.dependencies_of(NodeId(0)), Vec::<NodeId>::new());
    }

    #[test]
    fn targeting_keeps_only_the_upstream_closure() {
        let pruned = prune_to_targets(diamond(), &["6".to_string()], &Context::new()).unwrap();
        assert_eq!(titles(&pruned), vec!["D1", "D2", "D3", "D4"]);
    }

    #[test]
    fn target_without_dependencies_selects_its_provider_only() {
        let pruned = prune_to_targets(diamond(), &["1".to_string()], &Context::new()).unwrap();
        assert_eq!(titles(&pruned), vec!["D1"]);
    }

    #[test]
    fn seeded_keys_cut_the_walk() {
        let seeded: Context = [("1".to_string(), serde_json::json!(true))]
            .into_iter()
            .collect();
        let pruned = prune_to_targets(diamond(), &["2".to_string()], &seeded).unwrap();
        assert_eq!(titles(&pruned), vec!["D2"]);
    }

    #[test]
    fn unknown_target_is_rejected() {
        let err = prune_to_targets(diamond(), &["nope".to_string()], &Context::new()).unwrap_err();
        assert!(matches!(err, RunError::UnknownTarget { key } if key == "nope"));
    }

    #[test]
    fn declarations_build_the_same_graph_as_tasks() {
        let requires = vec![vec![], vec!["1".to_string()]];
        let provides = vec![vec!["1".to_string()], vec!["2".to_string()]];
        let graph = KeyGraph::from_keys(
            requires
                .iter()
                .zip(provides.iter())
                .map(|(r, p)| (r.as_slice(), p.as_slice())),
        );
        assert_eq!(graph.dependencies_of(NodeId(1)), vec![NodeId(0)]);
        assert_eq!(graph.providers_of("2"), &[NodeId(1)]);
    }

    #[test]
    fn cycles_are_detected() {
        let tasks = vec![task("A", &["b"], &["a"]), task("B", &["a"], &["b"])];
        assert!(KeyGraph::new(&tasks).find_cycle().is_some());
        assert!(KeyGraph::new(&diamond()).find_cycle().is_none());
    }
}
