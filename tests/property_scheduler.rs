// tests/property_scheduler.rs

use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use proptest::prelude::*;

use keydag::dag::Scheduler;
use keydag::engine::TaskOutcome;
use keydag::{Context, Lock, Task};

#[derive(Debug, Clone)]
struct TaskShape {
    requires: BTreeSet<usize>,
    lock: Option<usize>,
}

// We ensure acyclicity by only allowing task N to require keys of tasks
// 0..N-1. Task N provides key `kN`.
fn graph_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<TaskShape>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            (
                proptest::collection::vec(any::<usize>(), 0..3),
                proptest::option::of(0..2usize),
            ),
            num_tasks,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, (deps, lock))| TaskShape {
                    requires: if i == 0 {
                        BTreeSet::new()
                    } else {
                        deps.into_iter().map(|d| d % i).collect()
                    },
                    lock,
                })
                .collect()
        })
    })
}

fn build(shapes: &[TaskShape]) -> Vec<Task> {
    shapes
        .iter()
        .enumerate()
        .map(|(i, shape)| {
            let task = Task::new(format!("task_{i}"), |_r, _u| async { Ok(None) })
                .requires(shape.requires.iter().map(|d| format!("k{d}")))
                .provides([format!("k{i}")]);
            match shape.lock {
                Some(l) => task.locks([format!("lock_{l}")]),
                None => task,
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn acyclic_runs_settle_with_every_key_and_respect_capacity(
        shapes in graph_strategy(12),
        capacities in (1..3usize, 1..3usize),
        // Which in-flight node completes next, as an index into the in-flight list.
        picks in proptest::collection::vec(any::<usize>(), 64),
    ) {
        let locks = HashMap::from([
            ("lock_0".to_string(), Lock::new(capacities.0)),
            ("lock_1".to_string(), Lock::new(capacities.1)),
        ]);
        let mut scheduler = Scheduler::new(build(&shapes), Context::new(), locks, &[]).unwrap();

        let mut in_flight: Vec<keydag::NodeId> = scheduler
            .start()
            .unwrap()
            .admitted
            .into_iter()
            .map(|a| a.node)
            .collect();

        let mut steps = 0;
        while !in_flight.is_empty() {
            prop_assert!(scheduler.lock("lock_0").unwrap().held() <= capacities.0);
            prop_assert!(scheduler.lock("lock_1").unwrap().held() <= capacities.1);

            let pick = picks[steps % picks.len()] % in_flight.len();
            let node = in_flight.swap_remove(pick);

            let step = scheduler
                .complete(node, TaskOutcome::Returned(None), Instant::now())
                .unwrap();
            in_flight.extend(step.admitted.into_iter().map(|a| a.node));

            steps += 1;
            prop_assert!(steps <= shapes.len(), "more completions than tasks");
        }

        prop_assert!(scheduler.is_settled());
        let ctx = scheduler.into_result().unwrap();
        let expected: Vec<String> = {
            let mut keys: Vec<String> = (0..shapes.len()).map(|i| format!("k{i}")).collect();
            keys.sort();
            keys
        };
        prop_assert_eq!(ctx.keys().map(str::to_string).collect::<Vec<_>>(), expected);
    }
}
