use std::collections::BTreeSet;

use schedsim::dag::TaskSpec;
use schedsim::engine::{simulate, SimulationOptions};
use schedsim::types::{AllocationPolicy, SchedulingPolicy};
use schedsim_test_utils::builders::graph;
use schedsim_test_utils::init_tracing;
use schedsim_test_utils::invariants::assert_schedule;

fn keys(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_periodic_instances_eligible_past_horizon_are_not_executed() {
    init_tracing();
    let g = graph(vec![
        TaskSpec::event("E", 50),
        TaskSpec::periodic("P", 10, 2).with_deps(["E"]),
    ]);
    let opts = SimulationOptions::new(1, 25, SchedulingPolicy::Fcfs, AllocationPolicy::Dynamic);

    let result = simulate(&g, &opts).unwrap();

    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].task, "E");
    assert_eq!(result.finish_time, 50);
    assert_eq!(result.non_executed, keys(&["P"]));
    assert_eq!(result.all_tasks, keys(&["E", "P"]));
}

#[test]
fn test_event_tasks_are_not_bound_by_horizon() {
    let g = graph(vec![
        TaskSpec::event("A", 5),
        TaskSpec::event("B", 5).with_deps(["A"]),
    ]);
    let opts = SimulationOptions::new(1, 0, SchedulingPolicy::Pas, AllocationPolicy::Static);

    let result = simulate(&g, &opts).unwrap();

    assert_eq!(result.entries.len(), 2);
    assert_eq!(result.finish_time, 10);
    assert!(result.non_executed.is_empty());
}

#[test]
fn test_zero_horizon_releases_no_periodic_instances() {
    let g = graph(vec![TaskSpec::periodic("P", 5, 1)]);
    let opts = SimulationOptions::new(2, 0, SchedulingPolicy::Fcfs, AllocationPolicy::Dynamic);

    let result = simulate(&g, &opts).unwrap();

    assert!(result.entries.is_empty());
    assert_eq!(result.finish_time, 0);
    assert_eq!(result.extra_wait, 0);
    // No instance ever existed, so nothing was left unexecuted.
    assert!(result.non_executed.is_empty());
    assert_eq!(result.all_tasks, keys(&["P"]));
}

#[test]
fn test_iteration_limit_stops_the_run() {
    let g = graph(vec![
        TaskSpec::event("A", 5),
        TaskSpec::event("B", 3).with_deps(["A"]),
    ]);
    let opts = SimulationOptions::new(1, 20, SchedulingPolicy::Fcfs, AllocationPolicy::Static)
        .with_max_iterations(1);

    let result = simulate(&g, &opts).unwrap();

    // A was already dispatched when the limit hit; B never started.
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].task, "A");
    assert_eq!(result.non_executed, keys(&["B"]));
    assert_schedule(&g, &opts, &result);
}

#[test]
fn test_dependents_of_unexecuted_instances_are_not_executed() {
    let g = graph(vec![
        TaskSpec::event("gate", 30),
        TaskSpec::periodic("P", 10, 1).with_deps(["gate"]),
        TaskSpec::event("after", 1).with_deps(["P"]),
    ]);
    let opts = SimulationOptions::new(2, 20, SchedulingPolicy::Fcfs, AllocationPolicy::Dynamic);

    let result = simulate(&g, &opts).unwrap();

    assert_eq!(result.non_executed, keys(&["P", "after"]));
    assert_eq!(result.entries_for("gate").count(), 1);
    assert_schedule(&g, &opts, &result);
}

#[test]
fn test_invalid_options_fail_before_simulating() {
    let g = graph(vec![TaskSpec::event("A", 1)]);

    let bad_aging = SimulationOptions::new(1, 10, SchedulingPolicy::Pas, AllocationPolicy::Dynamic)
        .with_aging_factor(0.0);
    assert!(simulate(&g, &bad_aging).is_err());

    let bad_limit = SimulationOptions::new(1, 10, SchedulingPolicy::Pas, AllocationPolicy::Dynamic)
        .with_max_iterations(0);
    assert!(simulate(&g, &bad_limit).is_err());
}
