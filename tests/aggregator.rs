use std::sync::Arc;

use schedsim::dag::{TaskGraph, TaskSpec};
use schedsim::engine::{simulate, SimulationOptions};
use schedsim::errors::SimError;
use schedsim::report::{run_selection, run_selection_blocking, PolicySelection, ResultSet};
use schedsim::types::{AllocationPolicy, PolicyChoice, SchedulingPolicy};
use schedsim_test_utils::builders::graph;
use schedsim_test_utils::{init_tracing, with_timeout};

fn workload() -> TaskGraph {
    graph(vec![
        TaskSpec::periodic("tick", 10, 2).with_priority(3),
        TaskSpec::event("boot", 6).with_priority(8),
        TaskSpec::event("report", 1).with_deps(["boot", "tick"]),
    ])
}

fn base() -> SimulationOptions {
    SimulationOptions::new(2, 40, SchedulingPolicy::Fcfs, AllocationPolicy::Static)
}

#[test]
fn test_selection_expands_to_cross_product() {
    let pairs = PolicySelection::all().pairs();
    assert_eq!(
        pairs,
        vec![
            (SchedulingPolicy::Fcfs, AllocationPolicy::Static),
            (SchedulingPolicy::Fcfs, AllocationPolicy::Dynamic),
            (SchedulingPolicy::Pas, AllocationPolicy::Static),
            (SchedulingPolicy::Pas, AllocationPolicy::Dynamic),
        ]
    );

    let one_axis = PolicySelection {
        scheduling: PolicyChoice::Only(SchedulingPolicy::Pas),
        allocation: PolicyChoice::All,
    };
    assert_eq!(one_axis.pairs().len(), 2);
    assert!(!one_axis.is_single());
    assert!(PolicySelection::single(SchedulingPolicy::Pas, AllocationPolicy::Static).is_single());
}

#[tokio::test]
async fn test_all_combinations_match_individual_runs() {
    init_tracing();
    let g = Arc::new(workload());

    let set = with_timeout(run_selection(Arc::clone(&g), base(), PolicySelection::all()))
        .await
        .unwrap();

    let ResultSet::Matrix(ref matrix) = set else {
        panic!("Expected a result matrix, got a single result");
    };
    assert_eq!(matrix.len(), 2);
    assert_eq!(set.len(), 4);

    for scheduling in SchedulingPolicy::ALL {
        for allocation in AllocationPolicy::ALL {
            let expected = simulate(&g, &base().with_policies(scheduling, allocation)).unwrap();
            let got = set.get(scheduling, allocation).unwrap();
            assert_eq!(got, &expected);
        }
    }
}

#[tokio::test]
async fn test_single_pair_yields_single_result() {
    let g = Arc::new(workload());
    let selection = PolicySelection::single(SchedulingPolicy::Pas, AllocationPolicy::Dynamic);

    let set = with_timeout(run_selection(g, base(), selection)).await.unwrap();

    match set {
        ResultSet::Single(ref result) => {
            assert_eq!(result.scheduling_policy, SchedulingPolicy::Pas);
            assert_eq!(result.allocation_policy, AllocationPolicy::Dynamic);
        }
        ResultSet::Matrix(_) => panic!("Expected a single result"),
    }
    assert!(set.get(SchedulingPolicy::Fcfs, AllocationPolicy::Dynamic).is_none());
}

#[tokio::test]
async fn test_failing_combination_fails_whole_request() {
    let g = Arc::new(graph(vec![
        TaskSpec::event("A", 1).with_affinity(5),
        TaskSpec::event("B", 1),
    ]));

    let result = with_timeout(run_selection(g, base(), PolicySelection::all())).await;

    match result {
        Err(SimError::Validation(msg)) => assert!(msg.contains("affinity")),
        Err(e) => panic!("Expected Validation error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[tokio::test]
async fn test_parallel_and_sequential_runs_agree() {
    let g = workload();
    let selection = PolicySelection::all();

    let sequential = run_selection_blocking(&g, &base(), selection).unwrap();
    let parallel = with_timeout(run_selection(Arc::new(g), base(), selection))
        .await
        .unwrap();

    assert_eq!(sequential, parallel);
}

#[tokio::test]
async fn test_invalid_base_options_fail_fast() {
    let g = Arc::new(workload());
    let opts = base().with_aging_factor(-1.0);

    let result = run_selection(g, opts, PolicySelection::all()).await;
    assert!(matches!(result, Err(SimError::Validation(_))));
}
