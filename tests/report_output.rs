use std::error::Error;

use schedsim::config::Workload;
use schedsim::dag::TaskSpec;
use schedsim::engine::{simulate, SimulationOptions};
use schedsim::errors::SimError;
use schedsim::report::{ErrorResponse, KpiSummary, Response, ResultSet};
use schedsim::types::{AllocationPolicy, SchedulingPolicy};
use schedsim_test_utils::builders::{graph, RawTaskBuilder, WorkloadBuilder};
use serde_json::Value;

type TestResult = Result<(), Box<dyn Error>>;

fn chain() -> schedsim::dag::TaskGraph {
    graph(vec![
        TaskSpec::event("A", 5),
        TaskSpec::event("B", 3).with_deps(["A"]),
    ])
}

#[test]
fn test_kpis_on_one_core() -> TestResult {
    let opts = SimulationOptions::new(1, 20, SchedulingPolicy::Fcfs, AllocationPolicy::Static);
    let kpis = KpiSummary::from_result(&simulate(&chain(), &opts)?);

    assert_eq!(kpis.total_execution_time, 8);
    assert_eq!(kpis.total_tasks_executed, 2);
    assert_eq!(kpis.overall_utilization, 1.0);
    assert_eq!(kpis.avg_idle_time_per_task, 0.0);
    assert_eq!(kpis.cores.len(), 1);
    assert_eq!((kpis.cores[0].busy_time, kpis.cores[0].idle_time), (8, 0));
    Ok(())
}

#[test]
fn test_kpis_count_leading_and_trailing_idle() -> TestResult {
    let opts = SimulationOptions::new(2, 20, SchedulingPolicy::Fcfs, AllocationPolicy::Static);
    let result = simulate(&chain(), &opts)?;
    let kpis = KpiSummary::from_result(&result);

    // A runs on core 0 over [0, 5), B on core 1 over [5, 8).
    let c0 = &kpis.cores[0];
    let c1 = &kpis.cores[1];
    assert_eq!((c0.busy_time, c0.idle_time, c0.task_count), (5, 3, 1));
    assert_eq!((c1.busy_time, c1.idle_time, c1.task_count), (3, 5, 1));
    assert_eq!(c0.utilization, 5.0 / 8.0);
    assert_eq!(kpis.overall_utilization, 0.5);
    assert_eq!(kpis.avg_idle_time_per_task, 4.0);
    Ok(())
}

#[test]
fn test_kpis_are_zero_when_nothing_ran() -> TestResult {
    let g = graph(vec![TaskSpec::periodic("P", 5, 1)]);
    let opts = SimulationOptions::new(2, 0, SchedulingPolicy::Fcfs, AllocationPolicy::Dynamic);
    let kpis = KpiSummary::from_result(&simulate(&g, &opts)?);

    assert_eq!(kpis.total_tasks_executed, 0);
    assert_eq!(kpis.overall_utilization, 0.0);
    assert!(kpis.cores.is_empty());
    Ok(())
}

#[test]
fn test_kpis_count_zero_length_instances() -> TestResult {
    let g = graph(vec![TaskSpec::event("A", 0), TaskSpec::event("B", 0)]);
    let opts = SimulationOptions::new(1, 10, SchedulingPolicy::Fcfs, AllocationPolicy::Static);
    let result = simulate(&g, &opts)?;
    assert_eq!(result.finish_time, 0);

    let kpis = KpiSummary::from_result(&result);
    assert_eq!(kpis.total_execution_time, 0);
    assert_eq!(kpis.total_tasks_executed, 2);
    assert_eq!(kpis.overall_utilization, 0.0);
    assert_eq!(kpis.avg_idle_time_per_task, 0.0);
    assert_eq!(kpis.cores.len(), 1);

    let c0 = &kpis.cores[0];
    assert_eq!((c0.busy_time, c0.idle_time, c0.task_count), (0, 0, 2));
    assert_eq!(c0.utilization, 0.0);
    Ok(())
}

#[test]
fn test_single_response_inlines_result_fields() -> TestResult {
    let opts = SimulationOptions::new(1, 20, SchedulingPolicy::Fcfs, AllocationPolicy::Static);
    let response = Response::from(ResultSet::Single(simulate(&chain(), &opts)?));

    let json: Value = serde_json::to_value(&response)?;

    assert_eq!(json["success"], true);
    assert_eq!(json["schedulingPolicy"], "fcfs");
    assert_eq!(json["allocationPolicy"], "static");
    assert_eq!(json["totalExecutionTime"], 8);
    assert_eq!(json["extraWait"], 0);
    assert_eq!(json["executionLog"][1]["task"], "B");
    assert_eq!(json["executionLog"][1]["instance"], 0);
    assert_eq!(json["executionLog"][1]["eligibleTime"], 5);
    assert_eq!(json["executionLog"][1]["start"], 5);
    assert_eq!(json["executionLog"][1]["end"], 8);
    assert_eq!(json["executionLog"][1]["core"], 0);
    assert_eq!(json["nonExecutedTasks"], Value::Array(vec![]));
    assert_eq!(json["allTasks"], serde_json::json!(["A", "B"]));
    assert_eq!(json["kpis"]["overallUtilization"], 1.0);
    Ok(())
}

#[tokio::test]
async fn test_execute_returns_matrix_response() -> TestResult {
    let workload: Workload = WorkloadBuilder::new()
        .cores(2)
        .horizon(20)
        .with_task("A", RawTaskBuilder::event(5).build())
        .with_task("B", RawTaskBuilder::event(3).after("A").build())
        .build();

    let response = schedsim::execute(workload).await?;
    let json = serde_json::to_value(&response)?;

    assert_eq!(json["success"], true);
    for sched in ["fcfs", "pas"] {
        for alloc in ["static", "dynamic"] {
            let result = &json["results"][sched][alloc];
            assert_eq!(result["totalExecutionTime"], 8, "{sched}/{alloc}");
            assert_eq!(result["schedulingPolicy"], sched);
            assert!(result["kpis"].is_object());
        }
    }
    Ok(())
}

#[test]
fn test_error_response_carries_status() -> TestResult {
    let err = SimError::UnknownPolicy("scheduling policy 'rr'".to_string());
    let json = serde_json::to_value(ErrorResponse::from(&err))?;

    assert_eq!(json["success"], false);
    assert_eq!(json["status"], 400);
    assert!(json["error"].as_str().unwrap_or_default().contains("rr"));

    let err = SimError::Worker("panicked".to_string());
    assert_eq!(ErrorResponse::from(&err).status, 500);
    Ok(())
}

#[test]
fn test_encoding_failure_is_an_internal_error() {
    let Err(bad_input) = serde_json::from_str::<Value>("{") else {
        panic!("truncated JSON parsed");
    };
    assert_eq!(SimError::Json(bad_input).status_code(), 400);

    let Err(bad_output) = serde_json::from_str::<Value>("[1,") else {
        panic!("truncated JSON parsed");
    };
    let err = SimError::Encode(bad_output);
    assert_eq!(err.status_code(), 500);
    assert_eq!(ErrorResponse::from(&err).status, 500);
    assert!(err.to_string().starts_with("failed to encode response"));
}
