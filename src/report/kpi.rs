// src/report/kpi.rs

use serde::Serialize;

use crate::engine::SimulationResult;
use crate::types::Tick;

/// Busy/idle breakdown of one core over `[0, total execution time)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreKpi {
    pub core_id: usize,
    pub busy_time: Tick,
    pub idle_time: Tick,
    pub utilization: f64,
    pub task_count: usize,
}

/// Utilization summary derived from a [`SimulationResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    pub total_execution_time: Tick,
    pub overall_utilization: f64,
    pub avg_idle_time_per_task: f64,
    pub total_tasks_executed: usize,
    pub cores: Vec<CoreKpi>,
}

impl KpiSummary {
    pub fn from_result(result: &SimulationResult) -> Self {
        let total = result.finish_time;

        if result.entries.is_empty() {
            return Self {
                total_execution_time: total,
                overall_utilization: 0.0,
                avg_idle_time_per_task: 0.0,
                total_tasks_executed: 0,
                cores: Vec::new(),
            };
        }

        let cores: Vec<CoreKpi> = (0..result.cores)
            .map(|core| core_kpi(result, core, total))
            .collect();

        let busy: Tick = cores.iter().map(|c| c.busy_time).sum();
        let idle: Tick = cores.iter().map(|c| c.idle_time).sum();
        let executed = result.entries.len();

        Self {
            total_execution_time: total,
            overall_utilization: ratio(busy, total.saturating_mul(result.cores as Tick)),
            avg_idle_time_per_task: idle as f64 / executed as f64,
            total_tasks_executed: executed,
            cores,
        }
    }
}

fn core_kpi(result: &SimulationResult, core: usize, total: Tick) -> CoreKpi {
    let mut spans: Vec<(Tick, Tick)> = result
        .entries_on(core)
        .map(|e| (e.start, e.finish))
        .collect();
    spans.sort();

    let mut busy = 0;
    let mut idle = 0;
    let mut last_end = 0;

    for (start, finish) in spans.iter().copied() {
        busy += finish.saturating_sub(start);
        if start > last_end {
            idle += start - last_end;
        }
        last_end = last_end.max(finish);
    }
    idle += total.saturating_sub(last_end);

    CoreKpi {
        core_id: core,
        busy_time: busy,
        idle_time: idle,
        utilization: ratio(busy, total),
        task_count: spans.len(),
    }
}

/// `part / whole`, or 0 for an empty window.
fn ratio(part: Tick, whole: Tick) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}
