// src/config/validate.rs

use tracing::debug;

use crate::config::model::{LooseValue, RawSettings, RawTask, RawWorkload, Settings, Workload};
use crate::dag::{TaskGraph, TaskSpec};
use crate::errors::{Result, SimError};
use crate::types::{AllocationPolicy, PolicyChoice, SchedulingPolicy, TaskKind, Tick};

impl TryFrom<RawWorkload> for Workload {
    type Error = SimError;

    fn try_from(raw: RawWorkload) -> std::result::Result<Self, Self::Error> {
        let settings = validate_settings(&raw.config)?;

        let specs = raw
            .task
            .iter()
            .map(|(key, task)| task_spec(key, task))
            .collect::<Result<Vec<_>>>()?;

        let graph = TaskGraph::build(specs)?;
        debug!(tasks = graph.len(), cores = settings.cores, "workload validated");

        Ok(Workload::new_unchecked(settings, graph))
    }
}

fn validate_settings(raw: &RawSettings) -> Result<Settings> {
    let defaults = Settings::default();

    let cores = match present(&raw.cores) {
        Some(v) => {
            let n = v.as_i64().ok_or_else(|| setting_error("cores", v))?;
            if n < 1 {
                return Err(SimError::Validation(format!(
                    "[config].cores must be >= 1 (got {n})"
                )));
            }
            n as usize
        }
        None => defaults.cores,
    };

    let horizon = match present(&raw.horizon) {
        Some(v) => non_negative(v).ok_or_else(|| setting_error("horizon", v))?,
        None => defaults.horizon,
    };

    let scheduling: PolicyChoice<SchedulingPolicy> = match raw.scheduling_policy.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => s.parse()?,
        _ => defaults.scheduling,
    };

    let allocation: PolicyChoice<AllocationPolicy> = match raw.allocation_policy.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => s.parse()?,
        _ => defaults.allocation,
    };

    let aging_factor = match present(&raw.aging_factor) {
        Some(v) => v
            .as_f64()
            .filter(|f| f.is_finite() && *f > 0.0)
            .ok_or_else(|| setting_error("aging_factor", v))?,
        None => defaults.aging_factor,
    };

    let max_iterations = match present(&raw.max_iterations) {
        Some(v) => non_negative(v)
            .filter(|n| *n >= 1)
            .ok_or_else(|| setting_error("max_iterations", v))?,
        None => defaults.max_iterations,
    };

    Ok(Settings {
        cores,
        horizon,
        scheduling,
        allocation,
        aging_factor,
        max_iterations,
    })
}

fn task_spec(key: &str, raw: &RawTask) -> Result<TaskSpec> {
    let kind = match raw.kind.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => s.parse::<TaskKind>().map_err(|_| {
            SimError::Validation(format!(
                "task '{key}': invalid type '{s}' (expected \"event\" or \"periodic\")"
            ))
        })?,
        _ => TaskKind::default(),
    };

    let execution_time = match present(&raw.execution_time) {
        Some(v) => non_negative(v).ok_or_else(|| field_error(key, "execution_time", v))?,
        None => {
            return Err(SimError::Validation(format!(
                "task '{key}': missing execution_time"
            )));
        }
    };

    let mut spec = match kind {
        TaskKind::Event => TaskSpec::event(key, execution_time),
        TaskKind::Periodic => {
            let period = match present(&raw.period) {
                Some(v) => non_negative(v)
                    .filter(|p| *p > 0)
                    .ok_or_else(|| field_error(key, "period", v))?,
                None => {
                    return Err(SimError::Validation(format!(
                        "task '{key}': periodic task needs a positive period"
                    )));
                }
            };
            TaskSpec::periodic(key, period, execution_time)
        }
    };

    let deps = if raw.deps.iter().any(|d| !d.is_blank()) {
        &raw.deps
    } else {
        &raw.dependencies
    };
    spec = spec.with_deps(deps.iter().filter(|d| !d.is_blank()).map(|d| d.to_string()));

    let priority = match present(&raw.priority).or(present(&raw.criticality)) {
        Some(v) => v.as_i64().ok_or_else(|| {
            SimError::Validation(format!(
                "task '{key}': invalid priority '{v}' (expected an integer)"
            ))
        })?,
        None => 0,
    };
    spec = spec.with_priority(priority);

    if let Some(v) = present(&raw.affinity) {
        let core = non_negative(v).ok_or_else(|| field_error(key, "affinity", v))?;
        spec = spec.with_affinity(core as usize);
    }

    if let Some(id) = present(&raw.id) {
        spec = spec.with_external_id(id.to_string());
    }

    Ok(spec)
}

/// The value, unless missing or blank.
fn present(value: &Option<LooseValue>) -> Option<&LooseValue> {
    value.as_ref().filter(|v| !v.is_blank())
}

fn non_negative(value: &LooseValue) -> Option<Tick> {
    value.as_i64().and_then(|n| Tick::try_from(n).ok())
}

fn field_error(task: &str, field: &str, value: &LooseValue) -> SimError {
    SimError::Validation(format!(
        "task '{task}': invalid {field} '{value}' (expected a non-negative integer)"
    ))
}

fn setting_error(field: &str, value: &LooseValue) -> SimError {
    SimError::Validation(format!("[config].{field}: invalid value '{value}'"))
}
