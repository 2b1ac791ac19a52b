// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod report;
pub mod types;

use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::{Settings, Workload};
use crate::errors::{Result, SimError};
use crate::report::{run_selection, PolicySelection, Response};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the workload, applies CLI overrides, runs every
/// requested policy combination and prints the JSON response to stdout.
pub async fn run(args: CliArgs) -> Result<()> {
    let mut workload = load_and_validate(&args.workload)?;
    apply_overrides(&mut workload.settings, &args)?;

    if args.dry_run {
        print_dry_run(&workload);
        return Ok(());
    }

    let response = execute(workload).await?;

    let json = if args.compact {
        serde_json::to_string(&response).map_err(SimError::Encode)?
    } else {
        serde_json::to_string_pretty(&response).map_err(SimError::Encode)?
    };
    println!("{json}");

    Ok(())
}

/// Run every policy combination the workload's settings select.
pub async fn execute(workload: Workload) -> Result<Response> {
    let Workload { settings, graph } = workload;

    let selection = PolicySelection {
        scheduling: settings.scheduling,
        allocation: settings.allocation,
    };
    info!(
        tasks = graph.len(),
        cores = settings.cores,
        horizon = settings.horizon,
        scheduling = %settings.scheduling,
        allocation = %settings.allocation,
        "starting simulation"
    );

    let results = run_selection(Arc::new(graph), settings.simulation_options(), selection).await?;
    Ok(Response::from(results))
}

/// Apply command-line overrides on top of file settings.
///
/// Policy names are parsed here so an unknown name fails before any run.
pub fn apply_overrides(settings: &mut Settings, args: &CliArgs) -> Result<()> {
    if let Some(cores) = args.cores {
        settings.cores = cores;
    }
    if let Some(horizon) = args.horizon {
        settings.horizon = horizon;
    }
    if let Some(ref name) = args.scheduling {
        settings.scheduling = name.parse()?;
    }
    if let Some(ref name) = args.allocation {
        settings.allocation = name.parse()?;
    }
    if let Some(aging_factor) = args.aging_factor {
        settings.aging_factor = aging_factor;
    }

    settings.simulation_options().validate()?;
    debug!(?settings, "effective settings");
    Ok(())
}

/// Print settings and tasks in topological order without simulating.
fn print_dry_run(workload: &Workload) {
    let settings = &workload.settings;
    let graph = &workload.graph;

    println!("schedsim dry-run");
    println!("  config.cores = {}", settings.cores);
    println!("  config.horizon = {}", settings.horizon);
    println!("  config.scheduling_policy = {}", settings.scheduling);
    println!("  config.allocation_policy = {}", settings.allocation);
    println!("  config.aging_factor = {}", settings.aging_factor);
    println!();

    println!("tasks ({}):", graph.len());
    for key in graph.topological_order() {
        let Some(task) = graph.get(key) else {
            continue;
        };
        println!("  - {key}");
        if let Some(ref id) = task.external_id {
            println!("      id: {id}");
        }
        if task.is_periodic() {
            println!("      periodic: every {} ticks", task.period);
        } else {
            println!("      event");
        }
        println!("      execution_time: {}", task.execution_time);
        println!("      priority: {}", task.priority);
        if let Some(core) = task.affinity {
            println!("      affinity: core {core}");
        }
        let deps = graph.dependencies_of(key);
        if !deps.is_empty() {
            println!("      deps: {deps:?}");
        }
    }

    debug!("dry-run complete (no simulation)");
}
