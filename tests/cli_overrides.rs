use std::error::Error;
use std::io::Write;

use clap::Parser;
use schedsim::cli::CliArgs;
use schedsim::config::Settings;
use schedsim::errors::SimError;
use schedsim::logging::parse_level_str;
use schedsim::types::{AllocationPolicy, PolicyChoice, SchedulingPolicy, TaskKind};
use tempfile::NamedTempFile;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn test_cli_defaults() {
    let args = CliArgs::parse_from(["schedsim"]);

    assert_eq!(args.workload, "Workload.toml");
    assert!(args.cores.is_none());
    assert!(args.scheduling.is_none());
    assert!(!args.dry_run);
    assert!(!args.compact);
}

#[test]
fn test_flags_override_file_settings() -> TestResult {
    let args = CliArgs::parse_from([
        "schedsim",
        "--cores",
        "4",
        "--horizon",
        "90",
        "--scheduling",
        "PAS",
        "--allocation",
        "all",
        "--aging-factor",
        "0.5",
    ]);
    let mut settings = Settings::default();

    schedsim::apply_overrides(&mut settings, &args)?;

    assert_eq!(settings.cores, 4);
    assert_eq!(settings.horizon, 90);
    assert_eq!(settings.scheduling, PolicyChoice::Only(SchedulingPolicy::Pas));
    assert_eq!(settings.allocation, PolicyChoice::All);
    assert_eq!(settings.aging_factor, 0.5);
    Ok(())
}

#[test]
fn test_unknown_policy_flag_fails_fast() {
    let args = CliArgs::parse_from(["schedsim", "--allocation", "round-robin"]);
    let mut settings = Settings::default();

    let err = schedsim::apply_overrides(&mut settings, &args).unwrap_err();
    assert!(matches!(err, SimError::UnknownPolicy(ref msg) if msg.contains("round-robin")));
}

#[test]
fn test_zero_cores_flag_is_rejected() {
    let args = CliArgs::parse_from(["schedsim", "--cores", "0"]);
    let mut settings = Settings::default();

    let err = schedsim::apply_overrides(&mut settings, &args).unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_dry_run_does_not_simulate() -> TestResult {
    let mut file = NamedTempFile::new()?;
    write!(
        file,
        r#"
[task.A]
execution_time = 5

[task.B]
execution_time = 3
deps = ["A"]
"#
    )?;
    let path = file.path().to_string_lossy().into_owned();
    let args = CliArgs::parse_from(["schedsim", "--workload", path.as_str(), "--dry-run"]);

    schedsim::run(args).await?;
    Ok(())
}

#[tokio::test]
async fn test_run_reports_missing_workload() {
    let args = CliArgs::parse_from(["schedsim", "--workload", "/nonexistent/Workload.toml"]);

    let err = schedsim::run(args).await.unwrap_err();
    assert!(matches!(err, SimError::Io(_)));
}

#[test]
fn test_policy_names_parse_case_insensitively() {
    assert_eq!("fcfs".parse::<SchedulingPolicy>().ok(), Some(SchedulingPolicy::Fcfs));
    assert_eq!(" Dynamic ".parse::<AllocationPolicy>().ok(), Some(AllocationPolicy::Dynamic));
    assert_eq!(
        "both".parse::<PolicyChoice<SchedulingPolicy>>().ok(),
        Some(PolicyChoice::All)
    );
    assert_eq!(
        "static".parse::<PolicyChoice<AllocationPolicy>>().ok(),
        Some(PolicyChoice::Only(AllocationPolicy::Static))
    );
    assert!(matches!("edf".parse::<SchedulingPolicy>(), Err(SimError::UnknownPolicy(_))));
    assert_eq!("Periodic".parse::<TaskKind>().ok(), Some(TaskKind::Periodic));
    assert_eq!(PolicyChoice::<SchedulingPolicy>::All.to_string(), "all");
    assert_eq!(SchedulingPolicy::Pas.to_string(), "pas");
}

#[test]
fn test_log_level_names() {
    assert_eq!(parse_level_str("WARNING"), Some(tracing::Level::WARN));
    assert_eq!(parse_level_str(" debug "), Some(tracing::Level::DEBUG));
    assert_eq!(parse_level_str("loud"), None);
}
