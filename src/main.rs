// src/main.rs

use schedsim::errors::SimError;
use schedsim::report::ErrorResponse;
use schedsim::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("schedsim error: {err:?}");
        std::process::exit(1);
    }

    if let Err(err) = run(args).await {
        std::process::exit(report_failure(&err));
    }
}

/// Print the error to stderr and its JSON form to stdout; return the exit code.
fn report_failure(err: &SimError) -> i32 {
    eprintln!("schedsim error: {err}");

    let body = ErrorResponse::from(err);
    match serde_json::to_string(&body) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("failed to encode error response: {e}"),
    }

    if body.status == 400 { 2 } else { 1 }
}
