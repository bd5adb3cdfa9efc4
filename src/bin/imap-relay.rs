//! CLI entry point: parse arguments, validate configuration, set up
//! logging, then hand off to the orchestrator.

use clap::Parser;
use imap_relay::{init_logging, Args, Config, Orchestrator};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return std::process::ExitCode::from(1);
        }
    };

    let _guard = match init_logging(&config.log_file) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("failed to open log file {}: {err}", config.log_file);
            return std::process::ExitCode::from(1);
        }
    };

    let orchestrator = match Orchestrator::new(config) {
        Ok(orchestrator) => orchestrator,
        Err(err) => {
            eprintln!("failed to open resume cache: {err}");
            return std::process::ExitCode::from(1);
        }
    };

    let exit_code = orchestrator.run().await;
    std::process::ExitCode::from(u8::try_from(exit_code.0).unwrap_or(1))
}
