//! `keepdb` binary.
//!
//! Sets up test databases, runs a test command against them and tears them down again.
//! With `--keepdb` the databases survive the run and are reused by the next one.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use keepdb::console::Console;
use keepdb::coordinator::RunCoordinator;
use keepdb::environment::{DatabaseEnvironment, PgBackend};
use keepdb::error::KeepDbError;
use keepdb::input::StdinInput;
use keepdb_config::shared::RunnerConfig;
use keepdb_telemetry::tracing::init_tracing;
use tracing::{error, info};

use crate::command::{CommandOutcome, run_test_command};
use crate::config::{Args, load_runner_config};

mod command;
mod config;

/// Exit code used for failures that carry no code of their own.
const FAILURE_EXIT_CODE: u8 = 1;

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = init_tracing(env!("CARGO_BIN_NAME")) {
        eprintln!("{err}");
        return ExitCode::from(FAILURE_EXIT_CODE);
    }

    let result = load_runner_config(&args).and_then(|config| {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?
            .block_on(async_main(config, &args.command))
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

/// Runs one coordinated test run and returns the process exit code.
async fn async_main(config: RunnerConfig, command: &[String]) -> anyhow::Result<u8> {
    let input = Arc::new(StdinInput);
    let environment = DatabaseEnvironment::new(
        PgBackend,
        config.databases,
        &config.test_run,
        input.clone(),
    );
    let mut coordinator = RunCoordinator::new(environment, Console::stdio(), input);

    coordinator.begin(&config.test_run).await?;

    let primary = coordinator
        .database_state()
        .and_then(|prepared| prepared.first());
    let outcome = match run_test_command(command, primary).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(error = %err, "failed to start test command");
            CommandOutcome::not_started()
        }
    };

    coordinator.finalize(outcome).await?;

    let outcome = coordinator
        .outcome()
        .cloned()
        .unwrap_or_else(CommandOutcome::not_started);
    info!(
        success = outcome.success(),
        keep_test_db = coordinator.keeps_test_databases(),
        "test run complete"
    );

    Ok(command_exit_code(&outcome))
}

/// Exit code of the test command, clamped to what a process can report.
fn command_exit_code(outcome: &CommandOutcome) -> u8 {
    match outcome.exit_code {
        Some(code) => u8::try_from(code).unwrap_or(FAILURE_EXIT_CODE),
        None => FAILURE_EXIT_CODE,
    }
}

/// Exit code for a run that failed before or around the test command.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<KeepDbError>()
        .and_then(KeepDbError::exit_code)
        .and_then(|code| u8::try_from(code).ok())
        .unwrap_or(FAILURE_EXIT_CODE)
}
