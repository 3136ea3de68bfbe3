use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use keepdb_config::shared::RunnerConfig;
use keepdb_config::{Environment, load_config, load_config_from};

/// Runs a test command against throwaway copies of the configured databases.
#[derive(Debug, Parser)]
#[command(name = "keepdb", version)]
pub struct Args {
    /// Keep test databases after the run and reuse them on the next one.
    #[arg(long)]
    pub keepdb: bool,
    /// Never prompt, assume the non-interactive answer.
    #[arg(long)]
    pub noinput: bool,
    /// Console verbosity, 0 silences progress messages.
    #[arg(short, long)]
    pub verbosity: Option<u8>,
    /// Directory with migrations applied to every test database.
    #[arg(long)]
    pub migrations: Option<PathBuf>,
    /// Configuration directory, `./configuration` when omitted.
    #[arg(long)]
    pub config_dir: Option<PathBuf>,
    /// Test command and its arguments.
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

/// Loads the runner configuration and applies the command line on top of it.
pub fn load_runner_config(args: &Args) -> anyhow::Result<RunnerConfig> {
    let mut config: RunnerConfig = match &args.config_dir {
        Some(directory) => {
            let environment = Environment::load().context("failed to determine environment")?;
            load_config_from(directory, environment)?
        }
        None => load_config()?,
    };
    config.validate().context("invalid configuration")?;

    apply_args(&mut config, args);

    Ok(config)
}

/// Command line flags only ever switch behavior on, they never turn off what config enabled.
fn apply_args(config: &mut RunnerConfig, args: &Args) {
    let run = &mut config.test_run;
    run.keep_test_db |= args.keepdb;
    run.no_input |= args.noinput;
    if let Some(verbosity) = args.verbosity {
        run.verbosity = verbosity;
    }
    if let Some(directory) = &args.migrations {
        run.migrations_dir = Some(directory.clone());
    }
}
