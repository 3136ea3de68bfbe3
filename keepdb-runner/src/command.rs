use std::io;
use std::process::ExitStatus;
use std::time::{Duration, Instant};

use keepdb::environment::PreparedDatabase;
use secrecy::ExposeSecret;
use tokio::process::Command;
use tracing::info;

/// Name of the variable holding the test database name given to the test command.
pub const TEST_DATABASE_ENV_NAME: &str = "KEEPDB_TEST_DATABASE";

/// What the test command reported back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Exit code of the command, `None` when it was killed by a signal or never started.
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
}

impl CommandOutcome {
    fn from_status(status: ExitStatus, elapsed: Duration) -> Self {
        Self {
            exit_code: status.code(),
            elapsed,
        }
    }

    /// Outcome of a command that could not be started.
    pub fn not_started() -> Self {
        Self {
            exit_code: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Variables pointing a libpq-compatible client at `database`.
pub fn database_env(database: &PreparedDatabase) -> Vec<(&'static str, String)> {
    let connection = &database.connection;
    let mut env = vec![
        ("PGHOST", connection.host.clone()),
        ("PGPORT", connection.port.to_string()),
        ("PGUSER", connection.username.clone()),
        ("PGDATABASE", connection.name.clone()),
        (TEST_DATABASE_ENV_NAME, database.test_name.to_string()),
    ];
    if let Some(password) = &connection.password {
        env.push(("PGPASSWORD", password.expose_secret().clone()));
    }

    env
}

/// Runs `command` to completion with the test database exported in its environment.
///
/// The command inherits the runner's standard streams.
pub async fn run_test_command(
    command: &[String],
    database: Option<&PreparedDatabase>,
) -> io::Result<CommandOutcome> {
    let Some((program, args)) = command.split_first() else {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty test command"));
    };

    let mut child = Command::new(program);
    child.args(args);
    if let Some(database) = database {
        child.envs(database_env(database));
    }

    info!(%program, "starting test command");
    let started = Instant::now();
    let status = child.status().await?;
    let outcome = CommandOutcome::from_status(status, started.elapsed());
    info!(
        exit_code = ?outcome.exit_code,
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "test command finished"
    );

    Ok(outcome)
}
