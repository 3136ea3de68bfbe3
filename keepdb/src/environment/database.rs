use std::path::PathBuf;
use std::sync::Arc;

use keepdb_config::shared::{DatabaseConfig, PgConnectionConfig, TestRunConfig};
use tracing::{info, warn};

use crate::bail;
use crate::console::Console;
use crate::database::{CreateOutcome, DatabaseStrategy, FreshStrategy, TestDatabaseName};
use crate::environment::{DatabaseBackend, TestEnvironment};
use crate::error::{ErrorKind, KeepDbResult};
use crate::input::ConfirmationInput;

/// How a test database came to be available for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Creation {
    Created,
    Recreated,
    Reused,
    /// Another alias resolves to the same database, which was set up for that alias.
    Mirrored { of: String },
}

/// A test database that is ready for the run.
#[derive(Debug, Clone)]
pub struct PreparedDatabase {
    pub alias: String,
    /// Name of the production database the test database was derived from.
    pub original_name: String,
    pub test_name: TestDatabaseName,
    pub creation: Creation,
    /// Connection settings pointing at the test database.
    pub connection: PgConnectionConfig,
}

impl PreparedDatabase {
    fn is_mirror(&self) -> bool {
        matches!(self.creation, Creation::Mirrored { .. })
    }

    fn same_database(&self, connection: &PgConnectionConfig, test_name: &TestDatabaseName) -> bool {
        self.connection.host == connection.host
            && self.connection.port == connection.port
            && &self.test_name == test_name
    }
}

/// [`TestEnvironment`] for a set of Postgres databases registered under aliases.
pub struct DatabaseEnvironment<B> {
    backend: B,
    databases: Vec<DatabaseConfig>,
    strategy: Arc<dyn DatabaseStrategy>,
    verbosity: u8,
    no_input: bool,
    migrations_dir: Option<PathBuf>,
    ready: bool,
}

impl<B> DatabaseEnvironment<B>
where
    B: DatabaseBackend,
{
    /// Creates an environment using [`FreshStrategy`] until another strategy is installed.
    ///
    /// `run` supplies the initial switches. A coordinator replaces them with the ones passed
    /// to its `begin`.
    pub fn new(
        backend: B,
        databases: Vec<DatabaseConfig>,
        run: &TestRunConfig,
        input: Arc<dyn ConfirmationInput>,
    ) -> Self {
        Self {
            backend,
            databases,
            strategy: Arc::new(FreshStrategy::new(input)),
            verbosity: run.verbosity,
            no_input: run.no_input,
            migrations_dir: run.migrations_dir.clone(),
            ready: false,
        }
    }

    /// Name of the currently installed strategy.
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn setup_database(
        &self,
        database: &DatabaseConfig,
        console: &Console,
    ) -> KeepDbResult<PreparedDatabase> {
        console.progress(
            self.verbosity,
            format!("Creating test database for alias '{}'...", database.alias),
        );

        let mut connection = self.backend.connect(&database.connection).await?;
        let outcome = self
            .strategy
            .create_test_db(&mut connection, console, self.verbosity, self.no_input)
            .await;
        self.backend.disconnect(connection).await;

        let (test_name, creation) = match outcome? {
            CreateOutcome::Created(name) => (name, Creation::Created),
            CreateOutcome::Recreated(name) => (name, Creation::Recreated),
            CreateOutcome::Reused(name) => (name, Creation::Reused),
            CreateOutcome::Aborted => bail!(
                ErrorKind::OperatorCancelled,
                "Test run cancelled by the operator",
                format!("while setting up alias '{}'", database.alias)
            ),
            CreateOutcome::FatalFailure { name, detail } => bail!(
                ErrorKind::TestDatabaseRecreateFailed,
                "Recreating the test database failed",
                format!("{name}: {detail}")
            ),
        };

        let connection = database.connection.for_database(test_name.as_str());
        if let Some(directory) = &self.migrations_dir {
            let count = self.backend.migrate(&connection, directory).await?;
            console.progress(
                self.verbosity,
                format!("Applied {count} migrations to '{test_name}'."),
            );
        }

        Ok(PreparedDatabase {
            alias: database.alias.clone(),
            original_name: database.connection.name.clone(),
            test_name,
            creation,
            connection,
        })
    }
}

impl<B> TestEnvironment for DatabaseEnvironment<B>
where
    B: DatabaseBackend,
{
    type DatabaseState = Vec<PreparedDatabase>;

    fn apply_run_config(&mut self, run: &TestRunConfig) {
        self.verbosity = run.verbosity;
        self.no_input = run.no_input;
        self.migrations_dir = run.migrations_dir.clone();
    }

    fn install_strategy(&mut self, strategy: Arc<dyn DatabaseStrategy>) {
        info!(
            previous = self.strategy.name(),
            installed = strategy.name(),
            "installing database strategy"
        );
        self.strategy = strategy;
    }

    async fn setup_test_environment(&mut self, _console: &Console) -> KeepDbResult<()> {
        if let Some(directory) = &self.migrations_dir {
            if !directory.is_dir() {
                bail!(
                    ErrorKind::ConfigError,
                    "Migrations directory does not exist",
                    directory.display()
                );
            }
        }

        self.ready = true;
        info!(
            databases = self.databases.len(),
            strategy = self.strategy.name(),
            "test environment ready"
        );

        Ok(())
    }

    async fn setup_databases(&mut self, console: &Console) -> KeepDbResult<Vec<PreparedDatabase>> {
        if !self.ready {
            bail!(
                ErrorKind::InvalidState,
                "Databases set up before the test environment"
            );
        }

        let mut prepared: Vec<PreparedDatabase> = Vec::with_capacity(self.databases.len());
        for database in &self.databases {
            let test_name = TestDatabaseName::resolve(
                database.connection.configured_test_name(),
                &database.connection.name,
            );

            let primary = prepared
                .iter()
                .find(|p| !p.is_mirror() && p.same_database(&database.connection, &test_name));
            if let Some(primary) = primary {
                info!(alias = %database.alias, of = %primary.alias, "test database is a mirror");
                let mirror = PreparedDatabase {
                    alias: database.alias.clone(),
                    original_name: database.connection.name.clone(),
                    creation: Creation::Mirrored {
                        of: primary.alias.clone(),
                    },
                    connection: database.connection.for_database(test_name.as_str()),
                    test_name,
                };
                prepared.push(mirror);
                continue;
            }

            prepared.push(self.setup_database(database, console).await?);
        }

        Ok(prepared)
    }

    async fn teardown_databases(
        &mut self,
        state: Vec<PreparedDatabase>,
        console: &Console,
    ) -> KeepDbResult<()> {
        for database in state.iter().rev().filter(|database| !database.is_mirror()) {
            if !self.strategy.destroys() {
                self.strategy.keep_test_db(&database.test_name, self.verbosity);
                continue;
            }

            let mut connection = self.backend.connect(&database.connection).await?;
            let result = self
                .strategy
                .destroy_test_db(&mut connection, console, &database.test_name, self.verbosity)
                .await;
            self.backend.disconnect(connection).await;
            result?;
        }

        Ok(())
    }

    async fn teardown_test_environment(&mut self, _console: &Console) -> KeepDbResult<()> {
        if !self.ready {
            warn!("tearing down a test environment that was not set up");
        }
        self.ready = false;
        info!("test environment torn down");

        Ok(())
    }
}
