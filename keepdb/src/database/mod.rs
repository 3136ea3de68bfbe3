//! Creation and destruction of test databases.
//!
//! A [`DatabaseStrategy`] decides what happens when a test database is set up and torn
//! down. [`FreshStrategy`] always starts from an empty database and drops it afterwards,
//! [`KeepStrategy`] reuses an existing database and never drops it.

mod fresh;
mod keep;

pub use fresh::FreshStrategy;
pub use keep::KeepStrategy;

use std::fmt;

use async_trait::async_trait;

use crate::connection::TestConnection;
use crate::console::Console;
use crate::error::KeepDbResult;

/// Prefix put in front of the production database name to derive the test database name.
pub const TEST_DATABASE_PREFIX: &str = "test_";

/// Name of the scratch database a test run works against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestDatabaseName(String);

impl TestDatabaseName {
    /// Uses `configured` verbatim when set and non-empty, otherwise prefixes `database_name`.
    pub fn resolve(configured: Option<&str>, database_name: &str) -> Self {
        match configured {
            Some(name) if !name.is_empty() => Self(name.to_owned()),
            _ => Self(format!("{TEST_DATABASE_PREFIX}{database_name}")),
        }
    }

    /// Resolves the name from the settings exposed by `connection`.
    pub fn for_connection(connection: &dyn TestConnection) -> Self {
        Self::resolve(
            connection.configured_test_name(),
            connection.database_name(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestDatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of setting up a test database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The database did not exist and was created.
    Created(TestDatabaseName),
    /// The database existed and was dropped and created again.
    Recreated(TestDatabaseName),
    /// The database existed and is used as is.
    Reused(TestDatabaseName),
    /// The operator cancelled the run.
    Aborted,
    /// Dropping or recreating the existing database failed.
    FatalFailure {
        name: TestDatabaseName,
        detail: String,
    },
}

impl CreateOutcome {
    /// Returns the name of the usable test database, `None` for terminal outcomes.
    pub fn database_name(&self) -> Option<&TestDatabaseName> {
        match self {
            CreateOutcome::Created(name)
            | CreateOutcome::Recreated(name)
            | CreateOutcome::Reused(name) => Some(name),
            CreateOutcome::Aborted | CreateOutcome::FatalFailure { .. } => None,
        }
    }

    /// Process exit status for terminal outcomes, see [`crate::error::KeepDbError::exit_code`].
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CreateOutcome::Aborted => Some(crate::error::OPERATOR_CANCELLED_EXIT_CODE),
            CreateOutcome::FatalFailure { .. } => Some(crate::error::RECREATE_FAILED_EXIT_CODE),
            _ => None,
        }
    }
}

/// Pluggable create and destroy behavior used by the test environment.
#[async_trait]
pub trait DatabaseStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Sets up the test database for the settings behind `connection`.
    ///
    /// Statement failures are reported through the returned [`CreateOutcome`]. Errors are
    /// reserved for failures of the connection or the operator input themselves.
    async fn create_test_db(
        &self,
        connection: &mut dyn TestConnection,
        console: &Console,
        verbosity: u8,
        no_input: bool,
    ) -> KeepDbResult<CreateOutcome>;

    /// Whether teardown drops the test database.
    ///
    /// When `false`, teardown calls [`DatabaseStrategy::keep_test_db`] instead of
    /// [`DatabaseStrategy::destroy_test_db`] and never connects to the server.
    fn destroys(&self) -> bool {
        true
    }

    /// Leaves the test database `name` in place after the run.
    fn keep_test_db(&self, _name: &TestDatabaseName, _verbosity: u8) {}

    /// Tears down the test database `name` after the run.
    async fn destroy_test_db(
        &self,
        connection: &mut dyn TestConnection,
        console: &Console,
        name: &TestDatabaseName,
        verbosity: u8,
    ) -> KeepDbResult<()>;
}

fn create_statement(connection: &dyn TestConnection, name: &TestDatabaseName) -> String {
    let quoted = connection.quote_name(name.as_str());
    let suffix = connection.creation_suffix();

    if suffix.is_empty() {
        format!("CREATE DATABASE {quoted}")
    } else {
        format!("CREATE DATABASE {quoted} {suffix}")
    }
}

fn drop_statement(connection: &dyn TestConnection, name: &TestDatabaseName) -> String {
    format!("DROP DATABASE {}", connection.quote_name(name.as_str()))
}

/// Drops `name` and creates it again, each statement attempted once.
async fn recreate_test_db(
    connection: &mut dyn TestConnection,
    console: &Console,
    name: &TestDatabaseName,
    verbosity: u8,
) -> CreateOutcome {
    console.progress(verbosity, "Destroying old test database...");
    let drop = drop_statement(connection, name);
    if let Err(err) = connection.execute(&drop).await {
        return recreate_failed(console, name, err.summary().to_owned());
    }

    console.progress(verbosity, "Creating test database...");
    let create = create_statement(connection, name);
    if let Err(err) = connection.execute(&create).await {
        return recreate_failed(console, name, err.summary().to_owned());
    }

    CreateOutcome::Recreated(name.clone())
}

fn recreate_failed(console: &Console, name: &TestDatabaseName, detail: String) -> CreateOutcome {
    console.error(format!("Got an error recreating the test database: {detail}"));
    tracing::error!(database = %name, %detail, "recreating the test database failed");

    CreateOutcome::FatalFailure {
        name: name.clone(),
        detail,
    }
}
