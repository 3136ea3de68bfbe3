//! The environment a test run executes in.
//!
//! [`TestEnvironment`] is the contract the [`crate::coordinator::RunCoordinator`] drives:
//! prepare the environment, set up the databases, and later tear both down again. The
//! create and destroy behavior used for the databases is a [`DatabaseStrategy`] that can be
//! swapped before setup.

mod database;
mod postgres;

pub use database::{Creation, DatabaseEnvironment, PreparedDatabase};
pub use postgres::PgBackend;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use keepdb_config::shared::{PgConnectionConfig, TestRunConfig};

use crate::connection::TestConnection;
use crate::console::Console;
use crate::database::DatabaseStrategy;
use crate::error::KeepDbResult;

/// Sets up and tears down everything a test run needs.
pub trait TestEnvironment: Send {
    /// Per-database state returned by setup and handed back at teardown.
    type DatabaseState: Send;

    /// Takes the switches of the run about to begin.
    ///
    /// Called by [`crate::coordinator::RunCoordinator::begin`] before anything else, so the
    /// configuration handed to `begin` wins over whatever the environment was built with.
    fn apply_run_config(&mut self, _run: &TestRunConfig) {}

    /// Replaces the strategy used by the following setup and teardown calls.
    fn install_strategy(&mut self, strategy: Arc<dyn DatabaseStrategy>);

    /// Prepares everything that does not involve databases.
    fn setup_test_environment(
        &mut self,
        console: &Console,
    ) -> impl Future<Output = KeepDbResult<()>> + Send;

    /// Creates (or reuses) and migrates the test databases.
    fn setup_databases(
        &mut self,
        console: &Console,
    ) -> impl Future<Output = KeepDbResult<Self::DatabaseState>> + Send;

    /// Destroys the test databases described by `state`.
    fn teardown_databases(
        &mut self,
        state: Self::DatabaseState,
        console: &Console,
    ) -> impl Future<Output = KeepDbResult<()>> + Send;

    /// Undoes [`TestEnvironment::setup_test_environment`].
    fn teardown_test_environment(
        &mut self,
        console: &Console,
    ) -> impl Future<Output = KeepDbResult<()>> + Send;
}

/// Server access used by [`DatabaseEnvironment`].
pub trait DatabaseBackend: Send + Sync {
    type Connection: TestConnection + 'static;

    /// Opens an administrative connection to the server described by `config`.
    fn connect(
        &self,
        config: &PgConnectionConfig,
    ) -> impl Future<Output = KeepDbResult<Self::Connection>> + Send;

    /// Closes a connection returned by [`DatabaseBackend::connect`].
    fn disconnect(&self, connection: Self::Connection) -> impl Future<Output = ()> + Send;

    /// Applies the migrations in `directory` to the database named in `config`.
    fn migrate(
        &self,
        config: &PgConnectionConfig,
        directory: &Path,
    ) -> impl Future<Output = KeepDbResult<usize>> + Send;
}
