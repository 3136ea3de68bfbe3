use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::connection::TestConnection;
use crate::console::Console;
use crate::database::{
    CreateOutcome, DatabaseStrategy, TestDatabaseName, create_statement, recreate_test_db,
};
use crate::error::KeepDbResult;
use crate::input::{ConfirmationInput, KeepAnswer};

/// Strategy that keeps test databases between runs.
///
/// The first run creates the database. Later runs find it already there and, after asking
/// the operator (or without asking when input is disabled), keep using it. Teardown never
/// drops anything.
#[derive(Clone)]
pub struct KeepStrategy {
    input: Arc<dyn ConfirmationInput>,
}

impl KeepStrategy {
    pub fn new(input: Arc<dyn ConfirmationInput>) -> Self {
        Self { input }
    }

    /// Creates the test database, or decides what to do with the one that is already there.
    pub async fn create_or_reuse(
        &self,
        connection: &mut dyn TestConnection,
        console: &Console,
        verbosity: u8,
        no_input: bool,
    ) -> KeepDbResult<CreateOutcome> {
        let name = TestDatabaseName::for_connection(connection);

        connection.set_autocommit().await?;

        let create = create_statement(connection, &name);
        let err = match connection.execute(&create).await {
            Ok(()) => {
                info!(database = %name, "created test database");
                return Ok(CreateOutcome::Created(name));
            }
            Err(err) => err,
        };

        console.error(format!(
            "Got an error creating the test database: {}",
            err.summary()
        ));
        debug!(database = %name, error = %err, "test database could not be created");

        let answer = if no_input {
            KeepAnswer::Reuse
        } else {
            console.prompt(format!(
                "Type 'yes' if you would like to try deleting/recreating the test database '{name}', \
                 or 'no' to continue with the existing database [no]: "
            ));
            let answer = self.input.read_answer().await?;
            KeepAnswer::parse(answer.as_deref())
        };

        match answer {
            KeepAnswer::Recreate => {
                let outcome = recreate_test_db(connection, console, &name, verbosity).await;
                if let CreateOutcome::Recreated(_) = outcome {
                    info!(database = %name, "recreated test database");
                }

                Ok(outcome)
            }
            KeepAnswer::Reuse => {
                console.progress(verbosity, "Using existing test database.");
                info!(database = %name, "reusing existing test database");

                Ok(CreateOutcome::Reused(name))
            }
            KeepAnswer::Cancel => {
                console.say("Cancelling tests.");
                warn!(database = %name, "operator cancelled the test run");

                Ok(CreateOutcome::Aborted)
            }
        }
    }

    /// Leaves the test database in place for the next run.
    pub fn destroy_noop(&self, name: &TestDatabaseName, verbosity: u8) {
        debug!(database = %name, verbosity, "keeping test database");
    }
}

#[async_trait]
impl DatabaseStrategy for KeepStrategy {
    fn name(&self) -> &'static str {
        "keep"
    }

    fn destroys(&self) -> bool {
        false
    }

    fn keep_test_db(&self, name: &TestDatabaseName, verbosity: u8) {
        self.destroy_noop(name, verbosity);
    }

    async fn create_test_db(
        &self,
        connection: &mut dyn TestConnection,
        console: &Console,
        verbosity: u8,
        no_input: bool,
    ) -> KeepDbResult<CreateOutcome> {
        self.create_or_reuse(connection, console, verbosity, no_input)
            .await
    }

    async fn destroy_test_db(
        &self,
        _connection: &mut dyn TestConnection,
        _console: &Console,
        name: &TestDatabaseName,
        verbosity: u8,
    ) -> KeepDbResult<()> {
        self.destroy_noop(name, verbosity);

        Ok(())
    }
}
