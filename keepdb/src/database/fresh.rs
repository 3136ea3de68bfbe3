use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::connection::TestConnection;
use crate::console::Console;
use crate::database::{
    CreateOutcome, DatabaseStrategy, TestDatabaseName, create_statement, drop_statement,
    recreate_test_db,
};
use crate::error::KeepDbResult;
use crate::input::ConfirmationInput;

/// Default strategy: every run gets an empty test database which is dropped afterwards.
///
/// A leftover database from an interrupted run is only dropped after the operator confirms
/// with `yes`, or right away when input is disabled.
#[derive(Clone)]
pub struct FreshStrategy {
    input: Arc<dyn ConfirmationInput>,
}

impl FreshStrategy {
    pub fn new(input: Arc<dyn ConfirmationInput>) -> Self {
        Self { input }
    }
}

#[async_trait]
impl DatabaseStrategy for FreshStrategy {
    fn name(&self) -> &'static str {
        "fresh"
    }

    async fn create_test_db(
        &self,
        connection: &mut dyn TestConnection,
        console: &Console,
        verbosity: u8,
        no_input: bool,
    ) -> KeepDbResult<CreateOutcome> {
        let name = TestDatabaseName::for_connection(connection);

        connection.set_autocommit().await?;

        let create = create_statement(connection, &name);
        let Err(err) = connection.execute(&create).await else {
            info!(database = %name, "created test database");
            return Ok(CreateOutcome::Created(name));
        };

        console.error(format!(
            "Got an error creating the test database: {}",
            err.summary()
        ));

        let confirmed = if no_input {
            true
        } else {
            console.prompt(format!(
                "Type 'yes' if you would like to try deleting the test database '{name}', \
                 or 'no' to cancel: "
            ));
            self.input.read_answer().await?.as_deref() == Some("yes")
        };

        if !confirmed {
            console.say("Tests cancelled.");
            warn!(database = %name, "operator cancelled the test run");
            return Ok(CreateOutcome::Aborted);
        }

        Ok(recreate_test_db(connection, console, &name, verbosity).await)
    }

    async fn destroy_test_db(
        &self,
        connection: &mut dyn TestConnection,
        console: &Console,
        name: &TestDatabaseName,
        verbosity: u8,
    ) -> KeepDbResult<()> {
        console.progress(verbosity, format!("Destroying test database '{name}'..."));

        connection.set_autocommit().await?;
        let drop = drop_statement(connection, name);
        connection.execute(&drop).await?;

        info!(database = %name, "dropped test database");

        Ok(())
    }
}
