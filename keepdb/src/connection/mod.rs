//! Connections used to create and destroy test databases.

mod postgres;

pub use postgres::PgTestConnection;

use async_trait::async_trait;

use crate::error::KeepDbResult;

/// Connection a [`crate::database::DatabaseStrategy`] issues its statements through.
///
/// Besides running raw statements it exposes the dialect pieces the strategies need and the
/// settings the test database name is derived from. It is borrowed for the duration of a
/// single create or destroy call.
#[async_trait]
pub trait TestConnection: Send {
    /// Name of the production database the connection settings describe.
    fn database_name(&self) -> &str;

    /// Explicitly configured test database name, if any.
    fn configured_test_name(&self) -> Option<&str>;

    /// Quotes `name` for use as an identifier in a statement.
    fn quote_name(&self, name: &str) -> String;

    /// Dialect specific clause appended to `CREATE DATABASE`, possibly empty.
    fn creation_suffix(&self) -> String;

    /// Switches the session to autocommit, database creation cannot run inside a transaction.
    async fn set_autocommit(&mut self) -> KeepDbResult<()>;

    /// Executes a raw statement.
    async fn execute(&mut self, statement: &str) -> KeepDbResult<()>;
}
