use async_trait::async_trait;
use keepdb_config::shared::PgConnectionConfig;
use keepdb_postgres::admin::PgAdminConnection;
use keepdb_postgres::dialect::{creation_suffix, quote_name};
use tracing::debug;

use crate::connection::TestConnection;
use crate::error::KeepDbResult;

/// [`TestConnection`] backed by the maintenance database of a Postgres server.
pub struct PgTestConnection {
    config: PgConnectionConfig,
    admin: PgAdminConnection,
}

impl PgTestConnection {
    /// Opens an administrative connection to the server described by `config`.
    pub async fn connect(config: PgConnectionConfig) -> KeepDbResult<Self> {
        let admin = PgAdminConnection::connect(&config).await?;

        Ok(Self { config, admin })
    }

    pub async fn close(self) -> KeepDbResult<()> {
        self.admin.close().await?;

        Ok(())
    }
}

#[async_trait]
impl TestConnection for PgTestConnection {
    fn database_name(&self) -> &str {
        &self.config.name
    }

    fn configured_test_name(&self) -> Option<&str> {
        self.config.configured_test_name()
    }

    fn quote_name(&self, name: &str) -> String {
        quote_name(name)
    }

    fn creation_suffix(&self) -> String {
        creation_suffix(&self.config.test)
    }

    async fn set_autocommit(&mut self) -> KeepDbResult<()> {
        self.admin.ensure_autocommit().await?;

        Ok(())
    }

    async fn execute(&mut self, statement: &str) -> KeepDbResult<()> {
        debug!(statement, "executing statement");
        self.admin.execute(statement).await?;

        Ok(())
    }
}
