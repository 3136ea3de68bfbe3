use std::path::Path;

use keepdb_config::shared::PgConnectionConfig;
use keepdb_postgres::migrations::run_migrations;
use tracing::warn;

use crate::connection::PgTestConnection;
use crate::environment::DatabaseBackend;
use crate::error::KeepDbResult;

/// [`DatabaseBackend`] talking to real Postgres servers.
#[derive(Debug, Default, Clone, Copy)]
pub struct PgBackend;

impl DatabaseBackend for PgBackend {
    type Connection = PgTestConnection;

    async fn connect(&self, config: &PgConnectionConfig) -> KeepDbResult<PgTestConnection> {
        PgTestConnection::connect(config.clone()).await
    }

    async fn disconnect(&self, connection: PgTestConnection) {
        if let Err(err) = connection.close().await {
            warn!(error = %err, "failed to close admin connection");
        }
    }

    async fn migrate(&self, config: &PgConnectionConfig, directory: &Path) -> KeepDbResult<usize> {
        let count = run_migrations(config, directory).await?;

        Ok(count)
    }
}
