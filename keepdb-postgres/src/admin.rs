use keepdb_config::shared::{IntoConnectOptions, MAINTENANCE_DATABASE, PgConnectionConfig};
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, Executor, PgConnection};
use tracing::debug;

/// Connection to the maintenance database of a Postgres server.
///
/// Statements run outside of any transaction block, which `CREATE DATABASE` and
/// `DROP DATABASE` require.
pub struct PgAdminConnection {
    connection: PgConnection,
}

impl PgAdminConnection {
    /// Connects to the [`MAINTENANCE_DATABASE`] of the server described by `config`.
    pub async fn connect(config: &PgConnectionConfig) -> Result<Self, sqlx::Error> {
        let options: PgConnectOptions = config.without_db();
        let connection =
            PgConnection::connect_with(&options.database(MAINTENANCE_DATABASE)).await?;

        debug!(host = %config.host, port = config.port, "connected to maintenance database");

        Ok(Self { connection })
    }

    /// Executes a raw statement and returns the number of affected rows.
    pub async fn execute(&mut self, statement: &str) -> Result<u64, sqlx::Error> {
        let result = self.connection.execute(statement).await?;

        Ok(result.rows_affected())
    }

    /// Puts the session in autocommit mode.
    ///
    /// The admin connection never opens a transaction block, so every statement already
    /// commits on its own. The call is kept so callers can state the requirement.
    pub async fn ensure_autocommit(&mut self) -> Result<(), sqlx::Error> {
        debug!("admin connection runs in autocommit mode");

        Ok(())
    }

    /// Returns whether a database called `name` exists on the server.
    pub async fn database_exists(&mut self, name: &str) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("select exists(select 1 from pg_database where datname = $1)")
                .bind(name)
                .fetch_one(&mut self.connection)
                .await?;

        Ok(exists)
    }

    pub async fn close(self) -> Result<(), sqlx::Error> {
        self.connection.close().await
    }
}
