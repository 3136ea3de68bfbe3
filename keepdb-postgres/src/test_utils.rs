//! Helpers for tests that run against a live Postgres server.

use keepdb_config::shared::{PgConnectionConfig, TestDatabaseConfig, TlsConfig};

use crate::admin::PgAdminConnection;
use crate::dialect::quote_name;

/// Connection config for the local test server with a unique production database name.
///
/// Configuration is read from environment variables:
/// - `TESTS_DATABASE_HOST`: Postgres server hostname (required)
/// - `TESTS_DATABASE_PORT`: Postgres server port (required)
/// - `TESTS_DATABASE_USERNAME`: Database user (required)
/// - `TESTS_DATABASE_PASSWORD`: Database password (optional)
///
/// # Panics
///
/// Panics if a required variable is missing or the port is not a number.
pub fn local_pg_connection_config() -> PgConnectionConfig {
    PgConnectionConfig {
        host: std::env::var("TESTS_DATABASE_HOST").expect("TESTS_DATABASE_HOST must be set"),
        port: std::env::var("TESTS_DATABASE_PORT")
            .expect("TESTS_DATABASE_PORT must be set")
            .parse()
            .expect("TESTS_DATABASE_PORT must be a valid port number"),
        name: format!("keepdb_{}", uuid::Uuid::new_v4().simple()),
        username: std::env::var("TESTS_DATABASE_USERNAME")
            .expect("TESTS_DATABASE_USERNAME must be set"),
        password: std::env::var("TESTS_DATABASE_PASSWORD")
            .ok()
            .map(Into::into),
        tls: TlsConfig::default(),
        test: TestDatabaseConfig::default(),
    }
}

/// Returns whether `name` exists on the server described by `config`.
///
/// # Panics
///
/// Panics if the server cannot be queried.
pub async fn pg_database_exists(config: &PgConnectionConfig, name: &str) -> bool {
    let mut connection = PgAdminConnection::connect(config)
        .await
        .expect("Failed to connect to Postgres");
    let exists = connection
        .database_exists(name)
        .await
        .expect("Failed to query pg_database");
    let _ = connection.close().await;

    exists
}

/// Drops `name` if it exists. Used for test cleanup.
///
/// Never panics: failures are printed and ignored so cleanup does not mask the test result.
pub async fn drop_pg_database(config: &PgConnectionConfig, name: &str) {
    let mut connection = match PgAdminConnection::connect(config).await {
        Ok(connection) => connection,
        Err(e) => {
            eprintln!("warning: failed to connect to Postgres for cleanup: {e}");
            return;
        }
    };

    if let Err(e) = connection
        .execute(&format!("drop database if exists {}", quote_name(name)))
        .await
    {
        eprintln!("warning: failed to drop database {name}: {e}");
    }

    let _ = connection.close().await;
}
