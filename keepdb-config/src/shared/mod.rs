//! Configuration types shared by the keepdb crates.

mod connection;
mod runner;
mod test_run;

pub use connection::{
    IntoConnectOptions, MAINTENANCE_DATABASE, PgConnectionConfig, TestDatabaseConfig, TlsConfig,
};
pub use runner::{DatabaseConfig, RunnerConfig};
pub use test_run::TestRunConfig;

use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// TLS is enabled but no trusted root certificates are provided.
    #[error("Invalid TLS config: `trusted_root_certs` must be set when `enabled` is true")]
    MissingTrustedRootCerts,
    /// The production database name is empty.
    #[error("database `{0}` has an empty `name`")]
    EmptyDatabaseName(String),
    /// The explicit test database name points at the production database.
    #[error("database `{0}` uses its own `name` as `test.name`, which would be created and dropped by test runs")]
    TestNameMatchesDatabase(String),
    /// No database is configured for the run.
    #[error("at least one database must be configured")]
    NoDatabases,
    /// Two databases share the same alias.
    #[error("database alias `{0}` is configured more than once")]
    DuplicateAlias(String),
}
