use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::SerializableSecretString;
use crate::shared::ValidationError;

/// Database used for administrative statements such as `CREATE DATABASE`.
///
/// Postgres refuses to drop the database a session is connected to, so creation and
/// destruction of test databases always go through this one.
pub const MAINTENANCE_DATABASE: &str = "postgres";

/// Connection settings of a database whose test twin is managed by keepdb.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PgConnectionConfig {
    /// Hostname or IP address of the Postgres server.
    pub host: String,
    /// Port on which the Postgres server is listening.
    pub port: u16,
    /// Name of the production database. The test database name is derived from it.
    pub name: String,
    /// Username for authenticating with the Postgres server.
    pub username: String,
    /// Password for the specified user, redacted in debug output.
    #[serde(default)]
    pub password: Option<SerializableSecretString>,
    #[serde(default)]
    pub tls: TlsConfig,
    /// Settings of the test database itself.
    #[serde(default)]
    pub test: TestDatabaseConfig,
}

/// Settings that only apply to the test database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TestDatabaseConfig {
    /// Explicit test database name. When unset or empty, `test_` + the production name is used.
    #[serde(default)]
    pub name: Option<String>,
    /// Encoding passed to `CREATE DATABASE ... WITH ENCODING`.
    #[serde(default)]
    pub charset: Option<String>,
    /// Template database passed to `CREATE DATABASE ... TEMPLATE`.
    #[serde(default)]
    pub template: Option<String>,
}

/// TLS settings for Postgres connections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TlsConfig {
    /// PEM-encoded trusted root certificates.
    #[serde(default)]
    pub trusted_root_certs: String,
    /// Whether TLS is enabled for the connection.
    #[serde(default)]
    pub enabled: bool,
}

impl TlsConfig {
    /// Returns [`ValidationError::MissingTrustedRootCerts`] if TLS is enabled without certificates.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.enabled && self.trusted_root_certs.is_empty() {
            return Err(ValidationError::MissingTrustedRootCerts);
        }

        Ok(())
    }
}

impl PgConnectionConfig {
    /// Validates the connection settings of the database registered under `alias`.
    pub fn validate(&self, alias: &str) -> Result<(), ValidationError> {
        self.tls.validate()?;

        if self.name.is_empty() {
            return Err(ValidationError::EmptyDatabaseName(alias.to_owned()));
        }

        if self.test.name.as_deref() == Some(self.name.as_str()) {
            return Err(ValidationError::TestNameMatchesDatabase(alias.to_owned()));
        }

        Ok(())
    }

    /// Returns the explicitly configured test database name, ignoring empty values.
    pub fn configured_test_name(&self) -> Option<&str> {
        self.test.name.as_deref().filter(|name| !name.is_empty())
    }

    /// Returns a copy of this config pointing at the database `name` on the same server.
    pub fn for_database(&self, name: impl Into<String>) -> PgConnectionConfig {
        PgConnectionConfig {
            name: name.into(),
            ..self.clone()
        }
    }
}

/// Converts [`PgConnectionConfig`] into driver specific connect options.
///
/// Kept as a trait so a second driver can be plugged in without touching the config type.
pub trait IntoConnectOptions<Output> {
    /// Options for the server without selecting a database.
    fn without_db(&self) -> Output;

    /// Options for the database named in the config.
    fn with_db(&self) -> Output;
}

impl IntoConnectOptions<PgConnectOptions> for PgConnectionConfig {
    fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.tls.enabled {
            PgSslMode::VerifyFull
        } else {
            PgSslMode::Prefer
        };
        let mut options = PgConnectOptions::new_without_pgpass()
            .host(&self.host)
            .username(&self.username)
            .port(self.port)
            .ssl_mode(ssl_mode)
            .ssl_root_cert_from_pem(self.tls.trusted_root_certs.clone().into_bytes());

        if let Some(password) = &self.password {
            options = options.password(password.expose_secret());
        }

        options
    }

    fn with_db(&self) -> PgConnectOptions {
        let options: PgConnectOptions = self.without_db();
        options.database(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str, test_name: Option<&str>) -> PgConnectionConfig {
        PgConnectionConfig {
            host: "localhost".to_owned(),
            port: 5432,
            name: name.to_owned(),
            username: "postgres".to_owned(),
            password: None,
            tls: TlsConfig::default(),
            test: TestDatabaseConfig {
                name: test_name.map(str::to_owned),
                ..TestDatabaseConfig::default()
            },
        }
    }

    #[test]
    fn empty_test_name_is_treated_as_unset() {
        assert_eq!(config("app", Some("")).configured_test_name(), None);
        assert_eq!(config("app", None).configured_test_name(), None);
        assert_eq!(
            config("app", Some("scratch")).configured_test_name(),
            Some("scratch")
        );
    }

    #[test]
    fn rejects_test_name_equal_to_production_name() {
        let err = config("app", Some("app")).validate("default").unwrap_err();

        assert_eq!(err, ValidationError::TestNameMatchesDatabase("default".to_owned()));
    }

    #[test]
    fn rejects_tls_without_certificates() {
        let mut config = config("app", None);
        config.tls.enabled = true;

        assert_eq!(
            config.validate("default").unwrap_err(),
            ValidationError::MissingTrustedRootCerts
        );
    }

    #[test]
    fn for_database_only_swaps_the_name() {
        let original = config("app", Some("scratch"));

        let test = original.for_database("scratch");

        assert_eq!(test.name, "scratch");
        assert_eq!(test.host, original.host);
        assert_eq!(test.port, original.port);
        assert_eq!(test.test.name.as_deref(), Some("scratch"));
    }

    #[test]
    fn with_db_selects_the_configured_database() {
        let options: PgConnectOptions = config("app", None).with_db();

        assert_eq!(options.get_database(), Some("app"));
        assert_eq!(options.get_host(), "localhost");
        assert_eq!(options.get_port(), 5432);
    }
}
