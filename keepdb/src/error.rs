//! Error type shared by every keepdb operation.
//!
//! [`KeepDbError`] carries an [`ErrorKind`] for programmatic handling, a static description,
//! optional dynamic detail, an optional source error and the location it was created at.
//! Two kinds are terminal outcomes of a run rather than failures of keepdb itself, see
//! [`KeepDbError::exit_code`].

use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Result type for keepdb operations.
pub type KeepDbResult<T> = Result<T, KeepDbError>;

/// Exit status used when the operator cancels the run at the recreate prompt.
pub const OPERATOR_CANCELLED_EXIT_CODE: i32 = 1;

/// Exit status used when dropping or recreating an existing test database fails.
pub const RECREATE_FAILED_EXIT_CODE: i32 = 2;

/// Categories of keepdb errors.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Database
    ConnectionFailed,
    QueryFailed,
    MigrationFailed,

    // Run lifecycle
    OperatorCancelled,
    TestDatabaseRecreateFailed,
    InvalidState,

    // Environment
    ConfigError,
    IoError,

    Unknown,
}

/// Error returned by keepdb operations.
#[derive(Debug, Clone)]
pub struct KeepDbError {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
}

impl KeepDbError {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the detail when present, otherwise the description.
    pub fn summary(&self) -> &str {
        self.detail.as_deref().unwrap_or(&self.description)
    }

    /// Returns where the error was created.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Returns the process exit status a command-line host should terminate with.
    ///
    /// Only the two terminal outcomes of test database creation map to a status: `1` for a
    /// cancelled run and `2` for a failed recreate. Everything else is left to the host.
    pub fn exit_code(&self) -> Option<i32> {
        match self.kind {
            ErrorKind::OperatorCancelled => Some(OPERATOR_CANCELLED_EXIT_CODE),
            ErrorKind::TestDatabaseRecreateFailed => Some(RECREATE_FAILED_EXIT_CODE),
            _ => None,
        }
    }

    /// Attaches the originating error, exposed through [`error::Error::source`].
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        KeepDbError {
            kind,
            description,
            detail,
            source,
            location: Location::caller(),
        }
    }
}

impl PartialEq for KeepDbError {
    fn eq(&self, other: &KeepDbError) -> bool {
        self.kind == other.kind && self.description == other.description
    }
}

impl fmt::Display for KeepDbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.description)?;

        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }

        Ok(())
    }
}

impl error::Error for KeepDbError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn error::Error + 'static))
    }
}

impl From<(ErrorKind, &'static str)> for KeepDbError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> KeepDbError {
        KeepDbError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

impl<D> From<(ErrorKind, &'static str, D)> for KeepDbError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> KeepDbError {
        KeepDbError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

impl From<std::io::Error> for KeepDbError {
    #[track_caller]
    fn from(err: std::io::Error) -> KeepDbError {
        let detail = err.to_string();
        KeepDbError::from_components(
            ErrorKind::IoError,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

impl From<sqlx::Error> for KeepDbError {
    #[track_caller]
    fn from(err: sqlx::Error) -> KeepDbError {
        let kind = match &err {
            sqlx::Error::Database(_) => ErrorKind::QueryFailed,
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) => ErrorKind::ConnectionFailed,
            sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => ErrorKind::ConnectionFailed,
            _ => ErrorKind::QueryFailed,
        };

        let detail = err.to_string();
        KeepDbError::from_components(
            kind,
            Cow::Borrowed("Database operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

impl From<sqlx::migrate::MigrateError> for KeepDbError {
    #[track_caller]
    fn from(err: sqlx::migrate::MigrateError) -> KeepDbError {
        let detail = err.to_string();
        KeepDbError::from_components(
            ErrorKind::MigrationFailed,
            Cow::Borrowed("Applying migrations to the test database failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bail, keepdb_error};

    #[test]
    fn terminal_kinds_map_to_exit_codes() {
        let cancelled = keepdb_error!(ErrorKind::OperatorCancelled, "Tests cancelled");
        let failed = keepdb_error!(
            ErrorKind::TestDatabaseRecreateFailed,
            "Recreating the test database failed",
            "permission denied"
        );
        let other = keepdb_error!(ErrorKind::QueryFailed, "Query failed");

        assert_eq!(cancelled.exit_code(), Some(1));
        assert_eq!(failed.exit_code(), Some(2));
        assert_eq!(other.exit_code(), None);
    }

    #[test]
    fn display_includes_kind_description_and_detail() {
        let err = keepdb_error!(ErrorKind::QueryFailed, "Query failed", "relation missing");

        assert_eq!(err.to_string(), "[QueryFailed] Query failed: relation missing");
    }

    #[test]
    fn source_is_exposed() {
        let io = std::io::Error::other("disk on fire");
        let err = keepdb_error!(ErrorKind::IoError, "Write failed", source: io);

        let source = error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "disk on fire");
    }

    #[test]
    fn bail_returns_early() {
        fn fails() -> KeepDbResult<()> {
            bail!(ErrorKind::InvalidState, "Not ready", "state is idle");
        }

        let err = fails().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(err.detail(), Some("state is idle"));
    }
}
