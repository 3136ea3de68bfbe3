//! Test database lifecycle for runs against a real Postgres server.
//!
//! A [`coordinator::RunCoordinator`] brackets a test run: on begin it prepares the
//! [`environment::TestEnvironment`] and creates (or, in keep mode, reuses) the test databases,
//! on finalize it captures the run outcome and tears everything down again. What "create" and
//! "destroy" mean is decided by the installed [`database::DatabaseStrategy`].

pub mod connection;
pub mod console;
pub mod coordinator;
pub mod database;
pub mod environment;
pub mod error;
pub mod input;
mod macros;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
