//! Postgres plumbing for keepdb: the administrative connection used to create and drop
//! test databases, dialect helpers and migrations.

pub mod admin;
pub mod db;
pub mod dialect;
pub mod migrations;
#[cfg(feature = "test-utils")]
pub mod test_utils;
