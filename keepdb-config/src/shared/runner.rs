use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::shared::{PgConnectionConfig, TestRunConfig, ValidationError};

/// A database taking part in a test run, registered under an alias.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    pub alias: String,
    pub connection: PgConnectionConfig,
}

/// Root configuration of the `keepdb` runner binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunnerConfig {
    /// Databases whose test twins are set up before the run. The first one is the primary.
    pub databases: Vec<DatabaseConfig>,
    #[serde(default)]
    pub test_run: TestRunConfig,
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.databases.is_empty() {
            return Err(ValidationError::NoDatabases);
        }

        let mut aliases = HashSet::new();
        for database in &self.databases {
            if !aliases.insert(database.alias.as_str()) {
                return Err(ValidationError::DuplicateAlias(database.alias.clone()));
            }
            database.connection.validate(&database.alias)?;
        }

        Ok(())
    }
}
