use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default console verbosity: progress messages are printed.
const DEFAULT_VERBOSITY: u8 = 1;

/// Switches that control a single test run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TestRunConfig {
    /// Keep test databases between runs and reuse them when they already exist.
    #[serde(default)]
    pub keep_test_db: bool,
    /// Console verbosity. `0` is silent, `1` and above prints progress messages.
    #[serde(default = "default_verbosity")]
    pub verbosity: u8,
    /// Never prompt the operator, assume the non-interactive answer instead.
    #[serde(default)]
    pub no_input: bool,
    /// Directory with sqlx migrations applied to every test database after setup.
    #[serde(default)]
    pub migrations_dir: Option<PathBuf>,
}

fn default_verbosity() -> u8 {
    DEFAULT_VERBOSITY
}

impl Default for TestRunConfig {
    fn default() -> Self {
        Self {
            keep_test_db: false,
            verbosity: DEFAULT_VERBOSITY,
            no_input: false,
            migrations_dir: None,
        }
    }
}
