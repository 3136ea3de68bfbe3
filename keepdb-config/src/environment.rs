use std::fmt;
use std::io::Error;

/// Name of the environment variable which selects the configuration environment.
const APP_ENVIRONMENT_ENV_NAME: &str = "APP_ENVIRONMENT";

/// The name of the local development environment.
const DEV_ENV_NAME: &str = "dev";

/// The name of the continuous integration environment.
const CI_ENV_NAME: &str = "ci";

/// Environment a test run is executed in.
///
/// Selects which environment configuration file is layered on top of the base one. CI
/// configurations usually disable interactive prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Local development, an operator is usually at the terminal.
    Dev,
    /// Continuous integration, nobody is there to answer prompts.
    Ci,
}

impl Environment {
    /// Loads the environment from the `APP_ENVIRONMENT` env variable, defaulting to `dev`.
    pub fn load() -> Result<Environment, Error> {
        std::env::var(APP_ENVIRONMENT_ENV_NAME)
            .unwrap_or_else(|_| DEV_ENV_NAME.into())
            .try_into()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => DEV_ENV_NAME,
            Environment::Ci => CI_ENV_NAME,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Environment {
    type Error = Error;

    /// Parses an [`Environment`] case-insensitively from `dev` or `ci`.
    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            DEV_ENV_NAME => Ok(Self::Dev),
            CI_ENV_NAME => Ok(Self::Ci),
            other => Err(Error::other(format!(
                "{other} is not a supported environment. Use either `{DEV_ENV_NAME}` or `{CI_ENV_NAME}`.",
            ))),
        }
    }
}
