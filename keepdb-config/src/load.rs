use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::environment::Environment;

/// Directory holding the configuration files, relative to the working directory.
const CONFIGURATION_DIR: &str = "configuration";

/// Stem of the file every environment builds on.
const BASE_FILE_STEM: &str = "base";

/// Extensions tried, in order, for every configuration file.
const FILE_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Prefix of environment variable overrides, `APP_TEST_RUN__NO_INPUT=true` sets
/// `test_run.no_input`.
const ENV_PREFIX: &str = "APP";
const ENV_PREFIX_SEPARATOR: &str = "_";
const ENV_NESTING_SEPARATOR: &str = "__";

/// Errors raised while loading layered configuration.
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    #[error("configuration directory `{0}` does not exist")]
    MissingConfigurationDirectory(PathBuf),

    #[error("no `{stem}` configuration file (.yaml, .yml or .json) in `{directory}`")]
    MissingFile {
        stem: &'static str,
        directory: PathBuf,
    },

    #[error("failed to determine runtime environment: {0}")]
    Environment(#[source] io::Error),

    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Loads configuration from `./configuration` for the environment named by `APP_ENVIRONMENT`.
pub fn load_config<T>() -> Result<T, LoadConfigError>
where
    T: DeserializeOwned,
{
    let directory = std::env::current_dir()
        .map_err(LoadConfigError::CurrentDir)?
        .join(CONFIGURATION_DIR);
    let environment = Environment::load().map_err(LoadConfigError::Environment)?;

    load_config_from(&directory, environment)
}

/// Loads configuration from `directory`.
///
/// `base.*` is read first, `{environment}.*` on top of it and `APP_`-prefixed environment
/// variables last. Both files must exist.
pub fn load_config_from<T>(directory: &Path, environment: Environment) -> Result<T, LoadConfigError>
where
    T: DeserializeOwned,
{
    if !directory.is_dir() {
        return Err(LoadConfigError::MissingConfigurationDirectory(
            directory.to_path_buf(),
        ));
    }

    let base = layer_file(directory, BASE_FILE_STEM)?;
    let overlay = layer_file(directory, environment.as_str())?;
    let overrides = config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_NESTING_SEPARATOR)
        .try_parsing(true);

    let settings = config::Config::builder()
        .add_source(config::File::from(base))
        .add_source(config::File::from(overlay))
        .add_source(overrides)
        .build()?;

    Ok(settings.try_deserialize()?)
}

fn layer_file(directory: &Path, stem: &'static str) -> Result<PathBuf, LoadConfigError> {
    FILE_EXTENSIONS
        .iter()
        .map(|extension| directory.join(format!("{stem}.{extension}")))
        .find(|path| path.is_file())
        .ok_or_else(|| LoadConfigError::MissingFile {
            stem,
            directory: directory.to_path_buf(),
        })
}
