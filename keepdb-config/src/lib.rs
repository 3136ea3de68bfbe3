//! Configuration for keepdb test runs.
//!
//! Holds the connection settings of the databases under test, the run-level switches
//! (persistence, verbosity, prompting) and the layered loader used by the runner binary.

mod environment;
mod load;
mod secret;
pub mod shared;

pub use environment::Environment;
pub use load::{LoadConfigError, load_config, load_config_from};
pub use secret::SerializableSecretString;
