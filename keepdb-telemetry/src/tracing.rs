//! Tracing subscriber setup for the keepdb binaries and tests.

use std::sync::Once;

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable that turns on log output in tests.
const ENABLE_TRACING_ENV_NAME: &str = "ENABLE_TRACING";

static TEST_TRACING: Once = Once::new();

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to install the global tracing subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Installs the global subscriber for the binary `app_name`.
///
/// Log levels come from `RUST_LOG` when set, otherwise `{app_name}=info` plus `keepdb=info`
/// so the library's lifecycle events are visible. Logs go to stderr to keep stdout free for
/// the test command's own output.
pub fn init_tracing(app_name: &str) -> Result<(), TracingError> {
    let default_directives = format!("{}=info,keepdb=info", app_name.replace('-', "_"));
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()?;

    Ok(())
}

/// Installs a test subscriber once per process when `ENABLE_TRACING` is set.
///
/// Tests call this unconditionally; without the variable it does nothing so test output
/// stays quiet.
pub fn init_test_tracing() {
    if std::env::var(ENABLE_TRACING_ENV_NAME).is_err() {
        return;
    }

    TEST_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_test_writer())
            .try_init();
    });
}
