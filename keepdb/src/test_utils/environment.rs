use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::console::Console;
use crate::database::DatabaseStrategy;
use crate::environment::TestEnvironment;
use crate::error::{ErrorKind, KeepDbResult};
use crate::keepdb_error;

/// A call received by a [`RecordingEnvironment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentCall {
    InstallStrategy(&'static str),
    SetupTestEnvironment,
    SetupDatabases,
    TeardownDatabases(u64),
    TeardownTestEnvironment,
}

/// [`TestEnvironment`] that records its calls.
///
/// Database setup returns a fresh token every time, so tests can check that teardown gets
/// exactly the state setup produced. Clones share the call log.
#[derive(Clone, Default)]
pub struct RecordingEnvironment {
    calls: Arc<Mutex<Vec<EnvironmentCall>>>,
    next_state: Arc<AtomicU64>,
    fail_setup_databases: bool,
    fail_teardown_databases: bool,
}

impl RecordingEnvironment {
    pub fn new() -> Self {
        Self {
            next_state: Arc::new(AtomicU64::new(1000)),
            ..Self::default()
        }
    }

    pub fn failing_setup_databases(mut self) -> Self {
        self.fail_setup_databases = true;
        self
    }

    pub fn failing_teardown_databases(mut self) -> Self {
        self.fail_teardown_databases = true;
        self
    }

    pub fn calls(&self) -> Vec<EnvironmentCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: EnvironmentCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl TestEnvironment for RecordingEnvironment {
    type DatabaseState = u64;

    fn install_strategy(&mut self, strategy: Arc<dyn DatabaseStrategy>) {
        self.record(EnvironmentCall::InstallStrategy(strategy.name()));
    }

    async fn setup_test_environment(&mut self, _console: &Console) -> KeepDbResult<()> {
        self.record(EnvironmentCall::SetupTestEnvironment);

        Ok(())
    }

    async fn setup_databases(&mut self, _console: &Console) -> KeepDbResult<u64> {
        self.record(EnvironmentCall::SetupDatabases);

        if self.fail_setup_databases {
            return Err(keepdb_error!(
                ErrorKind::ConnectionFailed,
                "Connecting to the database server failed"
            ));
        }

        Ok(self.next_state.fetch_add(1, Ordering::SeqCst))
    }

    async fn teardown_databases(&mut self, state: u64, _console: &Console) -> KeepDbResult<()> {
        self.record(EnvironmentCall::TeardownDatabases(state));

        if self.fail_teardown_databases {
            return Err(keepdb_error!(
                ErrorKind::QueryFailed,
                "Dropping the test database failed"
            ));
        }

        Ok(())
    }

    async fn teardown_test_environment(&mut self, _console: &Console) -> KeepDbResult<()> {
        self.record(EnvironmentCall::TeardownTestEnvironment);

        Ok(())
    }
}
