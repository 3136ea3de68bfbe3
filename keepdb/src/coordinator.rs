//! Two-phase hook that brackets a test run.
//!
//! The test engine calls [`RunCoordinator::begin`] before any test runs and
//! [`RunCoordinator::finalize`] once they are done. A coordinator serves exactly one run:
//! `Idle -> Began -> Finalized`.

use std::mem;
use std::sync::Arc;

use keepdb_config::shared::TestRunConfig;
use tracing::info;

use crate::bail;
use crate::console::Console;
use crate::database::KeepStrategy;
use crate::environment::TestEnvironment;
use crate::error::{ErrorKind, KeepDbResult};
use crate::input::ConfirmationInput;

/// Externally visible phase of a [`RunCoordinator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Began,
    Finalized,
}

enum State<S> {
    Idle,
    Began(S),
    Finalized,
}

impl<S> State<S> {
    fn phase(&self) -> RunPhase {
        match self {
            State::Idle => RunPhase::Idle,
            State::Began(_) => RunPhase::Began,
            State::Finalized => RunPhase::Finalized,
        }
    }
}

/// Sequences environment setup and teardown around one test run and keeps its outcome.
///
/// `O` is whatever the test engine reports at the end of the run. The coordinator never
/// looks into it, it only keeps it for [`RunCoordinator::outcome`].
pub struct RunCoordinator<E, O>
where
    E: TestEnvironment,
{
    environment: E,
    console: Console,
    input: Arc<dyn ConfirmationInput>,
    state: State<E::DatabaseState>,
    keep_installed: bool,
    outcome: Option<O>,
}

impl<E, O> RunCoordinator<E, O>
where
    E: TestEnvironment,
{
    /// Creates a coordinator for `environment`.
    ///
    /// `console` is captured here and used for all setup and teardown output, whatever the
    /// test engine does with the process streams in between. `input` answers the recreate
    /// prompt when keep mode finds an existing test database.
    pub fn new(environment: E, console: Console, input: Arc<dyn ConfirmationInput>) -> Self {
        Self {
            environment,
            console,
            input,
            state: State::Idle,
            keep_installed: false,
            outcome: None,
        }
    }

    /// Prepares the environment and sets up the test databases.
    ///
    /// `run` is applied to the environment first, see [`TestEnvironment::apply_run_config`].
    /// With `run.keep_test_db` set, [`KeepStrategy`] is installed on the environment first
    /// and stays installed for the rest of the coordinator's life. Errors from the environment
    /// propagate unchanged and leave the coordinator idle.
    pub async fn begin(&mut self, run: &TestRunConfig) -> KeepDbResult<()> {
        if !matches!(self.state, State::Idle) {
            bail!(
                ErrorKind::InvalidState,
                "Run already began",
                format!("phase is {:?}", self.phase())
            );
        }

        self.environment.apply_run_config(run);
        if run.keep_test_db {
            self.environment
                .install_strategy(Arc::new(KeepStrategy::new(self.input.clone())));
            self.keep_installed = true;
        }

        self.environment
            .setup_test_environment(&self.console)
            .await?;
        let database_state = self.environment.setup_databases(&self.console).await?;

        self.state = State::Began(database_state);
        info!(keep_test_db = self.keep_installed, "test run began");

        Ok(())
    }

    /// Keeps `outcome` and tears the databases and the environment down.
    ///
    /// Must follow a successful [`RunCoordinator::begin`], otherwise an
    /// [`ErrorKind::InvalidState`] error is returned and nothing is torn down. The outcome is
    /// stored before teardown, so it stays available when teardown fails.
    pub async fn finalize(&mut self, outcome: O) -> KeepDbResult<()> {
        let database_state = match mem::replace(&mut self.state, State::Finalized) {
            State::Began(database_state) => database_state,
            other => {
                let phase = other.phase();
                self.state = other;
                bail!(
                    ErrorKind::InvalidState,
                    "Run finalized without a matching begin",
                    format!("phase is {phase:?}")
                );
            }
        };

        self.outcome = Some(outcome);

        self.environment
            .teardown_databases(database_state, &self.console)
            .await?;
        self.environment
            .teardown_test_environment(&self.console)
            .await?;

        info!("test run finalized");

        Ok(())
    }

    pub fn phase(&self) -> RunPhase {
        self.state.phase()
    }

    /// State returned by the environment's database setup, available between begin and finalize.
    pub fn database_state(&self) -> Option<&E::DatabaseState> {
        match &self.state {
            State::Began(database_state) => Some(database_state),
            State::Idle | State::Finalized => None,
        }
    }

    /// Outcome captured by [`RunCoordinator::finalize`].
    pub fn outcome(&self) -> Option<&O> {
        self.outcome.as_ref()
    }

    /// Whether keep mode was engaged for this run.
    pub fn keeps_test_databases(&self) -> bool {
        self.keep_installed
    }

    pub fn environment(&self) -> &E {
        &self.environment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::console::memory_console;
    use crate::test_utils::environment::{EnvironmentCall, RecordingEnvironment};
    use crate::test_utils::input::ScriptedInput;

    fn coordinator(
        environment: RecordingEnvironment,
    ) -> RunCoordinator<RecordingEnvironment, &'static str> {
        let (console, _) = memory_console();
        RunCoordinator::new(environment, console, Arc::new(ScriptedInput::empty()))
    }

    #[tokio::test]
    async fn begin_then_finalize_creates_then_destroys_with_same_state() {
        let environment = RecordingEnvironment::new();
        let mut coordinator = coordinator(environment.clone());

        coordinator.begin(&TestRunConfig::default()).await.unwrap();
        assert_eq!(coordinator.phase(), RunPhase::Began);
        let state = *coordinator.database_state().unwrap();

        coordinator.finalize("passed").await.unwrap();

        assert_eq!(
            environment.calls(),
            vec![
                EnvironmentCall::SetupTestEnvironment,
                EnvironmentCall::SetupDatabases,
                EnvironmentCall::TeardownDatabases(state),
                EnvironmentCall::TeardownTestEnvironment,
            ]
        );
        assert_eq!(coordinator.phase(), RunPhase::Finalized);
        assert_eq!(coordinator.outcome(), Some(&"passed"));
        assert!(!coordinator.keeps_test_databases());
    }

    #[tokio::test]
    async fn keep_mode_installs_strategy_before_setup() {
        let environment = RecordingEnvironment::new();
        let mut coordinator = coordinator(environment.clone());
        let run = TestRunConfig {
            keep_test_db: true,
            ..TestRunConfig::default()
        };

        coordinator.begin(&run).await.unwrap();

        assert_eq!(
            environment.calls(),
            vec![
                EnvironmentCall::InstallStrategy("keep"),
                EnvironmentCall::SetupTestEnvironment,
                EnvironmentCall::SetupDatabases,
            ]
        );
        assert!(coordinator.keeps_test_databases());
    }

    #[tokio::test]
    async fn finalize_before_begin_is_rejected() {
        let environment = RecordingEnvironment::new();
        let mut coordinator = coordinator(environment.clone());

        let err = coordinator.finalize("passed").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(coordinator.phase(), RunPhase::Idle);
        assert_eq!(coordinator.outcome(), None);
        assert!(environment.calls().is_empty());
    }

    #[tokio::test]
    async fn coordinator_serves_a_single_run() {
        let environment = RecordingEnvironment::new();
        let mut coordinator = coordinator(environment.clone());
        coordinator.begin(&TestRunConfig::default()).await.unwrap();

        let err = coordinator.begin(&TestRunConfig::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);

        coordinator.finalize("passed").await.unwrap();
        let err = coordinator.finalize("again").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(coordinator.outcome(), Some(&"passed"));

        let err = coordinator.begin(&TestRunConfig::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(environment.calls().len(), 4);
    }

    #[tokio::test]
    async fn setup_failure_propagates_unchanged() {
        let environment = RecordingEnvironment::new().failing_setup_databases();
        let mut coordinator = coordinator(environment.clone());

        let err = coordinator.begin(&TestRunConfig::default()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConnectionFailed);
        assert_eq!(coordinator.phase(), RunPhase::Idle);
        assert!(coordinator.database_state().is_none());
    }

    #[tokio::test]
    async fn teardown_failure_keeps_the_outcome() {
        let environment = RecordingEnvironment::new().failing_teardown_databases();
        let mut coordinator = coordinator(environment.clone());
        coordinator.begin(&TestRunConfig::default()).await.unwrap();

        let err = coordinator.finalize("failed").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::QueryFailed);
        assert_eq!(coordinator.outcome(), Some(&"failed"));
        assert_eq!(coordinator.phase(), RunPhase::Finalized);
        assert!(!environment
            .calls()
            .contains(&EnvironmentCall::TeardownTestEnvironment));
    }
}
