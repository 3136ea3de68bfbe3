use std::sync::Arc;

use keepdb::console::Console;
use keepdb::coordinator::{RunCoordinator, RunPhase};
use keepdb::environment::{Creation, DatabaseEnvironment};
use keepdb::error::ErrorKind;
use keepdb::test_utils::backend::{MemoryBackend, database_config};
use keepdb::test_utils::connection::MemoryServer;
use keepdb::test_utils::console::memory_console;
use keepdb::test_utils::input::ScriptedInput;
use keepdb_config::shared::TestRunConfig;
use keepdb_telemetry::tracing::init_test_tracing;

fn coordinator(
    server: &MemoryServer,
    run: &TestRunConfig,
    console: Console,
    input: ScriptedInput,
) -> RunCoordinator<DatabaseEnvironment<MemoryBackend>, i32> {
    let input = Arc::new(input);
    let environment = DatabaseEnvironment::new(
        MemoryBackend::new(server),
        vec![database_config("default", "app")],
        run,
        input.clone(),
    );

    RunCoordinator::new(environment, console, input)
}

#[tokio::test(flavor = "multi_thread")]
async fn fresh_run_leaves_no_database_behind() {
    init_test_tracing();

    let server = MemoryServer::new();
    let run = TestRunConfig::default();
    let (console, capture) = memory_console();

    let mut coordinator = coordinator(&server, &run, console, ScriptedInput::empty());
    coordinator.begin(&run).await.unwrap();

    assert!(!coordinator.keeps_test_databases());
    assert_eq!(coordinator.environment().strategy_name(), "fresh");
    assert!(server.has_database("test_app"));

    coordinator.finalize(0).await.unwrap();

    assert_eq!(coordinator.phase(), RunPhase::Finalized);
    assert_eq!(coordinator.outcome(), Some(&0));
    assert!(!server.has_database("test_app"));
    assert!(capture.stdout().contains("Destroying test database 'test_app'..."));
}

#[tokio::test(flavor = "multi_thread")]
async fn leftover_database_is_replaced_without_input() {
    init_test_tracing();

    let server = MemoryServer::new().with_database("test_app");
    let run = TestRunConfig {
        no_input: true,
        ..TestRunConfig::default()
    };
    let (console, capture) = memory_console();

    let mut coordinator = coordinator(&server, &run, console, ScriptedInput::empty());
    coordinator.begin(&run).await.unwrap();

    let prepared = coordinator.database_state().unwrap();
    assert_eq!(prepared[0].creation, Creation::Recreated);
    assert!(capture.stderr().contains("Got an error creating the test database"));

    coordinator.finalize(0).await.unwrap();
    assert!(!server.has_database("test_app"));
}

#[tokio::test(flavor = "multi_thread")]
async fn silent_run_prints_no_progress() {
    init_test_tracing();

    let server = MemoryServer::new();
    let run = TestRunConfig {
        verbosity: 0,
        ..TestRunConfig::default()
    };
    let (console, capture) = memory_console();

    let mut coordinator = coordinator(&server, &run, console, ScriptedInput::empty());
    coordinator.begin(&run).await.unwrap();
    coordinator.finalize(0).await.unwrap();

    assert!(capture.stdout().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn failing_drop_is_reported_at_finalize() {
    init_test_tracing();

    let server = MemoryServer::new();
    server.fail_after(
        "DROP DATABASE \"test_app\"",
        0,
        "database is being accessed by other users",
    );
    let run = TestRunConfig::default();
    let (console, _capture) = memory_console();

    let mut coordinator = coordinator(&server, &run, console, ScriptedInput::empty());
    coordinator.begin(&run).await.unwrap();
    let err = coordinator.finalize(3).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::QueryFailed);
    assert_eq!(coordinator.outcome(), Some(&3));
    assert!(server.has_database("test_app"));
}

#[tokio::test(flavor = "multi_thread")]
async fn begin_config_wins_over_the_environment_config() {
    init_test_tracing();

    let server = MemoryServer::new().with_database("test_app");
    let input = ScriptedInput::new(["no"]);
    let (console, capture) = memory_console();
    let mut coordinator = coordinator(&server, &TestRunConfig::default(), console, input);
    let run = TestRunConfig {
        no_input: true,
        verbosity: 0,
        ..TestRunConfig::default()
    };

    coordinator.begin(&run).await.unwrap();

    let prepared = coordinator.database_state().unwrap();
    assert_eq!(prepared[0].creation, Creation::Recreated);
    assert!(capture.stdout().is_empty());

    coordinator.finalize(0).await.unwrap();
    assert!(!server.has_database("test_app"));
}
