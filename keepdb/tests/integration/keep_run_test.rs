use std::sync::Arc;

use keepdb::coordinator::{RunCoordinator, RunPhase};
use keepdb::environment::{Creation, DatabaseEnvironment, PreparedDatabase};
use keepdb::error::ErrorKind;
use keepdb::test_utils::backend::{MemoryBackend, database_config};
use keepdb::test_utils::connection::MemoryServer;
use keepdb::test_utils::console::memory_console;
use keepdb::test_utils::input::ScriptedInput;
use keepdb_config::shared::TestRunConfig;
use keepdb_telemetry::tracing::init_test_tracing;

type Coordinator = RunCoordinator<DatabaseEnvironment<MemoryBackend>, bool>;

fn keep_run(no_input: bool) -> TestRunConfig {
    TestRunConfig {
        keep_test_db: true,
        no_input,
        ..TestRunConfig::default()
    }
}

fn coordinator(
    server: &MemoryServer,
    run: &TestRunConfig,
    input: Arc<ScriptedInput>,
) -> Coordinator {
    let (console, _capture) = memory_console();
    let environment = DatabaseEnvironment::new(
        MemoryBackend::new(server),
        vec![database_config("default", "app")],
        run,
        input.clone(),
    );

    RunCoordinator::new(environment, console, input)
}

fn creation(coordinator: &Coordinator) -> Creation {
    let prepared: &Vec<PreparedDatabase> = coordinator.database_state().unwrap();
    prepared[0].creation.clone()
}

#[tokio::test(flavor = "multi_thread")]
async fn second_run_reuses_the_database_of_the_first() {
    init_test_tracing();

    let server = MemoryServer::new();
    let run = keep_run(true);

    let mut first = coordinator(&server, &run, Arc::new(ScriptedInput::empty()));
    first.begin(&run).await.unwrap();
    assert_eq!(creation(&first), Creation::Created);
    first.finalize(true).await.unwrap();
    assert!(server.has_database("test_app"));

    let input = Arc::new(ScriptedInput::empty());
    let mut second = coordinator(&server, &run, input.clone());
    second.begin(&run).await.unwrap();
    assert_eq!(creation(&second), Creation::Reused);
    second.finalize(true).await.unwrap();

    assert_eq!(second.phase(), RunPhase::Finalized);
    assert_eq!(input.reads(), 0);
    assert!(server.has_database("test_app"));
    assert!(server.statements().iter().all(|s| !s.starts_with("DROP")));
}

#[tokio::test(flavor = "multi_thread")]
async fn operator_can_recreate_a_kept_database() {
    init_test_tracing();

    let server = MemoryServer::new().with_database("test_app");
    let run = keep_run(false);

    let mut coordinator = coordinator(&server, &run, Arc::new(ScriptedInput::new(["yes"])));
    coordinator.begin(&run).await.unwrap();

    assert_eq!(creation(&coordinator), Creation::Recreated);
    assert_eq!(
        server.statements(),
        vec![
            "CREATE DATABASE \"test_app\"",
            "DROP DATABASE \"test_app\"",
            "CREATE DATABASE \"test_app\"",
        ]
    );

    coordinator.finalize(true).await.unwrap();
    assert!(server.has_database("test_app"));
}

#[tokio::test(flavor = "multi_thread")]
async fn blank_answer_keeps_the_existing_database() {
    init_test_tracing();

    let server = MemoryServer::new().with_database("test_app");
    let run = keep_run(false);

    let mut coordinator = coordinator(&server, &run, Arc::new(ScriptedInput::new([""])));
    coordinator.begin(&run).await.unwrap();

    assert_eq!(creation(&coordinator), Creation::Reused);
    coordinator.finalize(false).await.unwrap();
    assert_eq!(coordinator.outcome(), Some(&false));
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelled_run_never_begins() {
    init_test_tracing();

    let server = MemoryServer::new().with_database("test_app");
    let run = keep_run(false);

    let mut coordinator = coordinator(&server, &run, Arc::new(ScriptedInput::new(["maybe"])));
    let err = coordinator.begin(&run).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::OperatorCancelled);
    assert_eq!(err.exit_code(), Some(1));
    assert_eq!(coordinator.phase(), RunPhase::Idle);
    assert!(server.has_database("test_app"));
}

#[tokio::test(flavor = "multi_thread")]
async fn kept_database_is_finalized_while_the_server_is_down() {
    init_test_tracing();

    let server = MemoryServer::new();
    let run = keep_run(true);

    let mut coordinator = coordinator(&server, &run, Arc::new(ScriptedInput::empty()));
    coordinator.begin(&run).await.unwrap();
    coordinator.environment().backend().set_unreachable(true);

    coordinator.finalize(true).await.unwrap();

    assert_eq!(coordinator.phase(), RunPhase::Finalized);
    assert_eq!(coordinator.outcome(), Some(&true));
    assert!(server.has_database("test_app"));
}
