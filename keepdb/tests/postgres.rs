#![cfg(feature = "postgres-tests")]

use std::sync::Arc;

use keepdb::console::Console;
use keepdb::coordinator::RunCoordinator;
use keepdb::environment::{Creation, DatabaseEnvironment, PgBackend};
use keepdb::test_utils::console::memory_console;
use keepdb::test_utils::input::ScriptedInput;
use keepdb_config::shared::{DatabaseConfig, PgConnectionConfig, TestRunConfig};
use keepdb_postgres::test_utils::{drop_pg_database, local_pg_connection_config, pg_database_exists};
use keepdb_telemetry::tracing::init_test_tracing;

fn coordinator(
    config: &PgConnectionConfig,
    run: &TestRunConfig,
    console: Console,
) -> RunCoordinator<DatabaseEnvironment<PgBackend>, ()> {
    let input = Arc::new(ScriptedInput::empty());
    let databases = vec![DatabaseConfig {
        alias: "default".to_owned(),
        connection: config.clone(),
    }];
    let environment = DatabaseEnvironment::new(PgBackend, databases, run, input.clone());

    RunCoordinator::new(environment, console, input)
}

#[tokio::test(flavor = "multi_thread")]
async fn keep_mode_survives_two_runs_on_a_live_server() {
    init_test_tracing();

    let config = local_pg_connection_config();
    let test_name = format!("test_{}", config.name);
    let run = TestRunConfig {
        keep_test_db: true,
        no_input: true,
        ..TestRunConfig::default()
    };

    let (console, _capture) = memory_console();
    let mut first = coordinator(&config, &run, console);
    first.begin(&run).await.unwrap();
    assert_eq!(first.database_state().unwrap()[0].creation, Creation::Created);
    first.finalize(()).await.unwrap();
    assert!(pg_database_exists(&config, &test_name).await);

    let (console, _capture) = memory_console();
    let mut second = coordinator(&config, &run, console);
    second.begin(&run).await.unwrap();
    assert_eq!(second.database_state().unwrap()[0].creation, Creation::Reused);
    second.finalize(()).await.unwrap();
    assert!(pg_database_exists(&config, &test_name).await);

    drop_pg_database(&config, &test_name).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn fresh_mode_drops_the_database_on_a_live_server() {
    init_test_tracing();

    let mut config = local_pg_connection_config();
    config.test.name = Some(format!("{}_scratch", config.name));
    let test_name = config.test.name.clone().unwrap();
    let run = TestRunConfig::default();

    let (console, _capture) = memory_console();
    let mut coordinator = coordinator(&config, &run, console);
    coordinator.begin(&run).await.unwrap();
    assert!(pg_database_exists(&config, &test_name).await);

    coordinator.finalize(()).await.unwrap();
    assert!(!pg_database_exists(&config, &test_name).await);
}

#[tokio::test(flavor = "multi_thread")]
async fn template_and_encoding_are_applied() {
    init_test_tracing();

    let mut config = local_pg_connection_config();
    config.test.charset = Some("UTF8".to_owned());
    config.test.template = Some("template0".to_owned());
    let test_name = format!("test_{}", config.name);
    let run = TestRunConfig::default();

    let (console, _capture) = memory_console();
    let mut coordinator = coordinator(&config, &run, console);
    coordinator.begin(&run).await.unwrap();
    assert!(pg_database_exists(&config, &test_name).await);

    coordinator.finalize(()).await.unwrap();
    assert!(!pg_database_exists(&config, &test_name).await);
}
