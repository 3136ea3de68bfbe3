use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use keepdb_config::shared::{DatabaseConfig, PgConnectionConfig, TestDatabaseConfig, TlsConfig};

use crate::environment::DatabaseBackend;
use crate::error::{ErrorKind, KeepDbResult};
use crate::keepdb_error;
use crate::test_utils::connection::{MemoryServer, RecordingConnection};

/// [`DatabaseBackend`] whose connections all talk to one [`MemoryServer`].
#[derive(Clone, Default)]
pub struct MemoryBackend {
    server: MemoryServer,
    connections: Arc<Mutex<Vec<String>>>,
    migrations: Arc<Mutex<Vec<(String, PathBuf)>>>,
    unreachable: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn new(server: &MemoryServer) -> Self {
        Self {
            server: server.clone(),
            ..Self::default()
        }
    }

    /// Makes every following connection attempt fail.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Names of the production databases connections were opened for.
    pub fn connections(&self) -> Vec<String> {
        self.connections.lock().unwrap().clone()
    }

    /// Database names and directories migrations were run for.
    pub fn migrations(&self) -> Vec<(String, PathBuf)> {
        self.migrations.lock().unwrap().clone()
    }
}

impl DatabaseBackend for MemoryBackend {
    type Connection = RecordingConnection;

    async fn connect(&self, config: &PgConnectionConfig) -> KeepDbResult<RecordingConnection> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(keepdb_error!(
                ErrorKind::ConnectionFailed,
                "Connecting to the database server failed",
                format!("{}:{} is unreachable", config.host, config.port)
            ));
        }

        self.connections.lock().unwrap().push(config.name.clone());

        Ok(RecordingConnection::from_config(config, &self.server))
    }

    async fn disconnect(&self, _connection: RecordingConnection) {}

    async fn migrate(&self, config: &PgConnectionConfig, directory: &Path) -> KeepDbResult<usize> {
        self.migrations
            .lock()
            .unwrap()
            .push((config.name.clone(), directory.to_path_buf()));

        Ok(1)
    }
}

/// Configuration of a database registered under `alias` on a local server.
pub fn database_config(alias: &str, name: &str) -> DatabaseConfig {
    DatabaseConfig {
        alias: alias.to_owned(),
        connection: PgConnectionConfig {
            host: "localhost".to_owned(),
            port: 5432,
            name: name.to_owned(),
            username: "postgres".to_owned(),
            password: None,
            tls: TlsConfig::default(),
            test: TestDatabaseConfig::default(),
        },
    }
}
