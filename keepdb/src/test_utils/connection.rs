use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use keepdb_config::shared::PgConnectionConfig;
use keepdb_postgres::dialect::creation_suffix;

use crate::connection::TestConnection;
use crate::error::{ErrorKind, KeepDbResult};
use crate::keepdb_error;

const CREATE_DATABASE: &str = "CREATE DATABASE ";
const DROP_DATABASE: &str = "DROP DATABASE ";

#[derive(Default)]
struct ServerState {
    databases: HashSet<String>,
    statements: Vec<String>,
    occurrences: HashMap<String, usize>,
    failures: Vec<InjectedFailure>,
}

struct InjectedFailure {
    statement: String,
    skip: usize,
    message: String,
}

/// Minimal stand-in for a database server.
///
/// Understands `CREATE DATABASE` and `DROP DATABASE` well enough to fail on existing or
/// missing databases, and records every statement it receives. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryServer {
    state: Arc<Mutex<ServerState>>,
}

impl MemoryServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an existing database.
    pub fn with_database(self, name: &str) -> Self {
        self.state.lock().unwrap().databases.insert(name.to_owned());
        self
    }

    /// Fails `statement` with `message` once it has been executed `skip` times.
    pub fn fail_after(&self, statement: &str, skip: usize, message: &str) {
        self.state.lock().unwrap().failures.push(InjectedFailure {
            statement: statement.to_owned(),
            skip,
            message: message.to_owned(),
        });
    }

    pub fn has_database(&self, name: &str) -> bool {
        self.state.lock().unwrap().databases.contains(name)
    }

    /// Every statement received by the server, across connections.
    pub fn statements(&self) -> Vec<String> {
        self.state.lock().unwrap().statements.clone()
    }

    fn execute(&self, statement: &str) -> Result<(), String> {
        let mut state = self.state.lock().unwrap();
        state.statements.push(statement.to_owned());

        let occurrence = state.occurrences.entry(statement.to_owned()).or_default();
        let seen = *occurrence;
        *occurrence += 1;

        if let Some(failure) = state
            .failures
            .iter()
            .find(|failure| failure.statement == statement && seen >= failure.skip)
        {
            return Err(failure.message.clone());
        }

        if let Some(rest) = statement.strip_prefix(CREATE_DATABASE) {
            let name = parse_identifier(rest);
            if !state.databases.insert(name.clone()) {
                return Err(format!("database \"{name}\" already exists"));
            }
        } else if let Some(rest) = statement.strip_prefix(DROP_DATABASE) {
            let name = parse_identifier(rest);
            if !state.databases.remove(&name) {
                return Err(format!("database \"{name}\" does not exist"));
            }
        }

        Ok(())
    }
}

/// Reads a possibly double-quoted identifier from the start of `input`.
fn parse_identifier(input: &str) -> String {
    let Some(quoted) = input.strip_prefix('"') else {
        return input.split_whitespace().next().unwrap_or_default().to_owned();
    };

    let mut name = String::new();
    let mut chars = quoted.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                chars.next();
            } else {
                break;
            }
        }
        name.push(c);
    }

    name
}

/// [`TestConnection`] recording its statements and forwarding them to a [`MemoryServer`].
///
/// Identifiers are always double quoted.
pub struct RecordingConnection {
    database_name: String,
    test_name: Option<String>,
    suffix: String,
    server: MemoryServer,
    statements: Vec<String>,
    autocommit: bool,
}

impl RecordingConnection {
    /// Connection for production database `database_name` on a new, empty server.
    pub fn new(database_name: &str) -> Self {
        Self {
            database_name: database_name.to_owned(),
            test_name: None,
            suffix: String::new(),
            server: MemoryServer::new(),
            statements: Vec::new(),
            autocommit: false,
        }
    }

    /// Connection built from `config` the way the Postgres backend builds one.
    pub fn from_config(config: &PgConnectionConfig, server: &MemoryServer) -> Self {
        let mut connection = Self::new(&config.name).on(server);
        connection.test_name = config.configured_test_name().map(str::to_owned);
        connection.suffix = creation_suffix(&config.test);
        connection
    }

    pub fn with_test_name(mut self, test_name: &str) -> Self {
        self.test_name = Some(test_name.to_owned());
        self
    }

    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.suffix = suffix.to_owned();
        self
    }

    pub fn on(mut self, server: &MemoryServer) -> Self {
        self.server = server.clone();
        self
    }

    /// Statements executed through this connection.
    pub fn statements(&self) -> Vec<String> {
        self.statements.clone()
    }

    pub fn autocommit(&self) -> bool {
        self.autocommit
    }
}

#[async_trait]
impl TestConnection for RecordingConnection {
    fn database_name(&self) -> &str {
        &self.database_name
    }

    fn configured_test_name(&self) -> Option<&str> {
        self.test_name.as_deref().filter(|name| !name.is_empty())
    }

    fn quote_name(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn creation_suffix(&self) -> String {
        self.suffix.clone()
    }

    async fn set_autocommit(&mut self) -> KeepDbResult<()> {
        self.autocommit = true;

        Ok(())
    }

    async fn execute(&mut self, statement: &str) -> KeepDbResult<()> {
        self.statements.push(statement.to_owned());
        self.server
            .execute(statement)
            .map_err(|message| keepdb_error!(ErrorKind::QueryFailed, "Statement failed", message))
    }
}
