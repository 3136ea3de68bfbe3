//! Postgres flavored SQL fragments.

use keepdb_config::shared::TestDatabaseConfig;
use pg_escape::{quote_identifier, quote_literal};

/// Quotes `name` for use as an identifier, e.g. a database name.
pub fn quote_name(name: &str) -> String {
    quote_identifier(name).into_owned()
}

/// Renders the clause appended to `CREATE DATABASE` for a test database.
///
/// Returns an empty string when neither an encoding nor a template is configured.
pub fn creation_suffix(test: &TestDatabaseConfig) -> String {
    let mut options = Vec::new();

    if let Some(charset) = test.charset.as_deref().filter(|c| !c.is_empty()) {
        options.push(format!("ENCODING {}", quote_literal(charset)));
    }
    if let Some(template) = test.template.as_deref().filter(|t| !t.is_empty()) {
        options.push(format!("TEMPLATE {}", quote_identifier(template)));
    }

    if options.is_empty() {
        return String::new();
    }

    format!("WITH {}", options.join(" "))
}
