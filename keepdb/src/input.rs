//! Operator answers to the recreate prompt.

use std::io::{self, BufRead};

use async_trait::async_trait;

use crate::error::{ErrorKind, KeepDbResult};
use crate::keepdb_error;

/// Source of operator answers.
///
/// Implementations return one line per call without its line terminator, or `None` once the
/// source is exhausted.
#[async_trait]
pub trait ConfirmationInput: Send + Sync {
    async fn read_answer(&self) -> KeepDbResult<Option<String>>;
}

/// Reads answers from the process stdin.
///
/// The read blocks until the operator presses enter, there is no timeout. It runs on the
/// blocking thread pool so the runtime is not stalled.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinInput;

#[async_trait]
impl ConfirmationInput for StdinInput {
    async fn read_answer(&self) -> KeepDbResult<Option<String>> {
        let line = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            let read = io::stdin().lock().read_line(&mut line)?;
            Ok::<_, io::Error>((read > 0).then_some(line))
        })
        .await
        .map_err(|err| {
            keepdb_error!(
                ErrorKind::IoError,
                "Reading the operator answer was interrupted",
                err
            )
        })??;

        Ok(line.map(|line| strip_line_terminator(&line).to_owned()))
    }
}

/// Removes a trailing `\n` or `\r\n`, leaving any other whitespace in place.
pub fn strip_line_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Decision taken when an existing test database is found in keep mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepAnswer {
    /// Drop the existing database and create it again.
    Recreate,
    /// Keep using the existing database.
    Reuse,
    /// Stop the whole run.
    Cancel,
}

impl KeepAnswer {
    /// Maps an answer to a decision.
    ///
    /// Only the exact tokens are recognized: `yes` recreates, an empty answer or `no` reuses,
    /// anything else, including a closed input, cancels.
    pub fn parse(answer: Option<&str>) -> Self {
        match answer {
            Some("yes") => KeepAnswer::Recreate,
            Some("") | Some("no") => KeepAnswer::Reuse,
            _ => KeepAnswer::Cancel,
        }
    }
}
