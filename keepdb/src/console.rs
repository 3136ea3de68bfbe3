//! Operator-facing output.
//!
//! Progress messages, the recreate prompt and error reports are written through a
//! [`Console`] rather than straight to the process streams. The coordinator captures one at
//! construction and hands it to every setup and teardown step, which keeps that output on
//! the streams that were current when the run was wired up.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Verbosity from which progress messages are printed.
pub const PROGRESS_VERBOSITY: u8 = 1;

/// Cloneable handle to an output and an error stream.
#[derive(Clone)]
pub struct Console {
    out: SharedWriter,
    err: SharedWriter,
}

impl Console {
    /// Console writing to the process stdout and stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }

    pub fn new<O, E>(out: O, err: E) -> Self
    where
        O: Write + Send + 'static,
        E: Write + Send + 'static,
    {
        Self {
            out: Arc::new(Mutex::new(Box::new(out))),
            err: Arc::new(Mutex::new(Box::new(err))),
        }
    }

    /// Prints a progress line when `verbosity` reaches [`PROGRESS_VERBOSITY`].
    pub fn progress(&self, verbosity: u8, message: impl fmt::Display) {
        if verbosity >= PROGRESS_VERBOSITY {
            self.say(message);
        }
    }

    /// Prints a line on the output stream regardless of verbosity.
    pub fn say(&self, message: impl fmt::Display) {
        write_line(&self.out, message);
    }

    /// Prints a line on the error stream.
    pub fn error(&self, message: impl fmt::Display) {
        write_line(&self.err, message);
    }

    /// Prints `prompt` without a trailing newline so the answer is typed on the same line.
    pub fn prompt(&self, prompt: impl fmt::Display) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        // Console output is best effort, a closed stream must not fail the run.
        let _ = write!(out, "{prompt}");
        let _ = out.flush();
    }
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

fn write_line(writer: &SharedWriter, message: impl fmt::Display) {
    let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
    let _ = writeln!(writer, "{message}");
    let _ = writer.flush();
}
