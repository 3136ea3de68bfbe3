use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::KeepDbResult;
use crate::input::ConfirmationInput;

/// [`ConfirmationInput`] replaying canned answers, then reporting a closed input.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    answers: Mutex<VecDeque<String>>,
    reads: AtomicUsize,
}

impl ScriptedInput {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            reads: AtomicUsize::new(0),
        }
    }

    /// Input that is closed from the start.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of answers requested so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfirmationInput for ScriptedInput {
    async fn read_answer(&self) -> KeepDbResult<Option<String>> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        Ok(self.answers.lock().unwrap().pop_front())
    }
}
