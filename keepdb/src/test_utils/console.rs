use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::console::Console;

/// Cloneable in-memory writer.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Everything written to a console created by [`memory_console`].
#[derive(Clone)]
pub struct ConsoleCapture {
    out: SharedBuffer,
    err: SharedBuffer,
}

impl ConsoleCapture {
    pub fn stdout(&self) -> String {
        self.out.contents()
    }

    pub fn stderr(&self) -> String {
        self.err.contents()
    }
}

/// Returns a [`Console`] writing into memory and a handle to read what was written.
pub fn memory_console() -> (Console, ConsoleCapture) {
    let out = SharedBuffer::default();
    let err = SharedBuffer::default();
    let console = Console::new(out.clone(), err.clone());

    (console, ConsoleCapture { out, err })
}
