//! In-memory doubles for the seams of the lifecycle: connections, operator input, console
//! output, the test environment and the database backend.

pub mod backend;
pub mod connection;
pub mod console;
pub mod environment;
pub mod input;
