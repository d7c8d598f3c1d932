//! CLI command implementations.

pub mod batch;
pub mod grab;
pub mod shell;

pub use batch::{BatchCommand, BatchMode};
pub use grab::GrabCommand;
pub use shell::ShellSession;
