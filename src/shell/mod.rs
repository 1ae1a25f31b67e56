//! External process execution.

pub mod command;
pub mod platform;

pub use command::{ExecutionResult, ProcessRunner};
pub use platform::Interpreter;
