//! Command-line interface for Save.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`run`] - Runs a test tree and prints its results

pub mod args;
pub mod run;

pub use args::Cli;
pub use run::{CommandResult, RunCommand};
