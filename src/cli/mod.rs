//! CLI module - argument parsing and stage runners

mod args;
pub mod commands;
pub mod export;

pub use args::{CaseArgs, Cli, Commands};
pub use commands::*;
pub use export::run_export;
