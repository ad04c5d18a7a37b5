pub mod commands;
pub mod output;

pub use commands::{CliArgs, Commands, OutputFormat, SourceArgs};
