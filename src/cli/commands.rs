//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};

/// Service discovery and environment extraction for deployment migration.
#[derive(Parser, Debug)]
#[command(
    name = "turnout",
    about = "Discover deployable services and their environment variables in a source tree",
    version,
    long_about = "turnout ingests a source tree (local directory, git repository, or GitHub \
                  archive) and produces a normalized inventory of the deployable services it \
                  contains, together with the environment variables each service requires."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    /// Logging level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Increase verbosity (equivalent to --log-level debug)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover deployable services in a source tree
    #[command(
        long_about = "Walks the source tree once, lets every platform signal observe it, and \
                      triangulates the candidates into a deduplicated service list.\n\n\
                      Examples:\n  \
                      turnout discover\n  \
                      turnout discover /path/to/repo\n  \
                      turnout discover github://acme/shop/tree/main\n  \
                      turnout discover git://acme/shop --format json"
    )]
    Discover(SourceArgs),

    /// Extract environment variables for each discovered service
    #[command(
        long_about = "Runs discovery, then walks each service's build path applying the \
                      content extractors, and reports the deduplicated variables grouped by \
                      service.\n\n\
                      Examples:\n  \
                      turnout env\n  \
                      turnout env github://acme/shop"
    )]
    Env(SourceArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct SourceArgs {
    /// Source URI: a path, file://, github://owner/repo[/tree/ref[/subpath]],
    /// or git://host/owner/repo[#ref] (default: current directory)
    #[arg(value_name = "SOURCE")]
    pub source: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "human")]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}
