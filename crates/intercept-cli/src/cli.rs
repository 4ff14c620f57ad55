use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages (translated trees, rule applications)
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser)]
#[command(name = "intercept")]
#[command(about = "intercept - run queries through a configurable rewrite pipeline")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses config file value or defaults to 'info'
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file with logging settings and the rewrite rule chain
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate the query, execute it and print the results
    Run {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Print the translated tree without executing it
    Explain {
        #[command(flatten)]
        query: QueryArgs,
    },
}

/// Query composed on the dataset's root handle
#[derive(Debug, Clone, Args)]
pub struct QueryArgs {
    /// JSON data file: { "source": ..., "element": ..., "rows": [...] }
    #[arg(short, long)]
    pub data: PathBuf,

    /// Keep rows where FIELD equals VALUE (VALUE parsed as JSON, else string)
    #[arg(short = 'w', long = "where", value_name = "FIELD=VALUE")]
    pub filters: Vec<String>,

    /// Sort by field
    #[arg(long)]
    pub order_by: Option<String>,

    /// Sort descending
    #[arg(long, requires = "order_by")]
    pub desc: bool,

    #[arg(long)]
    pub skip: Option<usize>,

    #[arg(long)]
    pub take: Option<usize>,

    /// Print the number of rows instead of the rows
    #[arg(long)]
    pub count: bool,
}
