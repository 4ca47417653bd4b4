//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Catalog Publisher - deliver catalog change events to the ingestion service
#[derive(Parser, Debug)]
#[command(
    name = "catalog-publisher",
    author,
    version,
    about = "Catalog event publication pipeline",
    long_about = "Builds CloudEvents envelopes for catalog entities and delivers them to the\n\
                  ingestion service, either directly over HTTP or through a RabbitMQ queue,\n\
                  as configured per store."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        global = true,
        env = "CATALOG_PUBLISHER_VERBOSE"
    )]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CATALOG_PUBLISHER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Metrics server port (0 = disabled)
    #[arg(
        long,
        default_value = "0",
        global = true,
        env = "CATALOG_PUBLISHER_METRICS_PORT"
    )]
    pub metrics_port: u16,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration file without sending anything
    Validate(ValidateArgs),

    /// Publish entities read from a JSON file
    Publish(PublishArgs),

    /// Unpublish entities by id
    Unpublish(UnpublishArgs),
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(
        short,
        long,
        default_value = "publisher.toml",
        env = "CATALOG_PUBLISHER_CONFIG"
    )]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `publish` command
#[derive(Parser, Debug)]
pub struct PublishArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "publisher.toml",
        env = "CATALOG_PUBLISHER_CONFIG"
    )]
    pub config: PathBuf,

    /// Store id
    #[arg(short, long)]
    pub tenant: i64,

    /// Collection (indexer) name, e.g. product or category
    #[arg(long)]
    pub collection: String,

    /// JSON file holding an array of entity objects
    pub entities: PathBuf,
}

/// Arguments for the `unpublish` command
#[derive(Parser, Debug)]
pub struct UnpublishArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "publisher.toml",
        env = "CATALOG_PUBLISHER_CONFIG"
    )]
    pub config: PathBuf,

    /// Store id
    #[arg(short, long)]
    pub tenant: i64,

    /// Collection (indexer) name, e.g. product or category
    #[arg(long)]
    pub collection: String,

    /// Entity ids
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<String>,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
