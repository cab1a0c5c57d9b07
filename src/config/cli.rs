use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the Galleria binary.
#[derive(Debug, Parser)]
#[command(name = "galleria", version, about = "Galleria shared image gallery server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "GALLERIA_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the gallery HTTP service.
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the primary store (Postgres) connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the primary store pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the SQLite mirror path.
    #[arg(long = "mirror-path", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub mirror_path: Option<PathBuf>,

    /// Override the JSON fallback store path.
    #[arg(long = "fallback-path", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub fallback_path: Option<PathBuf>,

    /// Override how long a cached gallery snapshot is served.
    #[arg(long = "cache-stale-after-seconds", value_name = "SECONDS")]
    pub cache_stale_after_seconds: Option<u64>,

    /// Override the timeout applied to primary and mirror calls.
    #[arg(long = "store-timeout-ms", value_name = "MILLIS")]
    pub store_timeout_ms: Option<u64>,
}
