use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the crispr-site binary.
#[derive(Debug, Parser)]
#[command(name = "crispr-site", version, about = "CRISPR project content API")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "CRISPR_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP API.
    Serve(Box<ServeArgs>),
    /// Apply pending database migrations and exit.
    Migrate(DatabaseOverride),
    /// Create an admin account, or promote and reset an existing one.
    #[command(name = "create-admin")]
    CreateAdmin(CreateAdminArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", env = "DATABASE_URL", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct CreateAdminArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    #[arg(long, value_name = "EMAIL")]
    pub email: String,

    /// Display name shown as the post author.
    #[arg(long, value_name = "NAME")]
    pub name: String,

    #[arg(long, value_name = "PASSWORD")]
    pub password: String,
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

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override how long public responses are served from cache; 0 disables caching.
    #[arg(long = "cache-revalidate-seconds", value_name = "SECONDS")]
    pub cache_revalidate_seconds: Option<u64>,

    /// Override how many public responses the cache holds.
    #[arg(long = "cache-max-entries", value_name = "COUNT")]
    pub cache_max_entries: Option<u64>,

    /// Override the session lifetime.
    #[arg(long = "session-ttl-hours", value_name = "HOURS")]
    pub session_ttl_hours: Option<u64>,

    /// Mark the session cookie `Secure`.
    #[arg(
        long = "session-cookie-secure",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub session_cookie_secure: Option<bool>,
}
