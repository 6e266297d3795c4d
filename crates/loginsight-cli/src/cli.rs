//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use loginsight_api::FieldConstraint;

/// Query and feed a Log Insight server.
#[derive(Parser, Debug, Clone)]
#[command(name = "loginsight")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "LOGINSIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Server host, overrides the configuration file.
    #[arg(long, env = "LOGINSIGHT_HOST")]
    pub host: Option<String>,

    /// Query API port, overrides the configuration file.
    #[arg(long)]
    pub port: Option<u16>,

    /// User name, overrides the configuration file.
    #[arg(short, long, env = "LOGINSIGHT_USER")]
    pub user: Option<String>,

    /// Password, overrides the configuration file.
    #[arg(long, env = "LOGINSIGHT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Seconds to wait for a response before cancelling the request.
    #[arg(short, long, default_value_t = 60)]
    pub timeout: u64,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Log in and show the session.
    Login,

    /// Fetch matching events.
    Query(QueryArgs),

    /// Fetch aggregated event counts.
    Aggregate(QueryArgs),

    /// Submit one or more messages.
    Ingest(IngestArgs),
}

/// Arguments shared by `query` and `aggregate`.
#[derive(Parser, Debug, Clone)]
pub struct QueryArgs {
    /// Constraints as `field/OPCODE+value` or `field/EXISTS`.
    #[arg(value_name = "CONSTRAINT", value_parser = parse_constraint)]
    pub constraints: Vec<FieldConstraint>,

    /// Maximum number of results.
    #[arg(short, long)]
    pub limit: Option<u32>,
}

/// Arguments for `ingest`.
#[derive(Parser, Debug, Clone)]
pub struct IngestArgs {
    /// Message texts, one message each.
    #[arg(required = true)]
    pub messages: Vec<String>,

    /// Field attached to every message.
    #[arg(long = "field", value_name = "NAME=VALUE", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,

    /// Event time in milliseconds since the Unix epoch.
    #[arg(long)]
    pub timestamp: Option<i64>,
}

fn parse_constraint(s: &str) -> Result<FieldConstraint, String> {
    s.parse().map_err(|e: loginsight_api::LogInsightError| e.to_string())
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got {s}")),
    }
}
