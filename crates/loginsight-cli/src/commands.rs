//! Command implementations.

use std::io::Write;
use std::time::Duration;

use loginsight_api::{
    ClientConfig, IngestionRequest, LogInsightClient, Message, PendingOperation, Query, QueryKind,
    Transport,
};
use tracing::{debug, warn};

use crate::cli::{Cli, Commands, IngestArgs, QueryArgs};
use crate::error::CliError;
use crate::output::{OutputFormat, SessionSummary};

/// Builds the client configuration from the optional file and flag overrides.
///
/// # Errors
///
/// Fails if the file cannot be loaded, or if no file is given and the host or
/// user is missing.
pub fn resolve_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => {
            let host = cli
                .host
                .clone()
                .ok_or_else(|| CliError::Config("--host or --config is required".into()))?;
            let user = cli
                .user
                .clone()
                .ok_or_else(|| CliError::Config("--user or --config is required".into()))?;
            ClientConfig::new(host, user, cli.password.clone().unwrap_or_default())
        }
    };

    if let Some(host) = &cli.host {
        config.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(user) = &cli.user {
        config.user.clone_from(user);
    }
    if let Some(password) = &cli.password {
        config.password.clone_from(password);
    }
    Ok(config)
}

/// Builds a query of kind `K` from command-line arguments.
#[must_use]
pub fn build_query<K: QueryKind>(args: &QueryArgs) -> Query<K> {
    let query = Query::new().set_constraints(args.constraints.clone());
    match args.limit {
        Some(limit) => query.limit(limit),
        None => query,
    }
}

/// Builds an ingestion batch with one message per text.
#[must_use]
pub fn build_batch(args: &IngestArgs) -> IngestionRequest {
    args.messages
        .iter()
        .map(|text| {
            let mut message = Message::new(text.as_str());
            if let Some(ts) = args.timestamp {
                message = message.with_timestamp(ts);
            }
            for (name, value) in &args.fields {
                message.add_field(name.as_str(), value.as_str());
            }
            message
        })
        .collect()
}

/// Waits for `pending`, cancelling it after `timeout_secs`.
async fn finish<R>(mut pending: PendingOperation<R>, timeout_secs: u64) -> Result<R, CliError> {
    let outcome = pending.wait_timeout(Duration::from_secs(timeout_secs)).await;
    match outcome {
        Some(outcome) => Ok(outcome?),
        None => {
            warn!(operation = %pending.operation(), timeout_secs, "request timed out");
            pending.cancel();
            Err(CliError::Timeout(timeout_secs))
        }
    }
}

/// Runs `command` against an authenticated client and writes the result.
///
/// # Errors
///
/// Returns the client error, a timeout, or an output error.
pub async fn execute<T, W>(
    client: &LogInsightClient<T>,
    command: &Commands,
    format: OutputFormat,
    timeout_secs: u64,
    out: &mut W,
) -> Result<(), CliError>
where
    T: Transport,
    W: Write,
{
    match command {
        Commands::Login => {
            let session = client
                .session()
                .ok_or_else(|| CliError::from(loginsight_api::LogInsightError::no_session()))?;
            format.write(out, &SessionSummary::from(session.as_ref()))
        }
        Commands::Query(args) => {
            let query = build_query(args);
            debug!(path = %query.to_url_string(), "running message query");
            let response = finish(client.message_query(&query)?, timeout_secs).await?;
            format.write(out, &response)
        }
        Commands::Aggregate(args) => {
            let query = build_query(args);
            debug!(path = %query.to_url_string(), "running aggregate query");
            let response = finish(client.aggregate_query(&query)?, timeout_secs).await?;
            format.write(out, &response)
        }
        Commands::Ingest(args) => {
            let batch = build_batch(args);
            let response = finish(client.ingest(&batch)?, timeout_secs).await?;
            format.write(out, &response)
        }
    }
}

/// Connects, logs in and runs the parsed command line.
///
/// # Errors
///
/// Returns any configuration, client or output failure.
pub async fn run<W: Write>(cli: Cli, out: &mut W) -> Result<(), CliError> {
    let config = resolve_config(&cli)?;
    let client = LogInsightClient::connect(config).await?;
    let result = execute(
        &client,
        &cli.command,
        OutputFormat::new(cli.format),
        cli.timeout,
        out,
    )
    .await;
    client.close();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use loginsight_api::{Messages, Operator};

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("loginsight").chain(args.iter().copied()))
    }

    #[test]
    fn config_from_flags() {
        let cli = parse(&["--host", "li", "--user", "admin", "--password", "pw", "login"]);
        let config = resolve_config(&cli).expect("config");
        assert_eq!(config.host, "li");
        assert_eq!(config.user, "admin");
        assert_eq!(config.password, "pw");
        assert_eq!(config.port, 443);
    }

    #[test]
    fn config_requires_host() {
        let cli = parse(&["--user", "admin", "login"]);
        assert!(matches!(resolve_config(&cli), Err(CliError::Config(_))));
    }

    #[test]
    fn flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "host = \"from-file\"\nuser = \"admin\"\nport = 8443").expect("write");
        let path = file.path().to_str().expect("path");

        let cli = parse(&["--config", path, "--host", "from-flag", "login"]);
        let config = resolve_config(&cli).expect("config");
        assert_eq!(config.host, "from-flag");
        assert_eq!(config.port, 8443);
        assert_eq!(config.user, "admin");
    }

    #[test]
    fn missing_config_file_is_client_error() {
        let cli = parse(&["--config", "/nonexistent/loginsight.toml", "login"]);
        assert!(matches!(resolve_config(&cli), Err(CliError::Client(_))));
    }

    #[test]
    fn query_from_args() {
        let args = QueryArgs {
            constraints: vec!["vclap_caseid/EQ+1423244".parse().expect("constraint")],
            limit: Some(10),
        };
        let query: Query<Messages> = build_query(&args);
        assert_eq!(query.to_url_string(), "events/vclap_caseid/EQ+1423244?limit=10");
        assert_eq!(query.constraints()[0].operator(), Operator::Eq);
    }

    #[test]
    fn batch_from_args() {
        let args = IngestArgs {
            messages: vec!["a".into(), "b".into()],
            fields: vec![("host".into(), "web-1".into())],
            timestamp: Some(5),
        };
        let batch = build_batch(&args);
        assert_eq!(batch.len(), 2);
        assert!(batch
            .messages()
            .iter()
            .all(|m| m.field("host") == Some("web-1") && m.timestamp() == Some(5)));
    }
}
