//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use loginsight_api::{AggregateResponse, IngestionResponse, MessageQueryResponse, Session};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => value.write_table(writer)?,
        }
        Ok(())
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Session details shown after `login`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    /// Authenticated user.
    pub user_id: String,
    /// Session lifetime in seconds.
    pub ttl_secs: u64,
    /// Expiry time, RFC 3339.
    pub expires_at: String,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user_id().to_string(),
            ttl_secs: session.ttl().as_secs(),
            expires_at: session.expires_at().to_rfc3339(),
        }
    }
}

impl TableDisplay for SessionSummary {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "User:        {}", self.user_id)?;
        writeln!(writer, "TTL:         {}s", self.ttl_secs)?;
        writeln!(writer, "Expires at:  {}", self.expires_at)?;
        Ok(())
    }
}

impl TableDisplay for MessageQueryResponse {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.events.is_empty() {
            writeln!(writer, "No matching events")?;
            return Ok(());
        }

        writeln!(writer, "{:<15}  TEXT", "TIMESTAMP (ms)")?;
        writeln!(writer, "{}", "─".repeat(80))?;
        for event in &self.events {
            writeln!(writer, "{:<15}  {}", event.timestamp, event.text.trim_end())?;
        }

        writeln!(writer)?;
        writeln!(
            writer,
            "Total: {} event(s){}",
            self.events.len(),
            if self.complete { "" } else { " (partial)" }
        )?;
        Ok(())
    }
}

impl TableDisplay for AggregateResponse {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.bins.is_empty() {
            writeln!(writer, "No bins")?;
            return Ok(());
        }

        writeln!(writer, "{:<15}  {:<15}  {:>12}", "FROM (ms)", "TO (ms)", "VALUE")?;
        writeln!(writer, "{}", "─".repeat(46))?;
        for bin in &self.bins {
            writeln!(
                writer,
                "{:<15}  {:<15}  {:>12}",
                bin.min_timestamp, bin.max_timestamp, bin.value
            )?;
        }
        Ok(())
    }
}

impl TableDisplay for IngestionResponse {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Status:    {}", self.status)?;
        writeln!(writer, "Ingested:  {}", self.ingested)?;
        if !self.message.is_empty() {
            writeln!(writer, "Message:   {}", self.message)?;
        }
        Ok(())
    }
}
