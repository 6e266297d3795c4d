//! CLI error types.

use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// The client reported a failure.
    #[error(transparent)]
    Client(#[from] loginsight_api::LogInsightError),

    /// Required settings are missing.
    #[error("configuration error: {0}")]
    Config(String),

    /// No response arrived in time; the request was cancelled.
    #[error("no response within {0} seconds, request cancelled")]
    Timeout(u64),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use loginsight_api::{LogInsightError, Operation};

    #[test]
    fn client_error_keeps_message() {
        let err = CliError::from(LogInsightError::cancelled(Operation::MessageQuery));
        assert_eq!(err.to_string(), "Cancelled message Query");
    }

    #[test]
    fn cli_error_display_timeout() {
        assert_eq!(
            CliError::Timeout(5).to_string(),
            "no response within 5 seconds, request cancelled"
        );
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        assert!(matches!(CliError::from(io_err), CliError::Io(_)));
    }
}
