//! Error types for Log Insight API operations.
//!
//! Every failure surfaced by the client funnels into [`LogInsightError`]. The
//! human-readable message of each error is fixed per failure path and
//! operation; existing callers match on that text, so the strings below are
//! part of the public contract.

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

/// Boxed error used for wrapped causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for Log Insight operations.
pub type Result<T> = std::result::Result<T, LogInsightError>;

/// Message for an I/O fault while reading a query or ingestion response body.
pub const UNABLE_TO_PROCESS_QUERY_RESPONSE: &str = "Unable to process the query response";
/// Message for an I/O fault while reading the login response body.
pub const UNABLE_TO_PROCESS_LOGIN_RESPONSE: &str = "Unable to process the login response";
/// Message for a message or aggregate query whose response could not be decoded.
pub const MESSAGE_QUERY_FAILED: &str = "Message query failed";
/// Message for a message or aggregate query the transport failed to perform.
pub const FAILED_MESSAGE_QUERY: &str = "Failed message Query";
/// Message for a cancelled message or aggregate query.
pub const CANCELLED_MESSAGE_QUERY: &str = "Cancelled message Query";
/// Message for any failed ingestion.
pub const INGESTION_FAILED: &str = "Ingestion failed";
/// Message for a cancelled ingestion.
pub const INGESTION_CANCELLED: &str = "Ingestion cancelled";
/// Message for a failed login handshake.
pub const LOGIN_FAILED: &str = "Login failed";
/// Message for a cancelled login handshake.
pub const LOGIN_CANCELLED: &str = "Login cancelled";
/// Message for a login rejected by the server.
pub const AUTHENTICATION_FAILED: &str = "Authentication failed";
/// Message for a request issued before any session exists.
pub const NO_ACTIVE_SESSION: &str = "No active session, login first";

/// The remote operation an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Session handshake.
    Login,
    /// Event query (`events`).
    MessageQuery,
    /// Aggregated event query (`aggregated-events`).
    AggregateQuery,
    /// Message ingestion.
    Ingestion,
}

impl Operation {
    /// Message used when the transport reports a failure.
    #[must_use]
    pub const fn failed_message(self) -> &'static str {
        match self {
            Self::Login => LOGIN_FAILED,
            Self::MessageQuery | Self::AggregateQuery => FAILED_MESSAGE_QUERY,
            Self::Ingestion => INGESTION_FAILED,
        }
    }

    /// Message used when the operation was cancelled.
    #[must_use]
    pub const fn cancelled_message(self) -> &'static str {
        match self {
            Self::Login => LOGIN_CANCELLED,
            Self::MessageQuery | Self::AggregateQuery => CANCELLED_MESSAGE_QUERY,
            Self::Ingestion => INGESTION_CANCELLED,
        }
    }

    /// Message used when the response body could not be read.
    #[must_use]
    pub const fn read_message(self) -> &'static str {
        match self {
            Self::Login => UNABLE_TO_PROCESS_LOGIN_RESPONSE,
            Self::MessageQuery | Self::AggregateQuery | Self::Ingestion => {
                UNABLE_TO_PROCESS_QUERY_RESPONSE
            }
        }
    }

    /// Message used when the body was read but could not be decoded, or the
    /// status line was not a success.
    #[must_use]
    pub const fn decode_message(self) -> &'static str {
        match self {
            Self::Login => LOGIN_FAILED,
            Self::MessageQuery | Self::AggregateQuery => MESSAGE_QUERY_FAILED,
            Self::Ingestion => INGESTION_FAILED,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Login => "login",
            Self::MessageQuery => "message query",
            Self::AggregateQuery => "aggregate query",
            Self::Ingestion => "ingestion",
        };
        f.write_str(name)
    }
}

/// Where in the request lifecycle an error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The transport failed to perform the request.
    Transport,
    /// The request was cancelled before it completed.
    Cancelled,
    /// An I/O fault occurred while reading the response body.
    Read,
    /// The response body was read but could not be decoded.
    Parse,
    /// The server answered with a non-success status code.
    Status(u16),
    /// No session exists, or the server rejected the credentials.
    Authentication,
    /// The request could not be built (bad host, bad header value).
    InvalidRequest,
    /// Configuration could not be loaded.
    Config,
}

/// The single error type surfaced by the client.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct LogInsightError {
    kind: ErrorKind,
    operation: Option<Operation>,
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxError>,
}

impl LogInsightError {
    fn new(
        kind: ErrorKind,
        operation: Option<Operation>,
        message: impl Into<Cow<'static, str>>,
        source: Option<BoxError>,
    ) -> Self {
        Self {
            kind,
            operation,
            message: message.into(),
            source,
        }
    }

    /// The transport reported a failure for `operation`.
    pub fn transport(operation: Operation, cause: impl Into<BoxError>) -> Self {
        Self::new(
            ErrorKind::Transport,
            Some(operation),
            operation.failed_message(),
            Some(cause.into()),
        )
    }

    /// The transport gave up on `operation` without invoking any outcome.
    #[must_use]
    pub fn abandoned(operation: Operation) -> Self {
        Self::new(
            ErrorKind::Transport,
            Some(operation),
            operation.failed_message(),
            Some("transport dropped the request without completing it".into()),
        )
    }

    /// `operation` was cancelled.
    #[must_use]
    pub fn cancelled(operation: Operation) -> Self {
        Self::new(
            ErrorKind::Cancelled,
            Some(operation),
            operation.cancelled_message(),
            None,
        )
    }

    /// Reading the response body of `operation` failed.
    #[must_use]
    pub fn read(operation: Operation, cause: std::io::Error) -> Self {
        Self::new(
            ErrorKind::Read,
            Some(operation),
            operation.read_message(),
            Some(Box::new(cause)),
        )
    }

    /// The response body of `operation` could not be decoded.
    pub fn parse(operation: Operation, cause: impl Into<BoxError>) -> Self {
        Self::new(
            ErrorKind::Parse,
            Some(operation),
            operation.decode_message(),
            Some(cause.into()),
        )
    }

    /// The server answered `operation` with a non-success status.
    #[must_use]
    pub fn status(operation: Operation, code: u16) -> Self {
        if operation == Operation::Login && matches!(code, 401 | 403) {
            return Self::new(
                ErrorKind::Authentication,
                Some(operation),
                AUTHENTICATION_FAILED,
                Some(format!("server answered with status {code}").into()),
            );
        }
        Self::new(
            ErrorKind::Status(code),
            Some(operation),
            operation.decode_message(),
            Some(format!("server answered with status {code}").into()),
        )
    }

    /// No session is available for an authenticated request.
    #[must_use]
    pub fn no_session() -> Self {
        Self::new(ErrorKind::Authentication, None, NO_ACTIVE_SESSION, None)
    }

    /// The request could not be constructed.
    pub fn invalid_request(message: impl Into<String>, cause: Option<BoxError>) -> Self {
        Self::new(ErrorKind::InvalidRequest, None, message.into(), cause)
    }

    /// Configuration loading failed.
    pub fn config(message: impl Into<String>, cause: Option<BoxError>) -> Self {
        Self::new(ErrorKind::Config, None, message.into(), cause)
    }

    /// The failure category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The operation that failed, if the failure belongs to one.
    #[must_use]
    pub fn operation(&self) -> Option<Operation> {
        self.operation
    }

    /// The fixed, caller-visible message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if this error came from a cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.kind == ErrorKind::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use test_case::test_case;

    #[test_case(Operation::MessageQuery, "Failed message Query", "Cancelled message Query", "Unable to process the query response", "Message query failed" ; "message query")]
    #[test_case(Operation::AggregateQuery, "Failed message Query", "Cancelled message Query", "Unable to process the query response", "Message query failed" ; "aggregate query")]
    #[test_case(Operation::Ingestion, "Ingestion failed", "Ingestion cancelled", "Unable to process the query response", "Ingestion failed" ; "ingestion")]
    #[test_case(Operation::Login, "Login failed", "Login cancelled", "Unable to process the login response", "Login failed" ; "login")]
    fn operation_messages(op: Operation, failed: &str, cancelled: &str, read: &str, decode: &str) {
        assert_eq!(op.failed_message(), failed);
        assert_eq!(op.cancelled_message(), cancelled);
        assert_eq!(op.read_message(), read);
        assert_eq!(op.decode_message(), decode);
    }

    #[test]
    fn display_is_the_fixed_message() {
        let err = LogInsightError::cancelled(Operation::Ingestion);
        assert_eq!(err.to_string(), "Ingestion cancelled");
        assert_eq!(err.message(), "Ingestion cancelled");
        assert!(err.is_cancelled());
        assert!(err.source().is_none());
    }

    #[test]
    fn read_error_keeps_io_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = LogInsightError::read(Operation::MessageQuery, io);
        assert_eq!(err.kind(), ErrorKind::Read);
        assert_eq!(err.operation(), Some(Operation::MessageQuery));

        let source = err.source().expect("source");
        assert!(source.downcast_ref::<std::io::Error>().is_some());
    }

    #[test]
    fn transport_error_wraps_cause() {
        let err = LogInsightError::transport(Operation::AggregateQuery, "connection refused");
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.to_string(), "Failed message Query");
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("connection refused")
        );
    }

    #[test]
    fn status_error_on_query_uses_decode_message() {
        let err = LogInsightError::status(Operation::MessageQuery, 500);
        assert_eq!(err.kind(), ErrorKind::Status(500));
        assert_eq!(err.message(), "Message query failed");
    }

    #[test]
    fn rejected_login_is_authentication_failure() {
        let err = LogInsightError::status(Operation::Login, 401);
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.message(), "Authentication failed");
    }

    #[test]
    fn no_session_has_no_operation() {
        let err = LogInsightError::no_session();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert!(err.operation().is_none());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LogInsightError>();
    }
}
