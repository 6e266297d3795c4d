//! # loginsight-api
//!
//! Async client for the Log Insight REST API.
//!
//! This crate provides:
//!
//! - [`ConstraintBuilder`]: Field constraints rendered as URL path segments
//! - [`MessageQuery`] / [`AggregateQuery`]: Typed queries with result limits
//! - [`SessionManager`]: Session handshake and authentication headers
//! - [`RequestExecutor`]: Bridges callback transports into awaitable results
//! - [`IngestionRequest`]: Message batches for the ingestion endpoint
//! - [`LogInsightError`]: Failures with fixed, user-facing messages
//! - [`LogInsightClient`]: High-level client tying the above together
//!
//! ## Example
//!
//! ```rust
//! use loginsight_api::{ConstraintBuilder, MessageQuery};
//!
//! let constraints = ConstraintBuilder::new()
//!     .eq("vclap_caseid", "1423244")
//!     .gt("timestamp", "0")
//!     .build();
//!
//! let query = MessageQuery::new().limit(100).set_constraints(constraints);
//! assert_eq!(
//!     query.to_url_string(),
//!     "events/vclap_caseid/EQ+1423244/timestamp/GT+0?limit=100"
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod constraint;
pub mod error;
pub mod executor;
pub mod http;
pub mod ingestion;
pub mod query;
pub mod session;
pub mod transport;
pub mod types;

// Re-export main types
pub use client::LogInsightClient;
pub use config::ClientConfig;
pub use constraint::{ConstraintBuilder, FieldConstraint, Operator};
pub use error::{BoxError, ErrorKind, LogInsightError, Operation, Result};
pub use executor::{PendingOperation, RequestExecutor};
pub use http::HttpTransport;
pub use ingestion::{IngestionRequest, Message};
pub use query::{AggregateQuery, Aggregates, MessageQuery, Messages, Query, QueryKind};
pub use session::{Credentials, Session, SessionManager};
pub use transport::{
    CancelHandle, NoopCancel, ResponseBody, ResponseHandler, Transport, TransportRequest,
    TransportResponse,
};
pub use types::{
    AggregateResponse, Bin, Event, Field, IngestionResponse, LoginResponse, MessageQueryResponse,
};
