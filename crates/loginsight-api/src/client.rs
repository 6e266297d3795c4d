//! High-level Log Insight client.
//!
//! # Example
//!
//! ```rust,no_run
//! use loginsight_api::{ClientConfig, ConstraintBuilder, LogInsightClient, MessageQuery};
//!
//! # async fn example() -> loginsight_api::Result<()> {
//! let config = ClientConfig::from_file("loginsight.toml")?;
//! let client = LogInsightClient::connect(config).await?;
//!
//! let query = MessageQuery::new()
//!     .limit(100)
//!     .set_constraints(ConstraintBuilder::new().contains("text", "error").build());
//! let response = client.message_query(&query)?.await?;
//! println!("{} events", response.events.len());
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reqwest::Method;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Operation, Result};
use crate::executor::{PendingOperation, RequestExecutor};
use crate::http::HttpTransport;
use crate::ingestion::IngestionRequest;
use crate::query::{AggregateQuery, MessageQuery, Query, QueryKind};
use crate::session::{set_json_headers, Session, SessionManager};
use crate::transport::{Transport, TransportRequest};
use crate::types::{AggregateResponse, IngestionResponse, MessageQueryResponse};

/// Client for the query, aggregation and ingestion API.
///
/// Requests never block: each returns a [`PendingOperation`] immediately. A
/// request fails synchronously only when it cannot be built, for example
/// because the host is invalid or no session exists.
///
/// Dropping the client closes its transport.
pub struct LogInsightClient<T: Transport = HttpTransport> {
    config: ClientConfig,
    executor: RequestExecutor<T>,
    session: SessionManager,
    closed: AtomicBool,
}

impl LogInsightClient<HttpTransport> {
    /// Connects over HTTPS and logs in with the configured credentials.
    ///
    /// Must be called within a tokio runtime.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.request_timeout())?;
        Self::with_transport(config, transport).await
    }
}

impl<T: Transport> LogInsightClient<T> {
    /// Logs in through `transport` instead of the default HTTPS transport.
    ///
    /// If the handshake fails the transport is closed before returning.
    pub async fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        let client = Self::unauthenticated(config, transport);
        client.login().await?;
        Ok(client)
    }

    /// Creates a client without performing the handshake.
    pub fn unauthenticated(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            executor: RequestExecutor::new(Arc::new(transport)),
            session: SessionManager::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Performs the handshake, replacing any existing session.
    pub async fn login(&self) -> Result<Arc<Session>> {
        let url = self.config.session_url()?;
        self.session
            .login(&self.executor, url, &self.config.credentials())
            .await
    }

    /// The current session id.
    ///
    /// # Errors
    ///
    /// Returns an `Authentication` error if no login has succeeded.
    pub fn session_id(&self) -> Result<String> {
        self.session.session_id()
    }

    /// The current session, if any.
    #[must_use]
    pub fn session(&self) -> Option<Arc<Session>> {
        self.session.current()
    }

    /// The client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        self.executor.transport()
    }

    /// Builds the GET request for `query` without dispatching it.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidRequest` error if the configured host does not form
    /// a valid URL, or an `Authentication` error ("No active session, login
    /// first") if no login has succeeded.
    pub fn query_request<K: QueryKind>(&self, query: &Query<K>) -> Result<TransportRequest> {
        let url = self.config.query_url(query)?;
        let mut request = TransportRequest::new(Method::GET, url);
        set_json_headers(&mut request.headers);
        self.session.apply_headers(&mut request.headers)?;
        Ok(request)
    }

    /// Builds the POST request for `batch` without dispatching it.
    ///
    /// # Errors
    ///
    /// Same as [`query_request`](Self::query_request), plus an
    /// `InvalidRequest` error if the batch cannot be encoded.
    pub fn ingestion_request(&self, batch: &IngestionRequest) -> Result<TransportRequest> {
        let url = self.config.ingestion_url()?;
        let mut request = TransportRequest::new(Method::POST, url);
        set_json_headers(&mut request.headers);
        self.session.apply_headers(&mut request.headers)?;
        request.body = Some(batch.to_json()?.into());
        Ok(request)
    }

    /// Runs a query of any kind.
    ///
    /// # Errors
    ///
    /// Fails synchronously, before anything is dispatched, when the request
    /// cannot be built: no active session or an invalid host. Every other
    /// failure (transport, status, decoding, cancellation) resolves through
    /// the returned [`PendingOperation`].
    pub fn query<K: QueryKind>(&self, query: &Query<K>) -> Result<PendingOperation<K::Response>> {
        let request = self.query_request(query)?;
        Ok(self.executor.execute(request, K::OPERATION))
    }

    /// Runs an event query.
    ///
    /// # Errors
    ///
    /// See [`query`](Self::query).
    pub fn message_query(
        &self,
        query: &MessageQuery,
    ) -> Result<PendingOperation<MessageQueryResponse>> {
        self.query(query)
    }

    /// Runs an aggregate query.
    ///
    /// # Errors
    ///
    /// See [`query`](Self::query).
    pub fn aggregate_query(
        &self,
        query: &AggregateQuery,
    ) -> Result<PendingOperation<AggregateResponse>> {
        self.query(query)
    }

    /// Submits a batch of messages.
    ///
    /// The batch succeeds or fails as a whole.
    ///
    /// # Errors
    ///
    /// Fails synchronously when the request cannot be built: no active
    /// session, an invalid host, or a batch that does not serialize.
    /// Everything else resolves through the returned [`PendingOperation`].
    pub fn ingest(&self, batch: &IngestionRequest) -> Result<PendingOperation<IngestionResponse>> {
        debug!(messages = batch.len(), "submitting ingestion batch");
        let request = self.ingestion_request(batch)?;
        Ok(self.executor.execute(request, Operation::Ingestion))
    }

    /// Releases transport resources. Later calls are no-ops.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(host = %self.config.host, "closing client");
            self.executor.transport().close();
        }
    }
}

impl<T: Transport> Drop for LogInsightClient<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T: Transport> std::fmt::Debug for LogInsightClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogInsightClient")
            .field("config", &self.config)
            .field("session", &self.session.current())
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}
