//! reqwest-backed [`Transport`].
//!
//! Each dispatch runs as one task on the tokio runtime the transport was
//! created on. The body is buffered inside the task; a fault while buffering
//! is handed to the executor as a failing [`ResponseBody`] so it surfaces as a
//! read error rather than a transport error.
//!
//! [`Transport::close`] drops the client, which releases its connection pool,
//! and aborts every task still in flight. An aborted request never reports an
//! outcome, so its pending operation resolves as a transport failure.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinSet};
use tracing::{debug, trace};

use crate::error::{LogInsightError, Result};
use crate::transport::{
    CancelHandle, NoopCancel, ResponseBody, ResponseHandler, Transport, TransportRequest,
    TransportResponse,
};

/// HTTPS transport built on [`reqwest::Client`].
#[derive(Debug)]
pub struct HttpTransport {
    /// `None` once closed.
    client: RwLock<Option<reqwest::Client>>,
    runtime: Handle,
    tasks: Mutex<JoinSet<()>>,
}

impl HttpTransport {
    /// Creates a transport with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Fails when called outside a tokio runtime or when the TLS backend
    /// cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LogInsightError::config("failed to build HTTP client", Some(e.into())))?;
        Self::with_client(client)
    }

    /// Wraps an existing client.
    ///
    /// # Errors
    ///
    /// Fails when called outside a tokio runtime.
    pub fn with_client(client: reqwest::Client) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            LogInsightError::config("HTTP transport requires a tokio runtime", Some(e.into()))
        })?;
        Ok(Self {
            client: RwLock::new(Some(client)),
            runtime,
            tasks: Mutex::new(JoinSet::new()),
        })
    }

    /// Returns true once [`Transport::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.client.read().is_none()
    }

    /// Number of dispatched requests whose task has not been reaped yet.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        let mut tasks = self.tasks.lock();
        while tasks.try_join_next().is_some() {}
        tasks.len()
    }
}

struct TaskCancel(AbortHandle);

impl CancelHandle for TaskCancel {
    fn cancel(&self) {
        self.0.abort();
    }
}

impl Transport for HttpTransport {
    fn dispatch(
        &self,
        request: TransportRequest,
        handler: Arc<dyn ResponseHandler>,
    ) -> Box<dyn CancelHandle> {
        // Held until the task is registered so `close` cannot miss it.
        let mut tasks = self.tasks.lock();
        let Some(client) = self.client.read().clone() else {
            drop(tasks);
            handler.failed("transport is closed".into());
            return Box::new(NoopCancel);
        };

        let TransportRequest {
            method,
            url,
            headers,
            body,
        } = request;
        let mut builder = client.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let task = async move {
            match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    let headers = response.headers().clone();
                    trace!(%status, "response status received");
                    let body = match response.bytes().await {
                        Ok(bytes) => ResponseBody::from_bytes(bytes),
                        Err(e) => ResponseBody::failed(io::Error::other(e)),
                    };
                    handler.completed(TransportResponse {
                        status,
                        headers,
                        body,
                    });
                }
                Err(e) => handler.failed(Box::new(e)),
            }
        };

        while tasks.try_join_next().is_some() {}
        let abort = tasks.spawn_on(task, &self.runtime);
        Box::new(TaskCancel(abort))
    }

    fn close(&self) {
        if self.client.write().take().is_none() {
            return;
        }
        let mut tasks = self.tasks.lock();
        let in_flight = tasks.len();
        tasks.abort_all();
        debug!(in_flight, "HTTP transport closed");
    }
}
