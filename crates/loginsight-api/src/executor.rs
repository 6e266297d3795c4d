//! Bridges the callback-based [`Transport`] into awaitable results.
//!
//! Every call to [`RequestExecutor::execute`] creates one single-assignment
//! slot (a `tokio::sync::oneshot` channel guarded by a mutex) and hands the
//! transport a [`ResponseHandler`] that fills it. Whichever of `completed`,
//! `failed`, `cancelled` or a caller-side [`PendingOperation::cancel`] runs
//! first decides the outcome; every later attempt is ignored.
//!
//! ```text
//!  caller ──execute──► Transport::dispatch ──► completed / failed / cancelled
//!    │                                                  │
//!    └──── PendingOperation ◄──── oneshot ◄──── first resolution wins
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::future::FusedFuture;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::error::{BoxError, LogInsightError, Operation, Result};
use crate::transport::{CancelHandle, ResponseHandler, Transport, TransportRequest, TransportResponse};

/// Dispatches requests and decodes their responses.
pub struct RequestExecutor<T> {
    transport: Arc<T>,
}

impl<T> Clone for RequestExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T> std::fmt::Debug for RequestExecutor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor").finish_non_exhaustive()
    }
}

impl<T: Transport> RequestExecutor<T> {
    /// Creates an executor over `transport`.
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Dispatches `request` and returns a handle resolving to the decoded body.
    ///
    /// Never fails synchronously: every outcome, including transport errors,
    /// is delivered through the returned [`PendingOperation`].
    pub fn execute<R>(&self, request: TransportRequest, operation: Operation) -> PendingOperation<R>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let completion = Arc::new(Completion::<R>::new(operation, sender));
        let slot = Arc::downgrade(&completion);

        debug!(
            %operation,
            method = %request.method,
            path = request.url.path(),
            "dispatching request"
        );

        let handler: Arc<dyn ResponseHandler> = completion;
        let cancel = self.transport.dispatch(request, handler);

        PendingOperation {
            operation,
            receiver,
            slot,
            cancel,
            terminated: false,
        }
    }
}

/// The single-assignment slot shared with the transport.
struct Completion<R> {
    operation: Operation,
    sender: Mutex<Option<oneshot::Sender<Result<R>>>>,
    decode: PhantomData<fn() -> R>,
}

impl<R> Completion<R> {
    fn new(operation: Operation, sender: oneshot::Sender<Result<R>>) -> Self {
        Self {
            operation,
            sender: Mutex::new(Some(sender)),
            decode: PhantomData,
        }
    }

    fn is_resolved(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Stores `outcome` if nothing has been stored yet.
    fn resolve(&self, outcome: Result<R>) -> bool {
        let Some(sender) = self.sender.lock().take() else {
            trace!(operation = %self.operation, "ignoring resolution of a finished operation");
            return false;
        };
        if let Err(outcome) = &outcome {
            warn!(operation = %self.operation, error = %outcome, "operation failed");
        }
        // The caller may have dropped the handle; the outcome is then discarded.
        let _ = sender.send(outcome);
        true
    }
}

impl<R> ResponseHandler for Completion<R>
where
    R: DeserializeOwned + Send + 'static,
{
    fn completed(&self, response: TransportResponse) {
        trace!(operation = %self.operation, status = %response.status, "request completed");
        if self.is_resolved() {
            trace!(operation = %self.operation, "late completion ignored");
            return;
        }
        self.resolve(decode_response(self.operation, response));
    }

    fn failed(&self, error: BoxError) {
        trace!(operation = %self.operation, "request failed");
        self.resolve(Err(LogInsightError::transport(self.operation, error)));
    }

    fn cancelled(&self) {
        trace!(operation = %self.operation, "request cancelled");
        self.resolve(Err(LogInsightError::cancelled(self.operation)));
    }
}

/// Checks the status line, reads the body, then decodes it.
///
/// The read and decode steps fail with different messages.
fn decode_response<R: DeserializeOwned>(
    operation: Operation,
    response: TransportResponse,
) -> Result<R> {
    if !response.status.is_success() {
        return Err(LogInsightError::status(operation, response.status.as_u16()));
    }
    let bytes = response
        .body
        .read_to_end()
        .map_err(|e| LogInsightError::read(operation, e))?;
    serde_json::from_slice(&bytes).map_err(|e| LogInsightError::parse(operation, e))
}

/// An in-flight request.
///
/// Await it for the outcome. Dropping it detaches from the request without
/// cancelling it; use [`cancel`](Self::cancel) to stop the request.
#[must_use = "a pending operation does nothing unless awaited or cancelled"]
pub struct PendingOperation<R> {
    operation: Operation,
    receiver: oneshot::Receiver<Result<R>>,
    slot: Weak<Completion<R>>,
    cancel: Box<dyn CancelHandle>,
    terminated: bool,
}

impl<R> std::fmt::Debug for PendingOperation<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingOperation")
            .field("operation", &self.operation)
            .field("terminated", &self.terminated)
            .finish_non_exhaustive()
    }
}

impl<R> PendingOperation<R> {
    /// The operation this request performs.
    #[must_use]
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Returns true once an outcome has been decided.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.slot.upgrade().is_none_or(|c| c.is_resolved())
    }

    /// Cancels the request.
    ///
    /// If no outcome has been decided yet, the result becomes the cancellation
    /// error and the transport is asked to abort. Returns true if this call
    /// decided the outcome.
    pub fn cancel(&self) -> bool {
        let decided = match self.slot.upgrade() {
            Some(completion) => {
                completion.resolve(Err(LogInsightError::cancelled(self.operation)))
            }
            None => false,
        };
        if decided {
            debug!(operation = %self.operation, "cancelling request");
            self.cancel.cancel();
        }
        decided
    }

    /// Waits up to `timeout` for the outcome.
    ///
    /// Returns `None` on timeout; the request keeps running and the handle can
    /// be awaited again.
    pub async fn wait_timeout(&mut self, timeout: Duration) -> Option<Result<R>> {
        tokio::time::timeout(timeout, &mut *self).await.ok()
    }
}

impl<R> Future for PendingOperation<R> {
    type Output = Result<R>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.terminated {
            return Poll::Pending;
        }
        let outcome = match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Ok(outcome)) => outcome,
            Poll::Ready(Err(_)) => Err(LogInsightError::abandoned(this.operation)),
        };
        this.terminated = true;
        Poll::Ready(outcome)
    }
}

impl<R> FusedFuture for PendingOperation<R> {
    fn is_terminated(&self) -> bool {
        self.terminated
    }
}
