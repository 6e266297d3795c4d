//! Transport capability used by the request executor.
//!
//! A [`Transport`] performs one HTTP exchange per [`dispatch`](Transport::dispatch)
//! and reports the outcome through a [`ResponseHandler`]. Handlers may be
//! invoked from any thread, and a misbehaving transport may invoke them more
//! than once; implementations of [`ResponseHandler`] are expected to honor
//! only the first call.
//!
//! The production implementation is [`crate::http::HttpTransport`]. Tests
//! substitute their own.

use std::io::{self, Read};
use std::sync::Arc;

use bytes::{Buf, Bytes};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use url::Url;

use crate::error::BoxError;

/// A fully built request, ready for dispatch.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Optional request body.
    pub body: Option<Bytes>,
}

impl TransportRequest {
    /// Creates a request without headers or body.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Header value as a string, if present and visible ASCII.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A response body, read synchronously by the executor.
///
/// Reading is separate from decoding so that an I/O fault while streaming the
/// bytes can be told apart from malformed content.
pub struct ResponseBody {
    reader: Box<dyn Read + Send>,
}

impl ResponseBody {
    /// A body backed by bytes already in memory.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            reader: Box::new(bytes.into().reader()),
        }
    }

    /// A body backed by an arbitrary reader.
    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self {
            reader: Box::new(reader),
        }
    }

    /// A body whose first read fails with `error`.
    #[must_use]
    pub fn failed(error: io::Error) -> Self {
        Self {
            reader: Box::new(FailingReader(Some(error))),
        }
    }

    /// An empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_bytes(Bytes::new())
    }

    /// Reads the whole body.
    pub fn read_to_end(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.reader.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseBody").finish_non_exhaustive()
    }
}

struct FailingReader(Option<io::Error>);

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(self
            .0
            .take()
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "body already failed")))
    }
}

/// A response whose status line has been received.
#[derive(Debug)]
pub struct TransportResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Body, not yet read.
    pub body: ResponseBody,
}

impl TransportResponse {
    /// Creates a response with no headers.
    #[must_use]
    pub fn new(status: StatusCode, body: ResponseBody) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }
}

/// Outcome callbacks for a dispatched request.
pub trait ResponseHandler: Send + Sync {
    /// The exchange completed and a status line was received.
    fn completed(&self, response: TransportResponse);

    /// The exchange failed before a response was received.
    fn failed(&self, error: BoxError);

    /// The exchange was cancelled.
    fn cancelled(&self);
}

/// Cancels an in-flight dispatch.
pub trait CancelHandle: Send + Sync {
    /// Requests cancellation. Has no effect once the exchange has finished.
    fn cancel(&self);
}

/// A handle for transports that cannot cancel.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCancel;

impl CancelHandle for NoopCancel {
    fn cancel(&self) {}
}

/// An asynchronous HTTP transport.
pub trait Transport: Send + Sync + 'static {
    /// Starts `request` and returns immediately. The outcome is delivered to
    /// `handler`, possibly before this method returns.
    fn dispatch(
        &self,
        request: TransportRequest,
        handler: Arc<dyn ResponseHandler>,
    ) -> Box<dyn CancelHandle>;

    /// Releases connection resources. Later dispatches may fail.
    fn close(&self) {}
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn dispatch(
        &self,
        request: TransportRequest,
        handler: Arc<dyn ResponseHandler>,
    ) -> Box<dyn CancelHandle> {
        (**self).dispatch(request, handler)
    }

    fn close(&self) {
        (**self).close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_from_bytes_reads_fully() {
        let body = ResponseBody::from_bytes(Bytes::from_static(b"{\"a\":1}"));
        assert_eq!(body.read_to_end().expect("read"), b"{\"a\":1}");
    }

    #[test]
    fn failed_body_reports_io_error() {
        let body = ResponseBody::failed(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        let err = body.read_to_end().expect_err("should fail");
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn empty_body() {
        assert!(ResponseBody::empty().read_to_end().expect("read").is_empty());
    }

    #[test]
    fn request_header_lookup() {
        let mut request = TransportRequest::new(
            Method::GET,
            Url::parse("https://example.com/api/v1/events").expect("url"),
        );
        request
            .headers
            .insert("x-li-timestamp", "123".parse().expect("header"));
        assert_eq!(request.header("x-li-timestamp"), Some("123"));
        assert_eq!(request.header("missing"), None);
    }
}
