//! Test helpers: a scripted in-memory transport.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use loginsight_api::{
    CancelHandle, ClientConfig, LogInsightClient, ResponseBody, ResponseHandler, Transport,
    TransportRequest, TransportResponse,
};
use parking_lot::Mutex;
use reqwest::StatusCode;

/// Session id returned by the scripted login.
pub const SESSION_ID: &str = "sess-42";

/// Body of a successful login.
pub const LOGIN_OK: &str = r#"{"userId":"user-7","sessionId":"sess-42","ttl":1800}"#;

/// How the transport answers one dispatch.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Completes with the given status and body.
    Respond(StatusCode, String),
    /// Completes with 200 but the body fails to read.
    BrokenBody,
    /// Reports a transport failure.
    Fail(&'static str),
    /// Reports a transport-side cancellation.
    Cancel,
    /// Keeps the handler for the test to resolve later.
    Hold,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::Respond(StatusCode::OK, body.into())
    }
}

/// Transport that answers from a script and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<TransportRequest>>,
    held: Mutex<Vec<Arc<dyn ResponseHandler>>>,
    cancels: Arc<AtomicUsize>,
    closes: AtomicUsize,
}

struct CountingCancel(Arc<AtomicUsize>);

impl CancelHandle for CountingCancel {
    fn cancel(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        let transport = Self::default();
        transport.script.lock().extend(replies);
        Arc::new(transport)
    }

    pub fn push(&self, reply: Reply) {
        self.script.lock().push_back(reply);
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> TransportRequest {
        self.requests
            .lock()
            .last()
            .cloned()
            .expect("no request dispatched")
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Resolves the oldest held request with `reply`.
    pub fn release(&self, reply: Reply) {
        let handler = self.held.lock().remove(0);
        answer(handler.as_ref(), reply);
    }
}

fn answer(handler: &dyn ResponseHandler, reply: Reply) {
    match reply {
        Reply::Respond(status, body) => {
            handler.completed(TransportResponse::new(status, ResponseBody::from_bytes(body)));
        }
        Reply::BrokenBody => handler.completed(TransportResponse::new(
            StatusCode::OK,
            ResponseBody::failed(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        )),
        Reply::Fail(reason) => handler.failed(reason.into()),
        Reply::Cancel => handler.cancelled(),
        Reply::Hold => unreachable!("hold is not an answer"),
    }
}

impl Transport for ScriptedTransport {
    fn dispatch(
        &self,
        request: TransportRequest,
        handler: Arc<dyn ResponseHandler>,
    ) -> Box<dyn CancelHandle> {
        self.requests.lock().push(request);
        let reply = self.script.lock().pop_front().unwrap_or(Reply::Hold);
        match reply {
            Reply::Hold => self.held.lock().push(handler),
            reply => answer(handler.as_ref(), reply),
        }
        Box::new(CountingCancel(Arc::clone(&self.cancels)))
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::new("li.example.com", "admin", "secret").with_agent_id("agent-1")
}

/// Logs in through a fresh scripted transport; `replies` follow the login.
pub async fn logged_in(
    replies: Vec<Reply>,
) -> (LogInsightClient<Arc<ScriptedTransport>>, Arc<ScriptedTransport>) {
    let mut script = vec![Reply::ok(LOGIN_OK)];
    script.extend(replies);
    let transport = ScriptedTransport::new(script);
    let client = LogInsightClient::with_transport(config(), Arc::clone(&transport))
        .await
        .expect("login");
    (client, transport)
}
