//! Session handshake and per-request authentication headers.
//!
//! A [`Session`] is created only by [`SessionManager::login`] and is never
//! renewed automatically. Logins are serialized; readers always observe a
//! complete session, possibly the one about to be replaced.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::error::{LogInsightError, Operation, Result};
use crate::executor::RequestExecutor;
use crate::transport::{Transport, TransportRequest};
use crate::types::LoginResponse;

/// Header carrying the session credential.
pub const SESSION_ID_HEADER: HeaderName = HeaderName::from_static("x-li-session-id");

/// Header carrying the request time in milliseconds since the Unix epoch.
pub const TIMESTAMP_HEADER: HeaderName = HeaderName::from_static("x-li-timestamp");

const APPLICATION_JSON: HeaderValue = HeaderValue::from_static("application/json");

/// User credentials for the session handshake.
#[derive(Clone, Serialize)]
pub struct Credentials {
    username: String,
    password: String,
    provider: String,
}

impl Credentials {
    /// Creates credentials for the given authentication provider.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            provider: provider.into(),
        }
    }

    /// The user name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The authentication provider.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("provider", &self.provider)
            .finish()
    }
}

/// An authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    id: String,
    user_id: String,
    ttl: Duration,
    created_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session that started at `created_at`.
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        ttl: Duration,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            ttl,
            created_at,
        }
    }

    fn from_login(response: LoginResponse) -> Self {
        Self::new(
            response.session_id,
            response.user_id,
            Duration::from_secs(response.ttl),
            Utc::now(),
        )
    }

    /// The session credential.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The authenticated user.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Lifetime granted by the server.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// When the handshake completed.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the server will consider the session expired.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::TimeDelta::MAX);
        self.created_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Returns true if the session lifetime has elapsed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    /// Returns true if the session lifetime has elapsed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("ttl", &self.ttl)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Owns the current session and stamps requests with it.
#[derive(Debug, Default)]
pub struct SessionManager {
    current: RwLock<Option<Arc<Session>>>,
    login_lock: tokio::sync::Mutex<()>,
}

impl SessionManager {
    /// Creates a manager with no session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Performs the handshake against `url` and stores the resulting session.
    ///
    /// Concurrent logins run one at a time. On failure the previous session,
    /// if any, is kept.
    pub async fn login<T: Transport>(
        &self,
        executor: &RequestExecutor<T>,
        url: Url,
        credentials: &Credentials,
    ) -> Result<Arc<Session>> {
        let _guard = self.login_lock.lock().await;

        debug!(user = credentials.username(), "logging in");
        let mut request = TransportRequest::new(Method::POST, url);
        set_json_headers(&mut request.headers);
        let body = serde_json::to_vec(credentials).map_err(|e| {
            LogInsightError::invalid_request("failed to serialize credentials", Some(e.into()))
        })?;
        request.body = Some(body.into());

        let response: LoginResponse = executor.execute(request, Operation::Login).await?;
        let session = Arc::new(Session::from_login(response));
        info!(
            user_id = session.user_id(),
            ttl_secs = session.ttl().as_secs(),
            "session established"
        );
        *self.current.write() = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Installs a session obtained elsewhere.
    pub fn set_session(&self, session: Session) {
        *self.current.write() = Some(Arc::new(session));
    }

    /// Forgets the current session.
    pub fn clear(&self) {
        self.current.write().take();
    }

    /// The current session, if any.
    #[must_use]
    pub fn current(&self) -> Option<Arc<Session>> {
        self.current.read().clone()
    }

    /// The current session id.
    ///
    /// # Errors
    ///
    /// Returns an `Authentication` error if no session exists.
    pub fn session_id(&self) -> Result<String> {
        self.current
            .read()
            .as_ref()
            .map(|s| s.id.clone())
            .ok_or_else(LogInsightError::no_session)
    }

    /// Adds the session id and a fresh timestamp to `headers`.
    pub fn apply_headers(&self, headers: &mut HeaderMap) -> Result<()> {
        let session_id = self.session_id()?;
        let session_value = HeaderValue::from_str(&session_id).map_err(|e| {
            LogInsightError::invalid_request("session id is not a valid header value", Some(e.into()))
        })?;
        headers.insert(SESSION_ID_HEADER, session_value);
        headers.insert(TIMESTAMP_HEADER, HeaderValue::from(Utc::now().timestamp_millis()));
        Ok(())
    }
}

/// Sets `Content-Type` and `Accept` to `application/json`.
pub fn set_json_headers(headers: &mut HeaderMap) {
    headers.insert(CONTENT_TYPE, APPLICATION_JSON);
    headers.insert(ACCEPT, APPLICATION_JSON);
}
