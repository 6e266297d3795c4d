//! Client configuration.
//!
//! Configuration is usually read from a TOML file:
//!
//! ```toml
//! host = "loginsight.example.com"
//! user = "admin"
//! password = "secret"
//! # optional
//! port = 443
//! ingestion_port = 9543
//! provider = "Local"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::{LogInsightError, Result};
use crate::query::{Query, QueryKind};
use crate::session::Credentials;

/// Default HTTPS port of the query API.
pub const DEFAULT_PORT: u16 = 443;

/// Default HTTPS port of the ingestion API.
pub const DEFAULT_INGESTION_PORT: u16 = 9543;

/// Default authentication provider.
pub const DEFAULT_PROVIDER: &str = "Local";

/// Agent id used for ingestion when none is configured.
pub const DEFAULT_INGESTION_AGENT_ID: &str = "3b5d0f1e-6a3c-4f0e-9d6b-1c9e2a7f4b21";

/// Default per-request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const API_PREFIX: [&str; 2] = ["api", "v1"];

/// Connection settings for a Log Insight server.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Server host name or address.
    pub host: String,
    /// Query API port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Ingestion API port.
    #[serde(default = "default_ingestion_port")]
    pub ingestion_port: u16,
    /// User name for the handshake.
    pub user: String,
    /// Password for the handshake.
    #[serde(default)]
    pub password: String,
    /// Authentication provider.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Agent id used in the ingestion path.
    #[serde(default = "default_agent_id")]
    pub agent_id: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_ingestion_port() -> u16 {
    DEFAULT_INGESTION_PORT
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_agent_id() -> String {
    DEFAULT_INGESTION_AGENT_ID.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl ClientConfig {
    /// Creates a configuration with default ports and provider.
    pub fn new(host: impl Into<String>, user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            ingestion_port: DEFAULT_INGESTION_PORT,
            user: user.into(),
            password: password.into(),
            provider: default_provider(),
            agent_id: default_agent_id(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    /// Parses a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s)
            .map_err(|e| LogInsightError::config("invalid configuration", Some(e.into())))
    }

    /// Reads and parses a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading configuration");
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LogInsightError::config(
                format!("failed to read configuration file {}", path.display()),
                Some(e.into()),
            )
        })?;
        Self::from_toml_str(&contents)
    }

    /// Overrides the query API port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Overrides the ingestion API port.
    #[must_use]
    pub fn with_ingestion_port(mut self, port: u16) -> Self {
        self.ingestion_port = port;
        self
    }

    /// Overrides the ingestion agent id.
    #[must_use]
    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    /// Per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Handshake credentials.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.user, &self.password, &self.provider)
    }

    /// `https://{host}:{port}/api/v1/sessions`.
    pub fn session_url(&self) -> Result<Url> {
        self.api_url(self.port, ["sessions"])
    }

    /// `https://{host}:{port}/api/v1/{resource}/{field}/{OPCODE+value}...`,
    /// with `?limit=N` when the query has a limit.
    ///
    /// Every segment is percent-encoded on its own, so reserved characters in
    /// constraint values never leak into the query string or fragment.
    pub fn query_url<K: QueryKind>(&self, query: &Query<K>) -> Result<Url> {
        let segments = query.path_segments();
        let mut url = self.api_url(self.port, segments.iter().map(String::as_str))?;
        if let Some(limit) = query.result_limit() {
            url.query_pairs_mut().append_pair("limit", &limit.to_string());
        }
        Ok(url)
    }

    /// `https://{host}:{ingestion_port}/api/v1/messages/ingest/{agent_id}`.
    pub fn ingestion_url(&self) -> Result<Url> {
        self.api_url(
            self.ingestion_port,
            ["messages", "ingest", self.agent_id.as_str()],
        )
    }

    fn api_url<'a>(&self, port: u16, segments: impl IntoIterator<Item = &'a str>) -> Result<Url> {
        let mut url = self.base_url(port)?;
        url.path_segments_mut()
            .map_err(|()| {
                LogInsightError::invalid_request(
                    format!("{} cannot carry a path", self.host),
                    None,
                )
            })?
            .clear()
            .extend(API_PREFIX.iter().copied().chain(segments));
        Ok(url)
    }

    /// `https://{host}:{port}/`, rejecting hosts that smuggle in a path,
    /// query, fragment or user info.
    fn base_url(&self, port: u16) -> Result<Url> {
        let raw = format!("https://{}:{port}/", self.host);
        let url = Url::parse(&raw).map_err(|e| {
            LogInsightError::invalid_request(format!("invalid request URL {raw}"), Some(e.into()))
        })?;
        if url.host_str().is_none_or(str::is_empty) {
            return Err(LogInsightError::invalid_request(
                format!("missing host in {raw}"),
                None,
            ));
        }
        if url.path() != "/"
            || url.query().is_some()
            || url.fragment().is_some()
            || !url.username().is_empty()
            || url.password().is_some()
        {
            return Err(LogInsightError::invalid_request(
                format!("host {} is not a bare host name", self.host),
                None,
            ));
        }
        Ok(url)
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("ingestion_port", &self.ingestion_port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("provider", &self.provider)
            .field("agent_id", &self.agent_id)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}
