//! Response payloads returned by the Log Insight API.

use serde::{Deserialize, Serialize};

/// A `name`/`content` pair attached to an event or message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Field value.
    pub content: String,
}

impl Field {
    /// Creates a field.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// A single log event returned by a message query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Raw log text.
    pub text: String,
    /// Event time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Extracted fields.
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Event {
    /// Returns the content of the first field named `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.content.as_str())
    }
}

/// Response of a message query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageQueryResponse {
    /// Whether the server returned the complete result set.
    #[serde(default)]
    pub complete: bool,
    /// Server-side query duration in milliseconds.
    #[serde(default)]
    pub duration: u64,
    /// Matching events.
    #[serde(default)]
    pub events: Vec<Event>,
}

/// One time bucket of an aggregate query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bin {
    /// Bucket start, milliseconds since the Unix epoch.
    pub min_timestamp: i64,
    /// Bucket end, milliseconds since the Unix epoch.
    pub max_timestamp: i64,
    /// Aggregated value for the bucket.
    pub value: f64,
}

/// Response of an aggregate query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResponse {
    /// Whether the server returned the complete result set.
    #[serde(default)]
    pub complete: bool,
    /// Server-side query duration in milliseconds.
    #[serde(default)]
    pub duration: u64,
    /// Time buckets.
    #[serde(default)]
    pub bins: Vec<Bin>,
}

/// Response of an ingestion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionResponse {
    /// Status reported by the server, `"ok"` on success.
    pub status: String,
    /// Human-readable detail.
    #[serde(default)]
    pub message: String,
    /// Number of messages the server accepted.
    #[serde(default)]
    pub ingested: u64,
}

impl IngestionResponse {
    /// Returns true if the server reported `ok`.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Response of the session handshake.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Identifier of the authenticated user.
    pub user_id: String,
    /// Session credential for subsequent requests.
    pub session_id: String,
    /// Session lifetime in seconds.
    pub ttl: u64,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("user_id", &self.user_id)
            .field("session_id", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUERY_RESPONSE: &str = r#"{"complete":true,"duration":57,"events":
        [{"text":"log line 1","timestamp":1432135888000,"fields":[{"name":"field1","content":"value1"},
        {"name":"field2","content":"value2"},{"name":"field3","content":"value3"}]}]}"#;

    const AGGREGATE_RESPONSE: &str = r#"{"complete":true,"duration":52,
        "bins":[{"minTimestamp":1432135885000,"maxTimestamp":1432135889999,"value":208515}]}"#;

    #[test]
    fn message_query_response_deserialization() {
        let response: MessageQueryResponse = serde_json::from_str(QUERY_RESPONSE).expect("parse");
        assert!(response.complete);
        assert_eq!(response.duration, 57);
        assert_eq!(response.events.len(), 1);

        let event = &response.events[0];
        assert_eq!(event.text, "log line 1");
        assert_eq!(event.timestamp, 1_432_135_888_000);
        assert_eq!(event.fields.len(), 3);
        assert_eq!(event.field("field2"), Some("value2"));
        assert_eq!(event.field("missing"), None);
    }

    #[test]
    fn aggregate_response_deserialization() {
        let response: AggregateResponse =
            serde_json::from_str(AGGREGATE_RESPONSE).expect("parse");
        assert_eq!(response.duration, 52);
        assert_eq!(response.bins.len(), 1);
        assert_eq!(response.bins[0].min_timestamp, 1_432_135_885_000);
        assert_eq!(response.bins[0].max_timestamp, 1_432_135_889_999);
        assert!((response.bins[0].value - 208_515.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ingestion_response_deserialization() {
        let json = r#"{"status":"ok","message":"messages ingested","ingested":1}"#;
        let response: IngestionResponse = serde_json::from_str(json).expect("parse");
        assert!(response.is_ok());
        assert_eq!(response.ingested, 1);
    }

    #[test]
    fn login_response_debug_hides_session() {
        let json = r#"{"userId":"u-1","sessionId":"secret-session","ttl":1800}"#;
        let response: LoginResponse = serde_json::from_str(json).expect("parse");
        assert_eq!(response.ttl, 1800);
        let debug = format!("{response:?}");
        assert!(!debug.contains("secret-session"));
        assert!(debug.contains("u-1"));
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let result = serde_json::from_str::<LoginResponse>(r#"{"userId":"u-1"}"#);
        assert!(result.is_err());
    }
}
