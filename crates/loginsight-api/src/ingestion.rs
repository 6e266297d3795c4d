//! Ingestion batches.
//!
//! An [`IngestionRequest`] is an ordered batch of [`Message`]s. The batch is
//! sent as one JSON body; the server owns batch-size policy, so nothing is
//! deduplicated or capped here.

use std::collections::BTreeMap;

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::error::{LogInsightError, Result};
use crate::types::Field;

/// A log message to ingest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    text: String,
    timestamp: Option<i64>,
    fields: BTreeMap<String, String>,
}

impl Message {
    /// Creates a message with the given text and no fields.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Sets an explicit event time in milliseconds since the Unix epoch.
    ///
    /// Without one the server stamps the message on arrival.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp = Some(timestamp_ms);
        self
    }

    /// Adds or replaces a field.
    pub fn add_field(&mut self, name: impl Into<String>, content: impl Into<String>) -> &mut Self {
        self.fields.insert(name.into(), content.into());
        self
    }

    /// Message text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Explicit event time, if set.
    #[must_use]
    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    /// Field content by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Fields, ordered by name.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = if self.timestamp.is_some() { 3 } else { 2 };
        let mut state = serializer.serialize_struct("Message", len)?;
        state.serialize_field("text", &self.text)?;
        if let Some(ts) = self.timestamp {
            state.serialize_field("timestamp", &ts)?;
        }
        let fields: Vec<Field> = self
            .fields
            .iter()
            .map(|(name, content)| Field::new(name.as_str(), content.as_str()))
            .collect();
        state.serialize_field("fields", &fields)?;
        state.end()
    }
}

/// An ordered batch of messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestionRequest {
    messages: Vec<Message>,
}

impl IngestionRequest {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message.
    pub fn add_message(&mut self, message: Message) -> &mut Self {
        self.messages.push(message);
        self
    }

    /// Messages in insertion order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if the batch has no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Serializes the batch into the ingestion body.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| {
            LogInsightError::invalid_request("failed to serialize ingestion body", Some(e.into()))
        })
    }
}

impl FromIterator<Message> for IngestionRequest {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self {
            messages: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn body_shape() {
        let mut msg = Message::new("Testing the ingestion");
        msg.add_field("vclap_test_id", "11111");
        let mut request = IngestionRequest::new();
        request.add_message(msg);

        let body: Value = serde_json::from_slice(&request.to_json().expect("json")).expect("parse");
        assert_eq!(
            body,
            json!({
                "messages": [{
                    "text": "Testing the ingestion",
                    "fields": [{"name": "vclap_test_id", "content": "11111"}]
                }]
            })
        );
    }

    #[test]
    fn timestamp_serialized_only_when_set() {
        let request: IngestionRequest = [
            Message::new("a"),
            Message::new("b").with_timestamp(1_432_135_888_000),
        ]
        .into_iter()
        .collect();

        let body: Value = serde_json::from_slice(&request.to_json().expect("json")).expect("parse");
        assert!(body["messages"][0].get("timestamp").is_none());
        assert_eq!(body["messages"][1]["timestamp"], json!(1_432_135_888_000_i64));
    }

    #[test]
    fn messages_keep_order_and_duplicates() {
        let mut request = IngestionRequest::new();
        request
            .add_message(Message::new("same"))
            .add_message(Message::new("other"))
            .add_message(Message::new("same"));

        assert_eq!(request.len(), 3);
        let texts: Vec<&str> = request.messages().iter().map(Message::text).collect();
        assert_eq!(texts, ["same", "other", "same"]);
    }

    #[test]
    fn add_field_replaces_same_name() {
        let mut msg = Message::new("m");
        msg.add_field("k", "1").add_field("k", "2");
        assert_eq!(msg.field("k"), Some("2"));
        assert_eq!(msg.fields().count(), 1);
    }

    #[test]
    fn empty_batch_serializes() {
        let request = IngestionRequest::new();
        assert!(request.is_empty());
        let body: Value = serde_json::from_slice(&request.to_json().expect("json")).expect("parse");
        assert_eq!(body, json!({"messages": []}));
    }
}
