//! Event and aggregate queries.
//!
//! [`Query`] is parametrized by a [`QueryKind`], which supplies the resource
//! path and the type the response decodes into. The two kinds differ in
//! nothing else.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::constraint::{path_segment, FieldConstraint};
use crate::error::Operation;
use crate::types::{AggregateResponse, MessageQueryResponse};

/// Resource path and decode target of a query.
pub trait QueryKind: fmt::Debug + Clone + Default + Send + Sync + 'static {
    /// Resource path below `/api/v1/`.
    const RESOURCE: &'static str;
    /// Operation tag used in errors.
    const OPERATION: Operation;
    /// Entity the response body decodes into.
    type Response: DeserializeOwned + Send + 'static;
}

/// Plain event queries (`events`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Messages;

impl QueryKind for Messages {
    const RESOURCE: &'static str = "events";
    const OPERATION: Operation = Operation::MessageQuery;
    type Response = MessageQueryResponse;
}

/// Aggregated event queries (`aggregated-events`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aggregates;

impl QueryKind for Aggregates {
    const RESOURCE: &'static str = "aggregated-events";
    const OPERATION: Operation = Operation::AggregateQuery;
    type Response = AggregateResponse;
}

/// A query for plain events.
pub type MessageQuery = Query<Messages>;

/// A query for time-bucketed aggregates.
pub type AggregateQuery = Query<Aggregates>;

/// Constraints plus an optional result cap, rendered against a resource path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query<K> {
    constraints: Vec<FieldConstraint>,
    limit: Option<u32>,
    kind: PhantomData<K>,
}

impl<K: QueryKind> Query<K> {
    /// Creates an unconstrained query without a limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            constraints: Vec::new(),
            limit: None,
            kind: PhantomData,
        }
    }

    /// Caps the number of results returned by the server.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Replaces the constraint list wholesale.
    #[must_use]
    pub fn set_constraints(mut self, constraints: Vec<FieldConstraint>) -> Self {
        self.constraints = constraints;
        self
    }

    /// The current constraints, in insertion order.
    #[must_use]
    pub fn constraints(&self) -> &[FieldConstraint] {
        &self.constraints
    }

    /// The configured result cap.
    #[must_use]
    pub fn result_limit(&self) -> Option<u32> {
        self.limit
    }

    /// The operation tag of this query kind.
    #[must_use]
    pub fn operation(&self) -> Operation {
        K::OPERATION
    }

    /// Resource path followed by the encoded constraints, without the limit.
    #[must_use]
    pub fn resource_path(&self) -> String {
        let segment = path_segment(&self.constraints);
        if segment.is_empty() {
            K::RESOURCE.to_string()
        } else {
            format!("{}/{segment}", K::RESOURCE)
        }
    }

    /// Unescaped URL path segments below `/api/v1/`: the resource, then the
    /// field and `OPCODE[+value]` of each constraint.
    ///
    /// Each element is one path segment, so a `/`, `?` or `#` inside a value
    /// stays part of that value once the URL layer percent-encodes it.
    #[must_use]
    pub fn path_segments(&self) -> Vec<String> {
        let mut segments = Vec::with_capacity(1 + 2 * self.constraints.len());
        segments.push(K::RESOURCE.to_string());
        for constraint in &self.constraints {
            segments.push(constraint.field().to_string());
            segments.push(constraint.operator_segment());
        }
        segments
    }

    /// Relative URL of the query: [`resource_path`](Self::resource_path) plus
    /// `?limit=N` when a limit is set.
    ///
    /// This is the unescaped display form. Requests are built from
    /// [`path_segments`](Self::path_segments) and
    /// [`result_limit`](Self::result_limit).
    #[must_use]
    pub fn to_url_string(&self) -> String {
        match self.limit {
            Some(limit) => format!("{}?limit={limit}", self.resource_path()),
            None => self.resource_path(),
        }
    }
}
