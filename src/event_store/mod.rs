//! Event Store module
//!
//! Persistence boundary for Event Sourcing. Streams are partitioned by
//! aggregate type and id; every stream is append-only and versioned from 1.
//! Appends are conditioned on the version the writer last saw.

mod error;
mod memory;
mod postgres;
mod repository;

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{DomainEvent, OperationContext};

pub use error::EventStoreError;
pub use memory::InMemoryEventStore;
pub use postgres::PgEventStore;
pub use repository::{decode_event, Repository};

/// Stored event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: Uuid,
    pub version: i64,
    #[serde(rename = "eventName")]
    pub event_type: String,
    #[serde(rename = "data")]
    pub event_data: serde_json::Value,
    #[serde(skip)]
    pub context: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Serialized event waiting to be appended
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub event_type: String,
    pub event_data: serde_json::Value,
}

/// Events to append to one stream
#[derive(Debug, Clone)]
pub struct AggregateOperation {
    pub aggregate_type: String,
    pub aggregate_id: Uuid,
    pub expected_version: i64,
    pub events: Vec<NewEvent>,
}

impl AggregateOperation {
    /// Create a new aggregate operation
    pub fn new<E: DomainEvent>(
        aggregate_type: &str,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[E],
    ) -> Result<Self, EventStoreError> {
        let events = events
            .iter()
            .map(|event| {
                Ok(NewEvent {
                    event_type: event.event_type().to_string(),
                    event_data: event.payload()?,
                })
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;

        Ok(Self {
            aggregate_type: aggregate_type.to_string(),
            aggregate_id,
            expected_version,
            events,
        })
    }
}

/// Append-only event storage
pub trait EventStore: Send + Sync {
    /// All events of one stream, ordered by version
    fn load_events(
        &self,
        aggregate_type: &str,
        aggregate_id: Uuid,
    ) -> impl Future<Output = Result<Vec<StoredEvent>, EventStoreError>> + Send;

    /// Append to one or more streams, all or nothing.
    ///
    /// Fails with [`EventStoreError::ConcurrencyConflict`] when any stream's
    /// head no longer matches its operation's `expected_version`.
    fn append_atomic(
        &self,
        operations: Vec<AggregateOperation>,
        context: &OperationContext,
    ) -> impl Future<Output = Result<Vec<StoredEvent>, EventStoreError>> + Send;
}
