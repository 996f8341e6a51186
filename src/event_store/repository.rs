//! Aggregate Repository
//!
//! Loads aggregates by replaying their streams and persists the events they
//! raise, using the version seen at load time as the concurrency token.

use uuid::Uuid;

use crate::aggregate::{Aggregate, AggregateRoot};
use crate::domain::{DomainEvent, OperationContext};

use super::{AggregateOperation, EventStore, EventStoreError, StoredEvent};

/// Decode a stored event into an aggregate's event enum.
///
/// A name the enum does not know is a fatal inconsistency between history and
/// code; it is reported, never skipped.
pub fn decode_event<E: DomainEvent>(stored: &StoredEvent) -> Result<E, EventStoreError> {
    if !E::is_known(&stored.event_type) {
        tracing::error!(
            "No apply handler for event '{}' in {} stream {} (version {})",
            stored.event_type,
            stored.aggregate_type,
            stored.aggregate_id,
            stored.version
        );
        return Err(EventStoreError::UnknownEvent {
            aggregate_type: stored.aggregate_type.clone(),
            aggregate_id: stored.aggregate_id,
            event_type: stored.event_type.clone(),
        });
    }

    Ok(E::from_payload(&stored.event_type, stored.event_data.clone())?)
}

/// Repository over an event store
#[derive(Debug, Clone)]
pub struct Repository<S> {
    store: S,
}

impl<S: EventStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load an aggregate by replaying its events.
    ///
    /// A stream with no events yields a fresh, unbound aggregate at version 0.
    pub async fn load<A: Aggregate>(
        &self,
        aggregate_id: Uuid,
    ) -> Result<AggregateRoot<A>, EventStoreError> {
        let stored = self
            .store
            .load_events(A::aggregate_type(), aggregate_id)
            .await?;

        let mut events = Vec::with_capacity(stored.len());
        for (index, event) in stored.iter().enumerate() {
            let expected = index as i64 + 1;
            if event.version != expected {
                return Err(EventStoreError::InvalidEventData(format!(
                    "{} stream {} has version {} at position {}",
                    A::aggregate_type(),
                    aggregate_id,
                    event.version,
                    expected
                )));
            }
            events.push(decode_event::<A::Event>(event)?);
        }

        let root = AggregateRoot::replay(events);
        tracing::debug!(
            "Loaded {} {} at version {}",
            A::aggregate_type(),
            aggregate_id,
            root.version()
        );
        Ok(root)
    }

    /// Turn an aggregate's pending events into an append operation
    pub fn pending_operation<A: Aggregate>(
        root: &AggregateRoot<A>,
    ) -> Result<Option<AggregateOperation>, EventStoreError> {
        if !root.has_pending() {
            return Ok(None);
        }

        let aggregate_id = root
            .id()
            .ok_or(EventStoreError::MissingAggregateId(A::aggregate_type()))?;

        AggregateOperation::new(
            A::aggregate_type(),
            aggregate_id,
            root.committed_version(),
            root.pending_events(),
        )
        .map(Some)
    }

    /// Append operations from one unit of work atomically
    pub async fn commit(
        &self,
        operations: Vec<AggregateOperation>,
        context: &OperationContext,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        if operations.is_empty() {
            return Ok(Vec::new());
        }
        self.store.append_atomic(operations, context).await
    }

    /// Persist a single aggregate's pending events
    pub async fn save<A: Aggregate>(
        &self,
        root: &mut AggregateRoot<A>,
        context: &OperationContext,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let operations = Self::pending_operation(root)?.into_iter().collect();
        let stored = self.commit(operations, context).await?;
        root.mark_committed();
        Ok(stored)
    }
}
