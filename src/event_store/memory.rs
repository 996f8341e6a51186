//! In-memory event store
//!
//! Keeps streams in a map behind an async lock. Used by tests and by the
//! binary when no database is configured.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::OperationContext;

use super::{AggregateOperation, EventStore, EventStoreError, StoredEvent};

type StreamKey = (String, Uuid);

/// Event store that keeps streams in a hash map
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    streams: Arc<RwLock<HashMap<StreamKey, Vec<StoredEvent>>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events across all streams
    pub async fn event_count(&self) -> usize {
        self.streams.read().await.values().map(Vec::len).sum()
    }
}

impl EventStore for InMemoryEventStore {
    async fn load_events(
        &self,
        aggregate_type: &str,
        aggregate_id: Uuid,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let streams = self.streams.read().await;
        Ok(streams
            .get(&(aggregate_type.to_string(), aggregate_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn append_atomic(
        &self,
        operations: Vec<AggregateOperation>,
        context: &OperationContext,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let context_json = serde_json::to_value(context)?;
        let mut streams = self.streams.write().await;

        // Check every version before writing anything
        let mut heads: HashMap<StreamKey, i64> = HashMap::new();
        for op in &operations {
            let key = (op.aggregate_type.clone(), op.aggregate_id);
            let current = match heads.get(&key) {
                Some(version) => *version,
                None => streams.get(&key).map_or(0, |s| s.len() as i64),
            };

            if current != op.expected_version {
                return Err(EventStoreError::ConcurrencyConflict {
                    aggregate_id: op.aggregate_id,
                    expected: op.expected_version,
                    actual: current,
                });
            }
            heads.insert(key, current + op.events.len() as i64);
        }

        let now = Utc::now();
        let mut appended = Vec::new();
        for op in operations {
            let stream = streams
                .entry((op.aggregate_type.clone(), op.aggregate_id))
                .or_default();

            for event in op.events {
                let stored = StoredEvent {
                    id: Uuid::new_v4(),
                    aggregate_type: op.aggregate_type.clone(),
                    aggregate_id: op.aggregate_id,
                    version: stream.len() as i64 + 1,
                    event_type: event.event_type,
                    event_data: event.event_data,
                    context: context_json.clone(),
                    created_at: now,
                };
                stream.push(stored.clone());
                appended.push(stored);
            }
        }

        tracing::debug!("Appended {} events in memory", appended.len());
        Ok(appended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_store::NewEvent;
    use serde_json::json;

    fn op(aggregate_id: Uuid, expected_version: i64, count: usize) -> AggregateOperation {
        AggregateOperation {
            aggregate_type: "Day".to_string(),
            aggregate_id,
            expected_version,
            events: (0..count)
                .map(|_| NewEvent {
                    event_type: "appointmentCanceled".to_string(),
                    event_data: json!({}),
                })
                .collect(),
        }
    }

    #[test]
    fn test_append_and_load() {
        tokio_test::block_on(async {
            let store = InMemoryEventStore::new();
            let id = Uuid::new_v4();

            let appended = store
                .append_atomic(vec![op(id, 0, 2)], &OperationContext::new())
                .await
                .unwrap();
            assert_eq!(appended.len(), 2);
            assert_eq!(appended[1].version, 2);

            let loaded = store.load_events("Day", id).await.unwrap();
            assert_eq!(loaded, appended);
            assert!(store.load_events("Client", id).await.unwrap().is_empty());
        });
    }

    #[test]
    fn test_stale_version_conflicts() {
        tokio_test::block_on(async {
            let store = InMemoryEventStore::new();
            let id = Uuid::new_v4();
            let context = OperationContext::new();

            store.append_atomic(vec![op(id, 0, 1)], &context).await.unwrap();
            let result = store.append_atomic(vec![op(id, 0, 1)], &context).await;

            assert!(matches!(
                result,
                Err(EventStoreError::ConcurrencyConflict { expected: 0, actual: 1, .. })
            ));
        });
    }

    #[test]
    fn test_atomic_append_writes_nothing_on_conflict() {
        tokio_test::block_on(async {
            let store = InMemoryEventStore::new();
            let context = OperationContext::new();
            let existing = Uuid::new_v4();
            store.append_atomic(vec![op(existing, 0, 1)], &context).await.unwrap();

            let result = store
                .append_atomic(vec![op(Uuid::new_v4(), 0, 1), op(existing, 0, 1)], &context)
                .await;

            assert!(result.is_err());
            assert_eq!(store.event_count().await, 1);
        });
    }
}
