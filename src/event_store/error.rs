//! Event Store Errors
//!
//! Error types for event store operations.

use uuid::Uuid;

/// Errors that can occur in the event store
#[derive(Debug, thiserror::Error)]
pub enum EventStoreError {
    /// Optimistic concurrency conflict
    #[error("Concurrency conflict for aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        aggregate_id: Uuid,
        expected: i64,
        actual: i64,
    },

    /// Stored event name has no apply handler in the aggregate
    #[error("Unknown event '{event_type}' in {aggregate_type} stream {aggregate_id}")]
    UnknownEvent {
        aggregate_type: String,
        aggregate_id: Uuid,
        event_type: String,
    },

    /// Aggregate raised events before it had an identity
    #[error("{0} aggregate has pending events but no id")]
    MissingAggregateId(&'static str),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid event data
    #[error("Invalid event data: {0}")]
    InvalidEventData(String),
}

impl EventStoreError {
    /// Check if this error is a concurrency conflict
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, EventStoreError::ConcurrencyConflict { .. })
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EventStoreError::ConcurrencyConflict { .. } | EventStoreError::Database(_)
        )
    }

    /// Check if this error means history and code disagree
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EventStoreError::UnknownEvent { .. } | EventStoreError::InvalidEventData(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_store_error_is_retryable() {
        let conflict = EventStoreError::ConcurrencyConflict {
            aggregate_id: Uuid::new_v4(),
            expected: 1,
            actual: 2,
        };
        assert!(conflict.is_retryable());
        assert!(conflict.is_concurrency_conflict());
        assert!(!conflict.is_fatal());

        let unknown = EventStoreError::UnknownEvent {
            aggregate_type: "Client".to_string(),
            aggregate_id: Uuid::new_v4(),
            event_type: "userArchived".to_string(),
        };
        assert!(!unknown.is_retryable());
        assert!(unknown.is_fatal());
    }
}
