//! PostgreSQL Event Store
//!
//! Durable implementation of the event store with optimistic concurrency
//! control. Schema lives in `migrations/0001_events.sql`.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::OperationContext;

use super::{AggregateOperation, EventStore, EventStoreError, StoredEvent};

type EventRow = (
    Uuid,
    String,
    Uuid,
    i64,
    String,
    serde_json::Value,
    serde_json::Value,
    DateTime<Utc>,
);

fn into_stored_event(row: EventRow) -> StoredEvent {
    let (id, aggregate_type, aggregate_id, version, event_type, event_data, context, created_at) =
        row;
    StoredEvent {
        id,
        aggregate_type,
        aggregate_id,
        version,
        event_type,
        event_data,
        context,
        created_at,
    }
}

/// Event Store for persisting and retrieving events in PostgreSQL
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Create a new PgEventStore with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get current version of a stream
    async fn get_current_version(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        aggregate_type: &str,
        aggregate_id: Uuid,
    ) -> Result<i64, EventStoreError> {
        let result: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT MAX(version) FROM events
            WHERE aggregate_type = $1 AND aggregate_id = $2
            "#,
        )
        .bind(aggregate_type)
        .bind(aggregate_id)
        .fetch_optional(&mut **tx)
        .await?
        .flatten();

        Ok(result.unwrap_or(0))
    }
}

impl EventStore for PgEventStore {
    async fn load_events(
        &self,
        aggregate_type: &str,
        aggregate_id: Uuid,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let events = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, aggregate_type, aggregate_id, version, event_type, event_data, context, created_at
            FROM events
            WHERE aggregate_type = $1 AND aggregate_id = $2
            ORDER BY version ASC
            "#,
        )
        .bind(aggregate_type)
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(into_stored_event)
        .collect();

        Ok(events)
    }

    async fn append_atomic(
        &self,
        operations: Vec<AggregateOperation>,
        context: &OperationContext,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let context_json = serde_json::to_value(context)?;

        let mut tx = self.pool.begin().await?;
        let mut appended = Vec::new();

        for op in &operations {
            // Verify expected version (optimistic locking)
            let current_version = self
                .get_current_version(&mut tx, &op.aggregate_type, op.aggregate_id)
                .await?;

            if current_version != op.expected_version {
                return Err(EventStoreError::ConcurrencyConflict {
                    aggregate_id: op.aggregate_id,
                    expected: op.expected_version,
                    actual: current_version,
                });
            }

            for (offset, event) in op.events.iter().enumerate() {
                let version = op.expected_version + offset as i64 + 1;

                let row = sqlx::query_as::<_, EventRow>(
                    r#"
                    INSERT INTO events (
                        aggregate_type, aggregate_id, version,
                        event_type, event_data, context
                    )
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING id, aggregate_type, aggregate_id, version, event_type, event_data, context, created_at
                    "#,
                )
                .bind(&op.aggregate_type)
                .bind(op.aggregate_id)
                .bind(version)
                .bind(&event.event_type)
                .bind(&event.event_data)
                .bind(&context_json)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| match e {
                    // A concurrent writer took this version between our check and insert
                    sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                        EventStoreError::ConcurrencyConflict {
                            aggregate_id: op.aggregate_id,
                            expected: op.expected_version,
                            actual: version,
                        }
                    }
                    other => EventStoreError::Database(other),
                })?;

                appended.push(into_stored_event(row));
            }
        }

        tx.commit().await?;

        tracing::info!(
            "Appended {} events across {} streams",
            appended.len(),
            operations.len()
        );

        Ok(appended)
    }
}
