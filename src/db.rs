//! Database module
//!
//! Database connection and schema utilities.

use sqlx::{Executor, PgPool};

/// Event table schema, applied idempotently
const EVENTS_SCHEMA: &str = include_str!("../migrations/0001_events.sql");

/// Verify database connectivity
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Create the events table and its indexes if they don't exist
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Plain string queries run unprepared, so the multi-statement script is accepted
    pool.execute(EVENTS_SCHEMA).await?;

    tracing::info!("Event store schema ensured");
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let required_tables = ["events"];

    for table in required_tables {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    Ok(true)
}
