//! Common test utilities

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use trainer_schedule::db;

/// Setup test database - ensure the schema and truncate the event log
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    db::ensure_schema(&pool)
        .await
        .expect("Failed to create event store schema");

    sqlx::query("TRUNCATE TABLE events")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    pool
}
