//! Trainer Schedule command runner
//!
//! Reads one JSON command per line from stdin, executes it against the
//! configured event store and writes one JSON result per line to stdout.

use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use trainer_schedule::db;
use trainer_schedule::event_store::{EventStore, InMemoryEventStore, PgEventStore};
use trainer_schedule::{
    parse_command, AppError, CommandService, Config, ErrorResponse, EventStoreBackend,
    OperationContext,
};

/// Initialize tracing/logging
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "trainer_schedule=info".into());

    // Logs go to stderr; stdout carries results
    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    init_tracing(&config);

    tracing::info!("Starting trainer schedule ({:?} event store)", config.event_store);

    match config.event_store {
        EventStoreBackend::Memory => {
            run(CommandService::new(InMemoryEventStore::new(), config.command_max_retries)).await?
        }
        EventStoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres event store"))?;

            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(config.database_max_connections)
                .connect(database_url)
                .await?;

            db::verify_connection(&pool).await?;
            db::ensure_schema(&pool).await?;
            if !db::check_schema(&pool).await? {
                return Err(anyhow::anyhow!("Database schema incomplete"));
            }
            tracing::info!("Database connected successfully");

            let store = PgEventStore::new(pool.clone());
            run(CommandService::new(store, config.command_max_retries)).await?;

            pool.close().await;
            tracing::info!("Database connections closed");
        }
    }

    Ok(())
}

/// Execute stdin commands until end of input
async fn run<S: EventStore>(service: CommandService<S>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut processed = 0usize;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let result = execute_line(&service, &line).await;
        let output = match result {
            Ok(outcome) => serde_json::to_string(&outcome)?,
            Err(err) => serde_json::to_string(&ErrorResponse::from(&err))?,
        };

        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
        processed += 1;
    }

    tracing::info!("Processed {} commands", processed);
    Ok(())
}

async fn execute_line<S: EventStore>(
    service: &CommandService<S>,
    line: &str,
) -> Result<trainer_schedule::CommandOutcome, AppError> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| AppError::InvalidCommand(format!("malformed JSON: {}", e)))?;

    let mut context = OperationContext::new();
    if let Some(issued_by) = value
        .get("issuedBy")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
    {
        context = context.with_issued_by(issued_by);
    }
    context.ensure_correlation_id();

    let command = parse_command(value)?;
    service.execute(command, &context).await
}
