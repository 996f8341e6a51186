//! Command Service
//!
//! Loads the aggregates a command touches, dispatches it and appends every
//! raised event atomically. A version conflict reloads and reruns the whole
//! command, up to a configured number of attempts.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::aggregate::{AggregateRoot, Client, Day};
use crate::domain::{
    ClientCommand, Command, DayCommand, DomainError, IdGenerator, OperationContext, RandomIds,
};
use crate::error::{AppError, AppResult};
use crate::event_store::{EventStore, Repository, StoredEvent};

/// Base delay between retries; attempt `n` waits `n` times this
const RETRY_BACKOFF: Duration = Duration::from_millis(25);

/// Parse a JSON command, routing on its `commandName`
pub fn parse_command(value: Value) -> AppResult<Command> {
    let name = value
        .get("commandName")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::InvalidCommand("missing commandName".to_string()))?
        .to_string();

    let command = match Command::aggregate_for(&name) {
        Some("Client") => serde_json::from_value::<ClientCommand>(value).map(Command::Client),
        Some(_) => serde_json::from_value::<DayCommand>(value).map(Command::Day),
        None => return Err(AppError::UnknownCommand(name)),
    };

    command.map_err(|e| AppError::InvalidCommand(format!("{}: {}", name, e)))
}

/// Events persisted for one accepted command
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutcome {
    pub events: Vec<StoredEvent>,
}

/// Executes commands against an event store
pub struct CommandService<S> {
    repository: Repository<S>,
    ids: Arc<dyn IdGenerator>,
    max_retries: u32,
}

impl<S: EventStore> CommandService<S> {
    pub fn new(store: S, max_retries: u32) -> Self {
        Self::with_id_generator(store, max_retries, Arc::new(RandomIds))
    }

    pub fn with_id_generator(store: S, max_retries: u32, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            repository: Repository::new(store),
            ids,
            max_retries,
        }
    }

    pub fn repository(&self) -> &Repository<S> {
        &self.repository
    }

    /// Execute a command, retrying from a fresh load on version conflicts
    #[tracing::instrument(skip_all, fields(correlation_id = ?context.correlation_id))]
    pub async fn execute(
        &self,
        command: Command,
        context: &OperationContext,
    ) -> AppResult<CommandOutcome> {
        let mut attempt = 0;
        loop {
            match self.execute_once(command.clone(), context).await {
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "Retrying command after {} (attempt {} of {})",
                        err,
                        attempt,
                        self.max_retries
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(err) => {
                    if err.is_client_error() {
                        tracing::info!("Command rejected: {}", err);
                    } else {
                        tracing::error!("Command failed: {}", err);
                    }
                    return Err(err);
                }
                Ok(outcome) => {
                    tracing::info!("Command accepted, {} events appended", outcome.events.len());
                    return Ok(outcome);
                }
            }
        }
    }

    async fn execute_once(
        &self,
        command: Command,
        context: &OperationContext,
    ) -> AppResult<CommandOutcome> {
        let events = match command {
            Command::Client(command) => self.execute_client(command, context).await?,
            Command::Day(command) => self.execute_day(command, context).await?,
        };

        Ok(CommandOutcome { events })
    }

    async fn execute_client(
        &self,
        command: ClientCommand,
        context: &OperationContext,
    ) -> AppResult<Vec<StoredEvent>> {
        let mut client = match command.client_id() {
            Some(client_id) => self.repository.load::<Client>(client_id).await?,
            None => AggregateRoot::new(),
        };

        client.dispatch(command, self.ids.as_ref())?;

        Ok(self.repository.save(&mut client, context).await?)
    }

    /// Day commands touch one day, or two for a cross-day move
    async fn execute_day(
        &self,
        command: DayCommand,
        context: &OperationContext,
    ) -> AppResult<Vec<StoredEvent>> {
        let mut source = match &command {
            DayCommand::RescheduleAppointmentToNewDay(mv)
                if mv.original_entity_name != mv.entity_name =>
            {
                let source = self.repository.load::<Day>(mv.original_entity_name).await?;
                // A day with no history holds no appointments to move
                if source.id().is_none() {
                    return Err(DomainError::AppointmentNotFound(mv.appointment_id).into());
                }
                Some(source)
            }
            _ => None,
        };
        let mut destination = self.repository.load::<Day>(command.day_id()).await?;

        if let Some(source) = source.as_mut() {
            source.dispatch(command.clone(), self.ids.as_ref())?;
        }
        destination.dispatch(command, self.ids.as_ref())?;

        let mut operations = Vec::with_capacity(2);
        if let Some(source) = source.as_ref() {
            operations.extend(Repository::<S>::pending_operation(source)?);
        }
        operations.extend(Repository::<S>::pending_operation(&destination)?);

        let stored = self.repository.commit(operations, context).await?;

        if let Some(source) = source.as_mut() {
            source.mark_committed();
        }
        destination.mark_committed();

        Ok(stored)
    }
}
