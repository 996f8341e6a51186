//! Error handling module
//!
//! Centralized error types and the error body reported to callers.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::DomainError;
use crate::event_store::EventStoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Version conflict on aggregate {aggregate_id}: expected {expected}, found {actual}")]
    ConcurrencyConflict {
        aggregate_id: Uuid,
        expected: i64,
        actual: i64,
    },

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Server errors
    #[error("Event store error: {0}")]
    EventStore(EventStoreError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<EventStoreError> for AppError {
    fn from(err: EventStoreError) -> Self {
        match err {
            EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual,
            } => AppError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual,
            },
            other => AppError::EventStore(other),
        }
    }
}

impl AppError {
    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::UnknownCommand(_) => "unknown_command",
            AppError::InvalidCommand(_) => "invalid_command",
            AppError::ConcurrencyConflict { .. } => "concurrency_conflict",
            AppError::Domain(domain_err) => match domain_err {
                DomainError::EndTimeNotAfterStart => "end_time_not_after_start",
                DomainError::TimeNotOnDate { .. } => "time_not_on_date",
                DomainError::TimeNotWholeMinute => "time_not_whole_minute",
                DomainError::WrongDay { .. } => "wrong_day",
                DomainError::FieldNotChangeable { .. } => "field_not_changeable",
                DomainError::InvalidDuration { .. } => "invalid_duration",
                DomainError::InvalidClientCount { .. } => "invalid_client_count",
                DomainError::TrainerConflict { .. } => "trainer_conflict",
                DomainError::ClientConflict { .. } => "client_conflict",
                DomainError::AppointmentNotFound(_) => "appointment_not_found",
                DomainError::DuplicateAppointment(_) => "duplicate_appointment",
                DomainError::MoveToSameDay(_) => "move_to_same_day",
                DomainError::ClientAlreadyExists(_) => "client_already_exists",
                DomainError::ClientNotFound => "client_not_found",
                DomainError::ClientAlreadyArchived => "client_already_archived",
                DomainError::ClientNotArchived => "client_not_archived",
            },
            AppError::EventStore(e) if e.is_fatal() => "event_history_corrupt",
            AppError::EventStore(_) => "event_store_error",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
        }
    }

    /// Whether the caller can fix this by changing the command
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::UnknownCommand(_) | AppError::InvalidCommand(_) | AppError::Domain(_)
        )
    }

    /// Whether reloading and retrying the same command may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::ConcurrencyConflict { .. } => true,
            AppError::EventStore(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Error body reported for a rejected command
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let details = match err {
            AppError::Domain(domain_err) => Some(domain_err.to_string()),
            AppError::UnknownCommand(name) => Some(name.clone()),
            AppError::InvalidCommand(msg) => Some(msg.clone()),
            AppError::ConcurrencyConflict { aggregate_id, .. } => Some(aggregate_id.to_string()),
            AppError::EventStore(e) => {
                tracing::error!("Event store error: {:?}", e);
                None
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                None
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                None
            }
        };

        Self {
            error: err.to_string(),
            error_code: err.error_code().to_string(),
            details,
        }
    }
}
