//! Trainer Schedule Library
//!
//! Event-sourced scheduling for a personal training business: clients, and
//! per-day appointment books that never double-book a trainer or a client.
//! Re-exports modules for integration testing and the command-line binary.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod domain;
mod error;
pub mod event_store;
pub mod handlers;

pub use config::{Config, EventStoreBackend};
pub use error::{AppError, AppResult, ErrorResponse};
pub use domain::{Command, DomainError, OperationContext};
pub use domain::{ClientEvent, DayEvent};
pub use handlers::{parse_command, CommandOutcome, CommandService};
