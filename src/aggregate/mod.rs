//! Aggregate module
//!
//! Aggregate Root pattern implementation for Event Sourcing.

pub mod client;
pub mod day;
pub mod root;

pub use client::{Client, ClientStatus};
pub use day::{Day, MoveRole};
pub use root::AggregateRoot;

use std::fmt;

use uuid::Uuid;

use crate::domain::{DomainError, DomainEvent, IdGenerator};

/// Aggregate trait that all aggregates must implement
///
/// The implementing type is the aggregate's state. `handle` decides, `apply`
/// evolves; neither performs I/O. Version tracking and the pending-event buffer
/// live in [`AggregateRoot`].
pub trait Aggregate: Sized + Default + Clone + fmt::Debug {
    /// The commands this aggregate accepts
    type Command;

    /// The type of events this aggregate handles
    type Event: DomainEvent;

    /// Get the aggregate type name (for storage)
    fn aggregate_type() -> &'static str;

    /// Get the aggregate ID, bound by its first event
    fn id(&self) -> Option<Uuid>;

    /// Validate a command against the current state and produce events
    fn handle(
        &self,
        command: Self::Command,
        ids: &dyn IdGenerator,
    ) -> Result<Vec<Self::Event>, DomainError>;

    /// Apply an event to update the aggregate state
    fn apply(self, event: &Self::Event) -> Self;
}
