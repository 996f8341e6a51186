//! Domain module
//!
//! Core domain types and business rules.

pub mod commands;
pub mod context;
pub mod error;
pub mod events;
pub mod ids;
pub mod invariant;
pub mod profile;
pub mod schedule;

pub use commands::{
    AppointmentMove, AppointmentUpdate, ClientCommand, Command, DayCommand, NewAppointment,
};
pub use context::OperationContext;
pub use error::DomainError;
pub use events::{ClientEvent, DayEvent, DomainEvent};
pub use ids::{IdGenerator, RandomIds};
pub use invariant::invariant;
pub use profile::{Address, ClientInfo, ContactInfo};
pub use schedule::{
    Appointment, AppointmentDetails, AppointmentType, IntervalBounds, TimeSlot, CONFLICT_BOUNDS,
};
