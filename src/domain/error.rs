//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use super::AppointmentType;

/// Domain-specific errors
///
/// Every variant is a business rule violation raised while a command is
/// validated. They are reported to the caller verbatim and never produce events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Appointment end time is not strictly after its start time
    #[error("Appointment End Time must be after Appointment Start Time")]
    EndTimeNotAfterStart,

    /// Start or end time is not on the appointment's date
    #[error("Appointment Start and End Time must fall on the appointment date {date}")]
    TimeNotOnDate { date: NaiveDate },

    /// Start or end time has seconds
    #[error("Appointment Start and End Time must be whole minutes")]
    TimeNotWholeMinute,

    /// Appointment date differs from the date the day covers
    #[error("Appointment date {date} does not belong to this day ({day})")]
    WrongDay { day: NaiveDate, date: NaiveDate },

    /// Update command touches a field another command owns
    #[error("{command} cannot change the appointment's {field}")]
    FieldNotChangeable {
        command: &'static str,
        field: &'static str,
    },

    /// Duration does not match the appointment type
    #[error("Given the Appointment Type of {appointment_type} the end time must be {expected} minutes after the start time (got {actual})")]
    InvalidDuration {
        appointment_type: AppointmentType,
        expected: i64,
        actual: i64,
    },

    /// Number of assigned clients does not fit the appointment type
    #[error("Given the Appointment Type of {appointment_type} you must have {required} assigned (got {actual})")]
    InvalidClientCount {
        appointment_type: AppointmentType,
        required: &'static str,
        actual: usize,
    },

    /// Trainer is already booked in an overlapping appointment
    #[error("New Appointment conflicts with this Appointment: {appointment_id} for this trainer: {trainer}")]
    TrainerConflict { appointment_id: Uuid, trainer: Uuid },

    /// A client is already booked in an overlapping appointment
    #[error("New Appointment conflicts with this Appointment: {appointment_id} for this client: {client}")]
    ClientConflict { appointment_id: Uuid, client: Uuid },

    /// No appointment with this id exists on the day
    #[error("Appointment not found: {0}")]
    AppointmentNotFound(Uuid),

    /// Appointment id is already on the day it would move to
    #[error("Appointment is already scheduled on this day: {0}")]
    DuplicateAppointment(Uuid),

    /// A move whose source and destination are the same day
    #[error("Appointment cannot be moved to the day it is already on: {0}")]
    MoveToSameDay(Uuid),

    /// Client was already added
    #[error("Client already exists: {0}")]
    ClientAlreadyExists(Uuid),

    /// Client has not been added yet
    #[error("Client does not exist")]
    ClientNotFound,

    /// Mutating an archived client
    #[error("Client already archived")]
    ClientAlreadyArchived,

    /// Unarchiving a client that is active
    #[error("Client is not archived")]
    ClientNotArchived,
}

impl DomainError {
    /// Create a trainer conflict error
    pub fn trainer_conflict(appointment_id: Uuid, trainer: Uuid) -> Self {
        Self::TrainerConflict {
            appointment_id,
            trainer,
        }
    }

    /// Create a client conflict error
    pub fn client_conflict(appointment_id: Uuid, client: Uuid) -> Self {
        Self::ClientConflict {
            appointment_id,
            client,
        }
    }

    /// Check if this is a scheduling conflict (retry with another slot may help)
    pub fn is_conflict_error(&self) -> bool {
        matches!(
            self,
            Self::TrainerConflict { .. } | Self::ClientConflict { .. }
        )
    }

    /// Check if the referenced entity is missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AppointmentNotFound(_) | Self::ClientNotFound)
    }
}
