//! Day Aggregate
//!
//! A day's appointment book. Every booking, change and cancellation is
//! validated against the appointments already on the day, so trainers and
//! clients are never double-booked. Appointments can move between days: the
//! same move command is dispatched to both days in one unit of work and each
//! side works out which half it plays.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::schedule::validate_booking;
use crate::domain::{
    invariant, Appointment, AppointmentDetails, AppointmentMove, AppointmentUpdate, DayCommand,
    DayEvent, DomainError, IdGenerator, NewAppointment,
};

use super::Aggregate;

/// The part a day plays in a cross-day move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRole {
    /// The appointment leaves this day
    Source,
    /// The appointment arrives on this day
    Destination,
    /// Not involved; the command is ignored
    Neither,
}

impl MoveRole {
    /// Resolve from the day's bound id. An unbound day is being created, so it
    /// can only be the destination.
    pub fn resolve(day_id: Option<Uuid>, source: Uuid, destination: Uuid) -> Self {
        match day_id {
            Some(id) if id == source => MoveRole::Source,
            Some(id) if id == destination => MoveRole::Destination,
            Some(_) => MoveRole::Neither,
            None => MoveRole::Destination,
        }
    }
}

/// Which field-specific event an update produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpdateKind {
    Type,
    Notes,
    Clients,
    Trainer,
    Time,
}

impl UpdateKind {
    fn command_name(self) -> &'static str {
        match self {
            UpdateKind::Type => "changeAppointmentType",
            UpdateKind::Notes => "updateNotesForAppointment",
            UpdateKind::Clients => "changeAppointmentClients",
            UpdateKind::Trainer => "changeAppointmentTrainer",
            UpdateKind::Time => "rescheduleAppointmentTime",
        }
    }

    /// Fields this command may change. A type change drags its duration and
    /// client count along.
    fn owns(self, field: &str) -> bool {
        match self {
            UpdateKind::Type => matches!(field, "appointmentType" | "endTime" | "clients"),
            UpdateKind::Notes => field == "notes",
            UpdateKind::Clients => field == "clients",
            UpdateKind::Trainer => matches!(field, "trainer" | "trainerName"),
            UpdateKind::Time => matches!(field, "date" | "startTime" | "endTime"),
        }
    }

    fn event(self, day_id: Uuid, appointment: Appointment) -> DayEvent {
        match self {
            UpdateKind::Type => DayEvent::AppointmentTypeChanged { day_id, appointment },
            UpdateKind::Notes => DayEvent::NotesForAppointmentUpdated { day_id, appointment },
            UpdateKind::Clients => DayEvent::ClientsChangedForAppointment { day_id, appointment },
            UpdateKind::Trainer => DayEvent::TrainerChangedForAppointment { day_id, appointment },
            UpdateKind::Time => DayEvent::TimeChangedForAppointment { day_id, appointment },
        }
    }
}

/// Day Aggregate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Day {
    /// Bound by the first appointment scheduled or moved in
    id: Option<Uuid>,

    /// Calendar date the day covers, bound alongside the id
    date: Option<NaiveDate>,

    /// In insertion order
    appointments: Vec<Appointment>,
}

impl Day {
    // =========================================================================
    // Command handlers
    // =========================================================================

    fn schedule(&self, new: NewAppointment, ids: &dyn IdGenerator) -> Result<DayEvent, DomainError> {
        self.expect_on_this_day(&new.details)?;
        validate_booking(&self.appointments, &new.details, None)?;

        Ok(DayEvent::AppointmentScheduled {
            day_id: self.id.unwrap_or(new.entity_name),
            appointment: Appointment::new(ids.next_id(), new.details),
        })
    }

    fn reschedule_to_new_day(&self, mv: AppointmentMove) -> Result<Vec<DayEvent>, DomainError> {
        invariant(mv.entity_name != mv.original_entity_name, || {
            DomainError::MoveToSameDay(mv.appointment_id)
        })?;

        match MoveRole::resolve(self.id, mv.original_entity_name, mv.entity_name) {
            MoveRole::Source => {
                self.expect_appointment(mv.appointment_id)?;
                Ok(vec![DayEvent::AppointmentMovedToDifferentDay {
                    day_id: mv.original_entity_name,
                    destination_day_id: mv.entity_name,
                    appointment_id: mv.appointment_id,
                }])
            }
            MoveRole::Destination => {
                invariant(self.appointment(mv.appointment_id).is_none(), || {
                    DomainError::DuplicateAppointment(mv.appointment_id)
                })?;
                self.expect_on_this_day(&mv.details)?;
                validate_booking(&self.appointments, &mv.details, None)?;
                Ok(vec![DayEvent::AppointmentMovedFromDifferentDay {
                    day_id: mv.entity_name,
                    original_day_id: mv.original_entity_name,
                    appointment: Appointment::new(mv.appointment_id, mv.details),
                }])
            }
            MoveRole::Neither => {
                tracing::debug!(
                    "Day {:?} is neither source nor destination of move for appointment {}",
                    self.id,
                    mv.appointment_id
                );
                Ok(Vec::new())
            }
        }
    }

    /// Shared path for every field-specific change
    fn update(&self, update: AppointmentUpdate, kind: UpdateKind) -> Result<DayEvent, DomainError> {
        let current = self.expect_appointment(update.appointment_id)?;
        if let Some(field) = current
            .details
            .changed_fields(&update.details)
            .into_iter()
            .find(|field| !kind.owns(field))
        {
            return Err(DomainError::FieldNotChangeable {
                command: kind.command_name(),
                field,
            });
        }
        self.expect_on_this_day(&update.details)?;
        validate_booking(&self.appointments, &update.details, Some(update.appointment_id))?;

        Ok(kind.event(
            self.id.unwrap_or(update.entity_name),
            Appointment::new(update.appointment_id, update.details),
        ))
    }

    fn cancel(&self, entity_name: Uuid, appointment_id: Uuid) -> Result<DayEvent, DomainError> {
        self.expect_appointment(appointment_id)?;

        Ok(DayEvent::AppointmentCanceled {
            day_id: self.id.unwrap_or(entity_name),
            appointment_id,
        })
    }

    fn expect_on_this_day(&self, details: &AppointmentDetails) -> Result<(), DomainError> {
        match self.date {
            Some(day) => invariant(details.date == day, || DomainError::WrongDay {
                day,
                date: details.date,
            }),
            None => Ok(()),
        }
    }

    fn expect_appointment(&self, appointment_id: Uuid) -> Result<&Appointment, DomainError> {
        self.appointment(appointment_id)
            .ok_or(DomainError::AppointmentNotFound(appointment_id))
    }

    // =========================================================================
    // Event application helpers
    // =========================================================================

    fn add_appointment(&mut self, day_id: Uuid, appointment: &Appointment) {
        self.id.get_or_insert(day_id);
        self.date.get_or_insert(appointment.details.date);
        self.appointments.push(appointment.clone());
    }

    fn replace_appointment(&mut self, appointment: &Appointment) {
        match self.appointments.iter_mut().find(|a| a.id == appointment.id) {
            Some(existing) => existing.details = appointment.details.clone(),
            None => tracing::warn!(
                "Ignoring change for unknown appointment {} on day {:?}",
                appointment.id,
                self.id
            ),
        }
    }

    fn remove_appointment(&mut self, appointment_id: Uuid) {
        match self.appointments.iter().position(|a| a.id == appointment_id) {
            Some(index) => {
                self.appointments.remove(index);
            }
            None => tracing::warn!(
                "Ignoring removal of unknown appointment {} on day {:?}",
                appointment_id,
                self.id
            ),
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn appointment(&self, appointment_id: Uuid) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == appointment_id)
    }
}

impl Aggregate for Day {
    type Command = DayCommand;
    type Event = DayEvent;

    fn aggregate_type() -> &'static str {
        "Day"
    }

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn handle(&self, command: DayCommand, ids: &dyn IdGenerator) -> Result<Vec<DayEvent>, DomainError> {
        let event = match command {
            DayCommand::ScheduleAppointment(new) => self.schedule(new, ids)?,
            DayCommand::RescheduleAppointmentToNewDay(mv) => return self.reschedule_to_new_day(mv),
            DayCommand::ChangeAppointmentType(update) => self.update(update, UpdateKind::Type)?,
            DayCommand::UpdateNotesForAppointment(update) => self.update(update, UpdateKind::Notes)?,
            DayCommand::ChangeAppointmentClients(update) => {
                self.update(update, UpdateKind::Clients)?
            }
            DayCommand::ChangeAppointmentTrainer(update) => {
                self.update(update, UpdateKind::Trainer)?
            }
            DayCommand::RescheduleAppointmentTime(update) => self.update(update, UpdateKind::Time)?,
            DayCommand::CancelAppointment {
                entity_name,
                appointment_id,
            } => self.cancel(entity_name, appointment_id)?,
        };

        Ok(vec![event])
    }

    fn apply(mut self, event: &DayEvent) -> Self {
        match event {
            DayEvent::AppointmentScheduled {
                day_id,
                appointment,
            }
            | DayEvent::AppointmentMovedFromDifferentDay {
                day_id,
                appointment,
                ..
            } => self.add_appointment(*day_id, appointment),

            DayEvent::AppointmentTypeChanged { appointment, .. }
            | DayEvent::NotesForAppointmentUpdated { appointment, .. }
            | DayEvent::ClientsChangedForAppointment { appointment, .. }
            | DayEvent::TrainerChangedForAppointment { appointment, .. }
            | DayEvent::TimeChangedForAppointment { appointment, .. } => {
                self.replace_appointment(appointment)
            }

            DayEvent::AppointmentCanceled { appointment_id, .. }
            | DayEvent::AppointmentMovedToDifferentDay { appointment_id, .. } => {
                self.remove_appointment(*appointment_id)
            }
        }

        self
    }
}
