//! Scheduling primitives
//!
//! Appointment types, time slots and the booking rules the Day aggregate
//! enforces. Conflict detection works on an immutable snapshot of the day's
//! existing appointments and is independent of their order, except that the
//! first conflict in insertion order is the one reported.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{invariant, DomainError};

/// Whether interval endpoints count as part of the interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalBounds {
    /// Endpoints included: touching intervals overlap
    Closed,
    /// Endpoints excluded: back-to-back intervals do not overlap
    Open,
}

/// Inclusivity used for both trainer and client double-booking checks.
pub const CONFLICT_BOUNDS: IntervalBounds = IntervalBounds::Closed;

/// Kind of appointment; fixes its duration and how many clients it takes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppointmentType {
    HalfHour,
    FullHour,
    Pair,
}

impl AppointmentType {
    /// Required length in minutes
    pub fn duration_minutes(&self) -> i64 {
        match self {
            AppointmentType::HalfHour => 30,
            AppointmentType::FullHour | AppointmentType::Pair => 60,
        }
    }

    /// Whether `count` clients is acceptable for this type
    pub fn accepts_client_count(&self, count: usize) -> bool {
        match self {
            AppointmentType::HalfHour | AppointmentType::FullHour => count == 1,
            AppointmentType::Pair => count >= 2,
        }
    }

    fn client_requirement(&self) -> &'static str {
        match self {
            AppointmentType::HalfHour | AppointmentType::FullHour => "1 and only 1 client",
            AppointmentType::Pair => "2 or more clients",
        }
    }
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentType::HalfHour => write!(f, "Half Hour"),
            AppointmentType::FullHour => write!(f, "Full Hour"),
            AppointmentType::Pair => write!(f, "Pair"),
        }
    }
}

/// A start/end pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeSlot {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Whole minutes from start to end (negative when end precedes start).
    ///
    /// Truncates; booking rules reject sub-minute timestamps before relying on it.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Whether the two slots share an instant under the given bounds
    pub fn overlaps(&self, other: &TimeSlot, bounds: IntervalBounds) -> bool {
        match bounds {
            IntervalBounds::Closed => self.start <= other.end && other.start <= self.end,
            IntervalBounds::Open => self.start < other.end && other.start < self.end,
        }
    }
}

/// Everything about an appointment except its identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDetails {
    pub appointment_type: AppointmentType,
    pub date: NaiveDate,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub trainer: Uuid,
    /// Display name, carried for read models
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trainer_name: Option<String>,
    #[serde(default)]
    pub clients: BTreeSet<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AppointmentDetails {
    pub fn slot(&self) -> TimeSlot {
        TimeSlot::new(self.start_time, self.end_time)
    }

    /// Wire names of the fields that differ from `other`
    pub fn changed_fields(&self, other: &AppointmentDetails) -> Vec<&'static str> {
        let mut changed = Vec::new();
        if self.appointment_type != other.appointment_type {
            changed.push("appointmentType");
        }
        if self.date != other.date {
            changed.push("date");
        }
        if self.start_time != other.start_time {
            changed.push("startTime");
        }
        if self.end_time != other.end_time {
            changed.push("endTime");
        }
        if self.trainer != other.trainer {
            changed.push("trainer");
        }
        if self.trainer_name != other.trainer_name {
            changed.push("trainerName");
        }
        if self.clients != other.clients {
            changed.push("clients");
        }
        if self.notes != other.notes {
            changed.push("notes");
        }
        changed
    }
}

/// An appointment held by a Day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    #[serde(flatten)]
    pub details: AppointmentDetails,
}

impl Appointment {
    pub fn new(id: Uuid, details: AppointmentDetails) -> Self {
        Self { id, details }
    }
}

// =========================================================================
// Booking rules
// =========================================================================

/// Run every booking rule in order, stopping at the first violation.
///
/// `updating` names the appointment being changed so it is not reported as
/// conflicting with itself.
pub fn validate_booking(
    existing: &[Appointment],
    details: &AppointmentDetails,
    updating: Option<Uuid>,
) -> Result<(), DomainError> {
    let slot = details.slot();

    invariant(slot.end > slot.start, || DomainError::EndTimeNotAfterStart)?;

    invariant(
        slot.start.date() == details.date && slot.end.date() == details.date,
        || DomainError::TimeNotOnDate { date: details.date },
    )?;

    invariant(is_whole_minute(slot.start) && is_whole_minute(slot.end), || {
        DomainError::TimeNotWholeMinute
    })?;

    let actual = slot.duration_minutes();
    let expected = details.appointment_type.duration_minutes();
    invariant(actual == expected, || DomainError::InvalidDuration {
        appointment_type: details.appointment_type,
        expected,
        actual,
    })?;

    invariant(
        details
            .appointment_type
            .accepts_client_count(details.clients.len()),
        || DomainError::InvalidClientCount {
            appointment_type: details.appointment_type,
            required: details.appointment_type.client_requirement(),
            actual: details.clients.len(),
        },
    )?;

    if let Some(conflict) = find_trainer_conflict(existing, details, updating) {
        return Err(DomainError::trainer_conflict(conflict.id, details.trainer));
    }

    if let Some((conflict, client)) = find_client_conflict(existing, details, updating) {
        return Err(DomainError::client_conflict(conflict.id, client));
    }

    Ok(())
}

fn is_whole_minute(time: NaiveDateTime) -> bool {
    time.second() == 0 && time.nanosecond() == 0
}

fn overlapping<'a>(
    existing: &'a [Appointment],
    details: &'a AppointmentDetails,
    updating: Option<Uuid>,
) -> impl Iterator<Item = &'a Appointment> + 'a {
    let slot = details.slot();
    existing
        .iter()
        .filter(move |a| Some(a.id) != updating)
        .filter(move |a| a.details.slot().overlaps(&slot, CONFLICT_BOUNDS))
}

/// First existing appointment that double-books the trainer
pub fn find_trainer_conflict<'a>(
    existing: &'a [Appointment],
    details: &'a AppointmentDetails,
    updating: Option<Uuid>,
) -> Option<&'a Appointment> {
    overlapping(existing, details, updating).find(|a| a.details.trainer == details.trainer)
}

/// First existing appointment that double-books a client, with that client
pub fn find_client_conflict<'a>(
    existing: &'a [Appointment],
    details: &'a AppointmentDetails,
    updating: Option<Uuid>,
) -> Option<(&'a Appointment, Uuid)> {
    overlapping(existing, details, updating).find_map(|a| {
        a.details
            .clients
            .intersection(&details.clients)
            .next()
            .map(|client| (a, *client))
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn existing(trainer: Uuid, client: Uuid) -> Vec<Appointment> {
        vec![Appointment::new(
            Uuid::new_v4(),
            details(AppointmentType::FullHour, at(9, 0), at(10, 0), trainer, &[client]),
        )]
    }

    #[test]
    fn test_closed_overlap_includes_touching_endpoints() {
        let a = TimeSlot::new(at(9, 0), at(10, 0));
        let b = TimeSlot::new(at(10, 0), at(11, 0));

        assert!(a.overlaps(&b, IntervalBounds::Closed));
        assert!(!a.overlaps(&b, IntervalBounds::Open));
    }

    #[test]
    fn test_overlap_detects_containment() {
        let outer = TimeSlot::new(at(8, 0), at(11, 0));
        let inner = TimeSlot::new(at(9, 0), at(10, 0));

        assert!(outer.overlaps(&inner, CONFLICT_BOUNDS));
        assert!(inner.overlaps(&outer, CONFLICT_BOUNDS));
    }

    #[test]
    fn test_end_before_start_checked_first() {
        // Also the wrong duration and client count; ordering must win.
        let d = details(AppointmentType::Pair, at(10, 0), at(9, 0), Uuid::new_v4(), &[]);
        assert_eq!(
            validate_booking(&[], &d, None),
            Err(DomainError::EndTimeNotAfterStart)
        );
    }

    #[test]
    fn test_half_hour_duration() {
        let client = Uuid::new_v4();
        let ok = details(AppointmentType::HalfHour, at(10, 0), at(10, 30), Uuid::new_v4(), &[client]);
        assert_eq!(validate_booking(&[], &ok, None), Ok(()));

        let long = details(AppointmentType::HalfHour, at(10, 0), at(10, 31), Uuid::new_v4(), &[client]);
        assert!(matches!(
            validate_booking(&[], &long, None),
            Err(DomainError::InvalidDuration { expected: 30, actual: 31, .. })
        ));
    }

    #[test]
    fn test_pair_requires_two_clients() {
        let one = details(AppointmentType::Pair, at(10, 0), at(11, 0), Uuid::new_v4(), &[Uuid::new_v4()]);
        assert!(matches!(
            validate_booking(&[], &one, None),
            Err(DomainError::InvalidClientCount { actual: 1, .. })
        ));

        let two = details(
            AppointmentType::Pair,
            at(10, 0),
            at(11, 0),
            Uuid::new_v4(),
            &[Uuid::new_v4(), Uuid::new_v4()],
        );
        assert_eq!(validate_booking(&[], &two, None), Ok(()));
    }

    #[test]
    fn test_trainer_conflict_reports_existing_appointment() {
        let trainer = Uuid::new_v4();
        let booked = existing(trainer, Uuid::new_v4());
        let d = details(AppointmentType::FullHour, at(9, 30), at(10, 30), trainer, &[Uuid::new_v4()]);

        assert_eq!(
            validate_booking(&booked, &d, None),
            Err(DomainError::trainer_conflict(booked[0].id, trainer))
        );
    }

    #[test]
    fn test_client_conflict_with_other_trainer() {
        let client = Uuid::new_v4();
        let booked = existing(Uuid::new_v4(), client);
        let d = details(AppointmentType::FullHour, at(10, 0), at(11, 0), Uuid::new_v4(), &[client]);

        assert_eq!(
            validate_booking(&booked, &d, None),
            Err(DomainError::client_conflict(booked[0].id, client))
        );
    }

    #[test]
    fn test_updating_appointment_ignores_itself() {
        let trainer = Uuid::new_v4();
        let client = Uuid::new_v4();
        let booked = existing(trainer, client);
        let d = details(AppointmentType::FullHour, at(9, 30), at(10, 30), trainer, &[client]);

        assert_eq!(validate_booking(&booked, &d, Some(booked[0].id)), Ok(()));
    }

    #[test]
    fn test_times_must_fall_on_date() {
        let client = Uuid::new_v4();
        let mut d = details(AppointmentType::FullHour, at(9, 0), at(10, 0), Uuid::new_v4(), &[client]);
        d.start_time += chrono::Duration::days(5);
        d.end_time += chrono::Duration::days(5);

        assert_eq!(
            validate_booking(&[], &d, None),
            Err(DomainError::TimeNotOnDate { date: day() })
        );

        // Crossing midnight leaves the end on the next date
        let late = details(AppointmentType::FullHour, at(23, 30), at(23, 30) + chrono::Duration::hours(1), Uuid::new_v4(), &[client]);
        assert!(matches!(
            validate_booking(&[], &late, None),
            Err(DomainError::TimeNotOnDate { .. })
        ));
    }

    #[test]
    fn test_sub_minute_times_rejected() {
        let end = day().and_hms_opt(10, 30, 45).unwrap();
        let d = details(AppointmentType::HalfHour, at(10, 0), end, Uuid::new_v4(), &[Uuid::new_v4()]);

        assert_eq!(TimeSlot::new(at(10, 0), end).duration_minutes(), 30);
        assert_eq!(
            validate_booking(&[], &d, None),
            Err(DomainError::TimeNotWholeMinute)
        );
    }

    #[test]
    fn test_changed_fields_uses_wire_names() {
        let trainer = Uuid::new_v4();
        let before = details(AppointmentType::FullHour, at(9, 0), at(10, 0), trainer, &[Uuid::new_v4()]);
        let mut after = before.clone();
        after.start_time = at(9, 30);
        after.end_time = at(10, 30);
        after.trainer_name = Some("Sam".to_string());

        assert!(before.changed_fields(&before).is_empty());
        assert_eq!(
            before.changed_fields(&after),
            vec!["startTime", "endTime", "trainerName"]
        );
    }

    #[test]
    fn test_trainer_name_is_optional_on_the_wire() {
        let trainer = Uuid::new_v4();
        let client = Uuid::new_v4();
        let named: AppointmentDetails = serde_json::from_value(serde_json::json!({
            "appointmentType": "halfHour",
            "date": "2015-09-14",
            "startTime": "2015-09-14T10:00:00",
            "endTime": "2015-09-14T10:30:00",
            "trainer": trainer,
            "trainerName": "Sam Jones",
            "clients": [client],
        }))
        .unwrap();
        assert_eq!(named.trainer_name.as_deref(), Some("Sam Jones"));

        let unnamed = details(AppointmentType::HalfHour, at(10, 0), at(10, 30), trainer, &[client]);
        let json = serde_json::to_value(&unnamed).unwrap();
        assert!(json.get("trainerName").is_none());
    }
}
