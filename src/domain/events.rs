//! Domain Events
//!
//! Event definitions for Event Sourcing.
//! Events are immutable facts that have happened in the system.
//!
//! Every event serializes as `{"eventName": ..., "data": {...}}`. The name is
//! stored in its own column and the data object as the payload, so an event
//! can be rebuilt from the pair with [`DomainEvent::from_payload`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{Address, Appointment, ClientInfo, ContactInfo};

/// Behaviour shared by every aggregate's event enum
pub trait DomainEvent: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync {
    /// Every event name this enum can decode
    const EVENT_TYPES: &'static [&'static str];

    /// Get the event name as a string
    fn event_type(&self) -> &'static str;

    /// Whether a stored event name belongs to this enum
    fn is_known(event_type: &str) -> bool {
        Self::EVENT_TYPES.contains(&event_type)
    }

    /// Serialize the `data` half of the event
    fn payload(&self) -> Result<Value, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(mut tagged) => Ok(tagged.remove("data").unwrap_or(Value::Null)),
            other => Ok(other),
        }
    }

    /// Rebuild an event from its name and `data` half
    fn from_payload(event_type: &str, data: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(json!({ "eventName": event_type, "data": data }))
    }
}

/// Client-related events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "eventName",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Client was added
    ClientAdded {
        client_id: Uuid,
        info: ClientInfo,
        contact: ContactInfo,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        address: Option<Address>,
        added_at: DateTime<Utc>,
    },

    ClientInfoUpdated {
        client_id: Uuid,
        info: ClientInfo,
    },

    ClientContactUpdated {
        client_id: Uuid,
        contact: ContactInfo,
    },

    ClientAddressUpdated {
        client_id: Uuid,
        address: Address,
    },

    /// Client was archived
    ClientArchived {
        client_id: Uuid,
        archived_at: DateTime<Utc>,
    },

    /// Client was brought back from the archive
    ClientUnarchived {
        client_id: Uuid,
        unarchived_at: DateTime<Utc>,
    },
}

impl DomainEvent for ClientEvent {
    const EVENT_TYPES: &'static [&'static str] = &[
        "clientAdded",
        "clientInfoUpdated",
        "clientContactUpdated",
        "clientAddressUpdated",
        "clientArchived",
        "clientUnarchived",
    ];

    fn event_type(&self) -> &'static str {
        match self {
            ClientEvent::ClientAdded { .. } => "clientAdded",
            ClientEvent::ClientInfoUpdated { .. } => "clientInfoUpdated",
            ClientEvent::ClientContactUpdated { .. } => "clientContactUpdated",
            ClientEvent::ClientAddressUpdated { .. } => "clientAddressUpdated",
            ClientEvent::ClientArchived { .. } => "clientArchived",
            ClientEvent::ClientUnarchived { .. } => "clientUnarchived",
        }
    }
}

impl ClientEvent {
    /// Get the client ID this event relates to
    pub fn client_id(&self) -> Uuid {
        match self {
            ClientEvent::ClientAdded { client_id, .. }
            | ClientEvent::ClientInfoUpdated { client_id, .. }
            | ClientEvent::ClientContactUpdated { client_id, .. }
            | ClientEvent::ClientAddressUpdated { client_id, .. }
            | ClientEvent::ClientArchived { client_id, .. }
            | ClientEvent::ClientUnarchived { client_id, .. } => *client_id,
        }
    }
}

/// Day (schedule) events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "eventName",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum DayEvent {
    /// A new appointment was booked
    AppointmentScheduled {
        day_id: Uuid,
        appointment: Appointment,
    },

    /// An appointment arrived from another day, keeping its id
    AppointmentMovedFromDifferentDay {
        day_id: Uuid,
        original_day_id: Uuid,
        appointment: Appointment,
    },

    /// An appointment left for another day
    AppointmentMovedToDifferentDay {
        day_id: Uuid,
        destination_day_id: Uuid,
        appointment_id: Uuid,
    },

    AppointmentTypeChanged {
        day_id: Uuid,
        appointment: Appointment,
    },

    NotesForAppointmentUpdated {
        day_id: Uuid,
        appointment: Appointment,
    },

    ClientsChangedForAppointment {
        day_id: Uuid,
        appointment: Appointment,
    },

    TrainerChangedForAppointment {
        day_id: Uuid,
        appointment: Appointment,
    },

    TimeChangedForAppointment {
        day_id: Uuid,
        appointment: Appointment,
    },

    AppointmentCanceled {
        day_id: Uuid,
        appointment_id: Uuid,
    },
}

impl DomainEvent for DayEvent {
    const EVENT_TYPES: &'static [&'static str] = &[
        "appointmentScheduled",
        "appointmentMovedFromDifferentDay",
        "appointmentMovedToDifferentDay",
        "appointmentTypeChanged",
        "notesForAppointmentUpdated",
        "clientsChangedForAppointment",
        "trainerChangedForAppointment",
        "timeChangedForAppointment",
        "appointmentCanceled",
    ];

    fn event_type(&self) -> &'static str {
        match self {
            DayEvent::AppointmentScheduled { .. } => "appointmentScheduled",
            DayEvent::AppointmentMovedFromDifferentDay { .. } => "appointmentMovedFromDifferentDay",
            DayEvent::AppointmentMovedToDifferentDay { .. } => "appointmentMovedToDifferentDay",
            DayEvent::AppointmentTypeChanged { .. } => "appointmentTypeChanged",
            DayEvent::NotesForAppointmentUpdated { .. } => "notesForAppointmentUpdated",
            DayEvent::ClientsChangedForAppointment { .. } => "clientsChangedForAppointment",
            DayEvent::TrainerChangedForAppointment { .. } => "trainerChangedForAppointment",
            DayEvent::TimeChangedForAppointment { .. } => "timeChangedForAppointment",
            DayEvent::AppointmentCanceled { .. } => "appointmentCanceled",
        }
    }
}

impl DayEvent {
    /// Get the day ID this event relates to
    pub fn day_id(&self) -> Uuid {
        match self {
            DayEvent::AppointmentScheduled { day_id, .. }
            | DayEvent::AppointmentMovedFromDifferentDay { day_id, .. }
            | DayEvent::AppointmentMovedToDifferentDay { day_id, .. }
            | DayEvent::AppointmentTypeChanged { day_id, .. }
            | DayEvent::NotesForAppointmentUpdated { day_id, .. }
            | DayEvent::ClientsChangedForAppointment { day_id, .. }
            | DayEvent::TrainerChangedForAppointment { day_id, .. }
            | DayEvent::TimeChangedForAppointment { day_id, .. }
            | DayEvent::AppointmentCanceled { day_id, .. } => *day_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schedule::fixtures::{at, details};
    use crate::domain::AppointmentType;

    #[test]
    fn test_client_event_wire_shape() {
        let event = ClientEvent::ClientArchived {
            client_id: Uuid::new_v4(),
            archived_at: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["eventName"], "clientArchived");
        assert!(json["data"]["clientId"].is_string());
        assert!(json["data"]["archivedAt"].is_string());
    }

    #[test]
    fn test_event_type_matches_serialized_name() {
        let appointment = Appointment::new(
            Uuid::new_v4(),
            details(AppointmentType::HalfHour, at(9, 0), at(9, 30), Uuid::new_v4(), &[Uuid::new_v4()]),
        );
        let day_id = Uuid::new_v4();
        let events = vec![
            DayEvent::AppointmentScheduled { day_id, appointment: appointment.clone() },
            DayEvent::AppointmentMovedFromDifferentDay {
                day_id,
                original_day_id: Uuid::new_v4(),
                appointment: appointment.clone(),
            },
            DayEvent::AppointmentMovedToDifferentDay {
                day_id,
                destination_day_id: Uuid::new_v4(),
                appointment_id: appointment.id,
            },
            DayEvent::AppointmentTypeChanged { day_id, appointment: appointment.clone() },
            DayEvent::NotesForAppointmentUpdated { day_id, appointment: appointment.clone() },
            DayEvent::ClientsChangedForAppointment { day_id, appointment: appointment.clone() },
            DayEvent::TrainerChangedForAppointment { day_id, appointment: appointment.clone() },
            DayEvent::TimeChangedForAppointment { day_id, appointment: appointment.clone() },
            DayEvent::AppointmentCanceled { day_id, appointment_id: appointment.id },
        ];

        assert_eq!(events.len(), DayEvent::EVENT_TYPES.len());
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["eventName"], event.event_type());
            assert!(DayEvent::is_known(event.event_type()));
            assert_eq!(event.day_id(), day_id);
        }
    }

    #[test]
    fn test_payload_rebuilds_event() {
        let event = ClientEvent::ClientInfoUpdated {
            client_id: Uuid::new_v4(),
            info: ClientInfo {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                ..Default::default()
            },
        };

        let data = event.payload().unwrap();
        assert_eq!(data["info"]["firstName"], "Ada");

        let rebuilt = ClientEvent::from_payload(event.event_type(), data).unwrap();
        assert_eq!(rebuilt, event);
    }

    #[test]
    fn test_unknown_event_name() {
        assert!(!ClientEvent::is_known("userArchived"));
        assert!(ClientEvent::from_payload("userArchived", json!({})).is_err());
    }
}
