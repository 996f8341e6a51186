//! Command definitions
//!
//! Commands represent intentions to change the system state. On the wire a
//! command is a JSON object whose `commandName` selects the variant; the
//! remaining fields are its payload.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Address, AppointmentDetails, ClientInfo, ContactInfo};

// =========================================================================
// Client commands
// =========================================================================

/// Commands handled by the Client aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "commandName",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientCommand {
    AddClient {
        info: ClientInfo,
        contact: ContactInfo,
        #[serde(default)]
        address: Option<Address>,
    },
    UpdateClientInfo {
        entity_name: Uuid,
        info: ClientInfo,
    },
    UpdateClientContact {
        entity_name: Uuid,
        contact: ContactInfo,
    },
    UpdateClientAddress {
        entity_name: Uuid,
        address: Address,
    },
    ArchiveClient {
        entity_name: Uuid,
    },
    UnArchiveClient {
        entity_name: Uuid,
    },
}

impl ClientCommand {
    pub const COMMAND_NAMES: &'static [&'static str] = &[
        "addClient",
        "updateClientInfo",
        "updateClientContact",
        "updateClientAddress",
        "archiveClient",
        "unArchiveClient",
    ];

    /// Target client, or `None` for the creation command
    pub fn client_id(&self) -> Option<Uuid> {
        match self {
            ClientCommand::AddClient { .. } => None,
            ClientCommand::UpdateClientInfo { entity_name, .. }
            | ClientCommand::UpdateClientContact { entity_name, .. }
            | ClientCommand::UpdateClientAddress { entity_name, .. }
            | ClientCommand::ArchiveClient { entity_name }
            | ClientCommand::UnArchiveClient { entity_name } => Some(*entity_name),
        }
    }
}

// =========================================================================
// Day commands
// =========================================================================

/// Book a new appointment on a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub entity_name: Uuid,
    #[serde(flatten)]
    pub details: AppointmentDetails,
}

/// Replace the details of an existing appointment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentUpdate {
    pub entity_name: Uuid,
    pub appointment_id: Uuid,
    #[serde(flatten)]
    pub details: AppointmentDetails,
}

/// Relocate an appointment from `original_entity_name` to `entity_name`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentMove {
    pub entity_name: Uuid,
    pub original_entity_name: Uuid,
    pub appointment_id: Uuid,
    #[serde(flatten)]
    pub details: AppointmentDetails,
}

/// Commands handled by the Day aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "commandName",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum DayCommand {
    ScheduleAppointment(NewAppointment),
    RescheduleAppointmentToNewDay(AppointmentMove),
    ChangeAppointmentType(AppointmentUpdate),
    UpdateNotesForAppointment(AppointmentUpdate),
    ChangeAppointmentClients(AppointmentUpdate),
    ChangeAppointmentTrainer(AppointmentUpdate),
    RescheduleAppointmentTime(AppointmentUpdate),
    CancelAppointment {
        entity_name: Uuid,
        appointment_id: Uuid,
    },
}

impl DayCommand {
    pub const COMMAND_NAMES: &'static [&'static str] = &[
        "scheduleAppointment",
        "rescheduleAppointmentToNewDay",
        "changeAppointmentType",
        "updateNotesForAppointment",
        "changeAppointmentClients",
        "changeAppointmentTrainer",
        "rescheduleAppointmentTime",
        "cancelAppointment",
    ];

    /// The day this command is addressed to (the destination for moves)
    pub fn day_id(&self) -> Uuid {
        match self {
            DayCommand::ScheduleAppointment(new) => new.entity_name,
            DayCommand::RescheduleAppointmentToNewDay(mv) => mv.entity_name,
            DayCommand::ChangeAppointmentType(update)
            | DayCommand::UpdateNotesForAppointment(update)
            | DayCommand::ChangeAppointmentClients(update)
            | DayCommand::ChangeAppointmentTrainer(update)
            | DayCommand::RescheduleAppointmentTime(update) => update.entity_name,
            DayCommand::CancelAppointment { entity_name, .. } => *entity_name,
        }
    }

    /// The day a move starts from; `None` for single-day commands
    pub fn source_day_id(&self) -> Option<Uuid> {
        match self {
            DayCommand::RescheduleAppointmentToNewDay(mv) => Some(mv.original_entity_name),
            _ => None,
        }
    }
}

/// Any command the system accepts
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Client(ClientCommand),
    Day(DayCommand),
}

impl Command {
    /// Which aggregate handles a command name, if any
    pub fn aggregate_for(command_name: &str) -> Option<&'static str> {
        if ClientCommand::COMMAND_NAMES.contains(&command_name) {
            Some("Client")
        } else if DayCommand::COMMAND_NAMES.contains(&command_name) {
            Some("Day")
        } else {
            None
        }
    }
}

impl From<ClientCommand> for Command {
    fn from(command: ClientCommand) -> Self {
        Command::Client(command)
    }
}

impl From<DayCommand> for Command {
    fn from(command: DayCommand) -> Self {
        Command::Day(command)
    }
}
