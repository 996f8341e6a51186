//! Client Aggregate
//!
//! Client aggregate for managing client profile information and archival.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    invariant, Address, ClientCommand, ClientEvent, ClientInfo, ContactInfo, DomainError,
    IdGenerator,
};

use super::Aggregate;

/// Client status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClientStatus {
    #[default]
    Active,
    Archived,
}

/// Client Aggregate
///
/// Exists once `clientAdded` has been applied. While archived it only accepts
/// `unArchiveClient`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Client {
    /// Unique client ID (None until added)
    id: Option<Uuid>,

    info: ClientInfo,

    contact: ContactInfo,

    address: Option<Address>,

    status: ClientStatus,

    /// When the client was added
    added_at: Option<DateTime<Utc>>,

    /// When the client was last archived
    archived_at: Option<DateTime<Utc>>,
}

impl Client {
    // =========================================================================
    // Command handlers
    // =========================================================================

    fn add(
        &self,
        info: ClientInfo,
        contact: ContactInfo,
        address: Option<Address>,
        ids: &dyn IdGenerator,
    ) -> Result<ClientEvent, DomainError> {
        if let Some(id) = self.id {
            return Err(DomainError::ClientAlreadyExists(id));
        }

        Ok(ClientEvent::ClientAdded {
            client_id: ids.next_id(),
            info,
            contact,
            address,
            added_at: Utc::now(),
        })
    }

    /// Existing, non-archived client id
    fn expect_active(&self) -> Result<Uuid, DomainError> {
        let id = self.id.ok_or(DomainError::ClientNotFound)?;
        invariant(self.status != ClientStatus::Archived, || {
            DomainError::ClientAlreadyArchived
        })?;
        Ok(id)
    }

    fn expect_archived(&self) -> Result<Uuid, DomainError> {
        let id = self.id.ok_or(DomainError::ClientNotFound)?;
        invariant(self.status == ClientStatus::Archived, || {
            DomainError::ClientNotArchived
        })?;
        Ok(id)
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn info(&self) -> &ClientInfo {
        &self.info
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }

    pub fn status(&self) -> ClientStatus {
        self.status
    }

    pub fn is_archived(&self) -> bool {
        self.status == ClientStatus::Archived
    }

    pub fn added_at(&self) -> Option<DateTime<Utc>> {
        self.added_at
    }

    pub fn archived_at(&self) -> Option<DateTime<Utc>> {
        self.archived_at
    }
}

impl Aggregate for Client {
    type Command = ClientCommand;
    type Event = ClientEvent;

    fn aggregate_type() -> &'static str {
        "Client"
    }

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn handle(
        &self,
        command: ClientCommand,
        ids: &dyn IdGenerator,
    ) -> Result<Vec<ClientEvent>, DomainError> {
        let event = match command {
            ClientCommand::AddClient {
                info,
                contact,
                address,
            } => self.add(info, contact, address, ids)?,

            ClientCommand::UpdateClientInfo { info, .. } => ClientEvent::ClientInfoUpdated {
                client_id: self.expect_active()?,
                info,
            },

            ClientCommand::UpdateClientContact { contact, .. } => {
                ClientEvent::ClientContactUpdated {
                    client_id: self.expect_active()?,
                    contact,
                }
            }

            ClientCommand::UpdateClientAddress { address, .. } => {
                ClientEvent::ClientAddressUpdated {
                    client_id: self.expect_active()?,
                    address,
                }
            }

            ClientCommand::ArchiveClient { .. } => ClientEvent::ClientArchived {
                client_id: self.expect_active()?,
                archived_at: Utc::now(),
            },

            ClientCommand::UnArchiveClient { .. } => ClientEvent::ClientUnarchived {
                client_id: self.expect_archived()?,
                unarchived_at: Utc::now(),
            },
        };

        Ok(vec![event])
    }

    fn apply(mut self, event: &ClientEvent) -> Self {
        match event {
            ClientEvent::ClientAdded {
                client_id,
                info,
                contact,
                address,
                added_at,
            } => {
                self.id = Some(*client_id);
                self.info = info.clone();
                self.contact = contact.clone();
                self.address = address.clone();
                self.status = ClientStatus::Active;
                self.added_at = Some(*added_at);
            }

            ClientEvent::ClientInfoUpdated { info, .. } => {
                self.info = info.clone();
            }

            ClientEvent::ClientContactUpdated { contact, .. } => {
                self.contact = contact.clone();
            }

            ClientEvent::ClientAddressUpdated { address, .. } => {
                self.address = Some(address.clone());
            }

            ClientEvent::ClientArchived { archived_at, .. } => {
                self.status = ClientStatus::Archived;
                self.archived_at = Some(*archived_at);
            }

            ClientEvent::ClientUnarchived { .. } => {
                self.status = ClientStatus::Active;
            }
        }

        self
    }
}
