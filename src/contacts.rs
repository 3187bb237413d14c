//! Device Contacts
//!
//! Read-only access to the device address book, behind a runtime permission.
//! A refused permission ends the contacts path; the caller keeps whatever
//! recipient list it already had.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::fixtures;
use crate::models::Recipient;
use crate::transfer::error::TransferError;

/// Answer to a permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// One address-book entry as the device reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceContact {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub phone_numbers: Vec<String>,
}

impl DeviceContact {
    /// Entries missing an id, a name or a phone number are skipped
    pub fn to_recipient(&self) -> Option<Recipient> {
        let id = self.id.as_deref().filter(|s| !s.is_empty())?;
        let name = self.name.as_deref().filter(|s| !s.is_empty())?;
        let phone = self.phone_numbers.first().filter(|s| !s.is_empty())?;
        Some(Recipient::new(id, name).with_phone(phone.as_str()))
    }
}

/// Device address-book capability
#[async_trait]
pub trait ContactsProvider: Send + Sync {
    async fn request_permission(&self) -> PermissionStatus;

    /// Only called after a `Granted` answer
    async fn list_contacts(&self) -> Result<Vec<DeviceContact>, TransferError>;
}

/// Ask for permission and turn the address book into recipients sorted by
/// name.
pub async fn load_contact_recipients(
    provider: &dyn ContactsProvider,
) -> Result<Vec<Recipient>, TransferError> {
    let status = provider.request_permission().await;
    if status != PermissionStatus::Granted {
        warn!(?status, "Contacts permission not granted");
        return Err(TransferError::PermissionDenied);
    }

    let contacts = provider.list_contacts().await?;
    let total = contacts.len();
    let mut recipients: Vec<Recipient> = contacts
        .iter()
        .filter_map(DeviceContact::to_recipient)
        .collect();
    recipients.sort_by_key(|r| r.name.to_lowercase());

    info!(total, usable = recipients.len(), "Contacts loaded");
    Ok(recipients)
}

/// Search filter shared by the recipient list and the contacts list
pub fn filter_recipients<'a>(recipients: &'a [Recipient], query: &str) -> Vec<&'a Recipient> {
    let query = query.trim();
    recipients.iter().filter(|r| r.matches(query)).collect()
}

/// Fixed address book with a fixed permission answer
pub struct StaticContacts {
    permission: PermissionStatus,
    contacts: Vec<DeviceContact>,
}

impl StaticContacts {
    pub fn new(permission: PermissionStatus, contacts: Vec<DeviceContact>) -> Self {
        Self {
            permission,
            contacts,
        }
    }

    /// The bundled demo address book
    pub fn demo(permission: PermissionStatus) -> Result<Self, TransferError> {
        Ok(Self::new(permission, fixtures::mock_contacts()?))
    }
}

#[async_trait]
impl ContactsProvider for StaticContacts {
    async fn request_permission(&self) -> PermissionStatus {
        self.permission
    }

    async fn list_contacts(&self) -> Result<Vec<DeviceContact>, TransferError> {
        Ok(self.contacts.clone())
    }
}
