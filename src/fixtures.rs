//! Mock Data Store
//!
//! Static demo data compiled into the binary from `fixtures/*.json`.

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::contacts::DeviceContact;
use crate::models::{Recipient, User};

const USER_JSON: &str = include_str!("../fixtures/user.json");
const RECIPIENTS_JSON: &str = include_str!("../fixtures/recipients.json");
const CONTACTS_JSON: &str = include_str!("../fixtures/contacts.json");

#[derive(Debug, Error)]
#[error("Failed to parse fixture {name}: {source}")]
pub struct FixtureError {
    pub name: &'static str,
    #[source]
    pub source: serde_json::Error,
}

fn parse<T: DeserializeOwned>(name: &'static str, raw: &str) -> Result<T, FixtureError> {
    serde_json::from_str(raw).map_err(|source| FixtureError { name, source })
}

/// The single demo account holder
pub fn mock_user() -> Result<User, FixtureError> {
    parse("user.json", USER_JSON)
}

/// Fixed recipient list
pub fn mock_recipients() -> Result<Vec<Recipient>, FixtureError> {
    parse("recipients.json", RECIPIENTS_JSON)
}

/// Demo address book for the static contacts provider
pub fn mock_contacts() -> Result<Vec<DeviceContact>, FixtureError> {
    parse("contacts.json", CONTACTS_JSON)
}
