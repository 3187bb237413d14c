// models.rs - Account holder and payee types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The signed-in account holder
///
/// One instance lives in the session; `balance` is mutated in place after a
/// completed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub phone_number: String,
    pub balance: Decimal,
}

impl User {
    /// True when `amount` can be sent from the current balance
    #[inline]
    pub fn can_afford(&self, amount: Decimal) -> bool {
        amount <= self.balance
    }
}

/// A payee, either from the recipient fixtures or the device address book
///
/// Immutable once created; a transaction keeps its own snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_recent: Option<bool>,
}

impl Recipient {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone_number: None,
            email: None,
            is_recent: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone_number = Some(phone.into());
        self
    }

    pub fn is_recent(&self) -> bool {
        self.is_recent.unwrap_or(false)
    }

    /// Name match is case-insensitive; phone match is a plain substring
    pub fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query.to_lowercase())
            || self
                .phone_number
                .as_deref()
                .is_some_and(|phone| phone.contains(query))
    }
}
