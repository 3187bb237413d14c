//! Transfer Core Types
//!
//! The transaction record, the in-progress draft, and the payloads carried
//! between flow steps.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::TransferError;
use super::state::TransactionStatus;
use crate::models::Recipient;

/// Transaction ID - `TXN` followed by an upper-case ULID
///
/// ULIDs sort by creation time and need no coordination between
/// generators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub const PREFIX: &'static str = "TXN";

    /// Generate a new unique TransactionId
    pub fn generate() -> Self {
        Self(format!("{}{}", Self::PREFIX, ulid::Ulid::new()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Empty or whitespace-only notes are dropped
pub fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

// ============================================================================
// Transaction
// ============================================================================

/// A submitted transfer
///
/// Created PENDING. [`Transaction::resolve`] moves it to COMPLETED or FAILED
/// once; after that the record is never changed again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub amount: Decimal,
    /// Snapshot at submission time
    pub recipient: Recipient,
    /// ISO-8601 creation time
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    status: TransactionStatus,
}

impl Transaction {
    /// New PENDING transaction with a fresh id and the current time
    pub fn pending(amount: Decimal, recipient: Recipient, note: Option<String>) -> Self {
        Self {
            id: TransactionId::generate(),
            amount,
            recipient,
            date: Utc::now(),
            note: normalize_note(note),
            status: TransactionStatus::Pending,
        }
    }

    #[inline]
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }

    /// Apply the one allowed status transition
    pub fn resolve(&mut self, status: TransactionStatus) -> Result<(), TransferError> {
        self.status = self.status.transition(status)?;
        Ok(())
    }

    /// Consuming form of [`Transaction::resolve`]
    pub fn resolved(mut self, status: TransactionStatus) -> Result<Self, TransferError> {
        self.resolve(status)?;
        Ok(self)
    }
}

// ============================================================================
// Navigation Payloads
// ============================================================================

/// Payload into recipient selection (list or contacts)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountParams {
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Payload into the confirmation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmParams {
    pub recipient: Recipient,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Payload into the receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptParams {
    pub transaction: Transaction,
}

// ============================================================================
// Draft
// ============================================================================

/// In-progress transfer data, accumulated across steps and discarded after
/// submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferDraft {
    pub amount: Decimal,
    pub note: Option<String>,
    pub recipient: Option<Recipient>,
}

impl TransferDraft {
    pub fn amount_params(&self) -> AmountParams {
        AmountParams {
            amount: self.amount,
            note: self.note.clone(),
        }
    }

    pub fn confirm_params(&self) -> Result<ConfirmParams, TransferError> {
        let recipient = self
            .recipient
            .clone()
            .ok_or(TransferError::MissingRecipient)?;
        Ok(ConfirmParams {
            recipient,
            amount: self.amount,
            note: self.note.clone(),
        })
    }

    pub fn into_transaction(self) -> Result<Transaction, TransferError> {
        let recipient = self.recipient.ok_or(TransferError::MissingRecipient)?;
        Ok(Transaction::pending(self.amount, recipient, self.note))
    }
}

impl From<AmountParams> for TransferDraft {
    fn from(params: AmountParams) -> Self {
        Self {
            amount: params.amount,
            note: normalize_note(params.note),
            recipient: None,
        }
    }
}

impl From<ConfirmParams> for TransferDraft {
    fn from(params: ConfirmParams) -> Self {
        Self {
            amount: params.amount,
            note: normalize_note(params.note),
            recipient: Some(params.recipient),
        }
    }
}
