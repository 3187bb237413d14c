//! Transfer Error Types
//!
//! Every failure the flow can hit. Each one is caught at the boundary of the
//! operation that raised it and shown to the user; none is retried
//! automatically.

use thiserror::Error;

use crate::fixtures::FixtureError;
use crate::money::MoneyError;
use crate::remote::RemoteError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    // === Data Fetch / Submission ===
    #[error("Failed to fetch data: {0}")]
    DataFetch(String),

    #[error("Failed to process transfer: {0}")]
    Submission(String),

    #[error("Fixture error: {0}")]
    Fixture(String),

    // === Validation ===
    #[error("Please enter a valid amount")]
    InvalidAmount,

    #[error("Amount cannot exceed RM999,999.99")]
    AmountTooLarge,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("No recipient selected")]
    MissingRecipient,

    #[error("User data not loaded")]
    UserNotLoaded,

    // === Authentication / Permissions ===
    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Biometric authentication not available")]
    AuthenticationUnavailable,

    #[error("Contacts permission denied")]
    PermissionDenied,

    // === Flow ===
    #[error("Action not allowed in step: {0}")]
    InvalidStep(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
}

impl TransferError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::DataFetch(_) => "DATA_FETCH_FAILED",
            TransferError::Submission(_) => "SUBMISSION_FAILED",
            TransferError::Fixture(_) => "FIXTURE_ERROR",
            TransferError::InvalidAmount => "INVALID_AMOUNT",
            TransferError::AmountTooLarge => "AMOUNT_TOO_LARGE",
            TransferError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            TransferError::MissingRecipient => "MISSING_RECIPIENT",
            TransferError::UserNotLoaded => "USER_NOT_LOADED",
            TransferError::AuthenticationFailed => "AUTHENTICATION_FAILED",
            TransferError::AuthenticationUnavailable => "AUTHENTICATION_UNAVAILABLE",
            TransferError::PermissionDenied => "PERMISSION_DENIED",
            TransferError::InvalidStep(_) => "INVALID_STEP",
            TransferError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
        }
    }

    /// Text for the inline error / alert the user sees
    pub fn user_message(&self) -> String {
        match self {
            TransferError::DataFetch(_) => "Failed to load data. Please try again.".to_string(),
            TransferError::Submission(_) | TransferError::InvalidStateTransition(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            TransferError::PermissionDenied => {
                "Please grant contacts permission to select a recipient from your contacts."
                    .to_string()
            }
            TransferError::AuthenticationFailed => {
                "Authentication failed. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<MoneyError> for TransferError {
    fn from(e: MoneyError) -> Self {
        match e {
            MoneyError::AmountTooLarge => TransferError::AmountTooLarge,
            MoneyError::InvalidAmount | MoneyError::InvalidFormat(_) => {
                TransferError::InvalidAmount
            }
        }
    }
}

impl From<FixtureError> for TransferError {
    fn from(e: FixtureError) -> Self {
        TransferError::Fixture(e.to_string())
    }
}

impl From<RemoteError> for TransferError {
    fn from(e: RemoteError) -> Self {
        TransferError::DataFetch(e.to_string())
    }
}
