//! Transaction Status
//!
//! ```text
//! PENDING ──▶ COMPLETED
//!    │
//!    └──────▶ FAILED
//! ```
//!
//! A transaction leaves PENDING exactly once; both exits are terminal.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::TransferError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Created, not yet resolved by the backend
    Pending,

    /// Terminal: funds moved, balance deducted
    Completed,

    /// Terminal: nothing moved
    Failed,
}

impl TransactionStatus {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed | TransactionStatus::Failed
        )
    }

    /// Validate a transition. Only PENDING → terminal is legal.
    pub fn transition(self, to: TransactionStatus) -> Result<TransactionStatus, TransferError> {
        match (self, to) {
            (TransactionStatus::Pending, next) if next.is_terminal() => Ok(next),
            (from, to) => Err(TransferError::InvalidStateTransition(format!(
                "{} -> {}",
                from, to
            ))),
        }
    }

    /// Wire name, also used for display
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
