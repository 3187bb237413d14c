//! Peer Transfer
//!
//! One transfer from the signed-in user to a recipient, start to receipt.
//!
//! # Flow
//!
//! ```text
//! ENTER_AMOUNT → SELECT_RECIPIENT (or CONTACTS) → CONFIRM → [AUTH] → RECEIPT
//! ```
//!
//! # Transaction Lifecycle
//!
//! ```text
//! PENDING → COMPLETED
//!    ↓
//!  FAILED
//! ```
//!
//! # Invariants
//!
//! 1. **Funds checked before submission**: an amount above the balance never
//!    reaches the backend
//! 2. **Balance moves only on COMPLETED**: a FAILED transfer leaves it untouched
//! 3. **Resolve once**: a transaction never leaves COMPLETED or FAILED
//! 4. **No idempotency**: every submission is a new transaction with a new id

pub mod error;
pub mod flow;
pub mod receipt;
pub mod service;
pub mod state;
pub mod types;

#[cfg(test)]
mod integration_tests;

// Re-exports for convenience
pub use error::TransferError;
pub use flow::{ConfirmOutcome, FlowSettings, Step, TransferFlow};
pub use receipt::Receipt;
pub use service::{SimulatedTransferService, TransferBackend};
pub use state::TransactionStatus;
pub use types::{
    AmountParams, ConfirmParams, ReceiptParams, Transaction, TransactionId, TransferDraft,
};
