//! Transfer Service
//!
//! [`TransferBackend`] is the seam between the flow and "the server". The
//! only implementation here simulates it locally; a real HTTP client would
//! implement the same trait.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use super::error::TransferError;
use super::state::TransactionStatus;
use super::types::Transaction;
use crate::config::SimulationConfig;
use crate::fixtures;
use crate::models::{Recipient, User};
use crate::remote::{Method, OutcomePolicy, SimulatedCall, policy_for_rate};
use crate::store::SessionContext;

/// Endpoint labels, used for logging only
pub mod endpoints {
    pub const CURRENT_USER: &str = "/users/current";
    pub const RECIPIENTS: &str = "/recipients";
    pub const TRANSACTIONS: &str = "/transactions";
}

/// Backend operations the transfer flow depends on
///
/// None of these retries; callers surface the error and let the user try
/// again.
#[async_trait]
pub trait TransferBackend: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// The signed-in user. A user already held by `session` (e.g. after a
    /// completed transfer) takes precedence over the server copy.
    async fn get_current_user(&self, session: &SessionContext) -> Result<User, TransferError>;

    async fn get_recipients(&self) -> Result<Vec<Recipient>, TransferError>;

    /// Resolve a PENDING transaction to COMPLETED or FAILED.
    ///
    /// Never touches the balance. No idempotency: two calls are two
    /// transfers.
    async fn process_transfer(&self, transaction: Transaction)
    -> Result<Transaction, TransferError>;
}

/// Local stand-in for the transfer server
///
/// Two independent policies: `network` decides whether a call fails
/// outright, `settlement` decides whether a submitted transfer completes.
pub struct SimulatedTransferService {
    call: SimulatedCall,
    settlement: Arc<dyn OutcomePolicy>,
}

impl SimulatedTransferService {
    pub fn new(call: SimulatedCall, settlement: Arc<dyn OutcomePolicy>) -> Self {
        Self { call, settlement }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            SimulatedCall::from_config(config),
            policy_for_rate(config.settlement_success_rate),
        )
    }

    /// No latency, nothing fails
    pub fn instant() -> Self {
        Self::new(SimulatedCall::instant(), policy_for_rate(1.0))
    }
}

#[async_trait]
impl TransferBackend for SimulatedTransferService {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn get_current_user(&self, session: &SessionContext) -> Result<User, TransferError> {
        let fixture = fixtures::mock_user()?;
        let fetched = self
            .call
            .call(endpoints::CURRENT_USER, Method::Get, fixture)
            .await
            .map_err(|e| {
                error!(error = %e, "Error fetching user data");
                TransferError::DataFetch(e.to_string())
            })?;

        // Session copy carries the post-transfer balance
        if let Some(known) = session.user() {
            return Ok(known);
        }
        Ok(fetched)
    }

    async fn get_recipients(&self) -> Result<Vec<Recipient>, TransferError> {
        let fixture = fixtures::mock_recipients()?;
        self.call
            .call(endpoints::RECIPIENTS, Method::Get, fixture)
            .await
            .map_err(|e| {
                error!(error = %e, "Error fetching recipients");
                TransferError::DataFetch(e.to_string())
            })
    }

    async fn process_transfer(
        &self,
        transaction: Transaction,
    ) -> Result<Transaction, TransferError> {
        if transaction.status() != TransactionStatus::Pending {
            return Err(TransferError::InvalidStateTransition(format!(
                "transaction {} already {}",
                transaction.id,
                transaction.status()
            )));
        }

        let status = if self.settlement.succeeds() {
            TransactionStatus::Completed
        } else {
            TransactionStatus::Failed
        };
        let resolved = transaction.resolved(status)?;

        let processed = self
            .call
            .call(endpoints::TRANSACTIONS, Method::Post, resolved)
            .await
            .map_err(|e| {
                error!(error = %e, "Error processing transfer");
                TransferError::Submission(e.to_string())
            })?;

        info!(
            id = %processed.id,
            amount = %processed.amount,
            recipient = %processed.recipient.id,
            status = %processed.status(),
            "Transfer processed"
        );
        Ok(processed)
    }
}


#[cfg(test)]
pub use mock::MockBackend;
