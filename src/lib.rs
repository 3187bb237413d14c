//! Peer Transfer - Send money to a recipient from your wallet balance
//!
//! A headless transfer flow: enter an amount, pick a recipient (from the
//! recent list or the device address book), confirm with biometrics or a
//! PIN, get a receipt. The backend is simulated locally with configurable
//! latency and outcomes.
//!
//! # Modules
//!
//! - [`money`] - Cents-based amount entry and currency display
//! - [`models`] - User and Recipient types
//! - [`fixtures`] - Bundled mock data
//! - [`remote`] - Simulated remote calls and outcome policies
//! - [`store`] - Session context (user, history)
//! - [`contacts`] - Device address book behind a permission
//! - [`auth`] - Biometric / PIN authorization gate
//! - [`transfer`] - Transaction types, backend seam, flow controller, receipt
//! - [`config`] - YAML configuration
//! - [`logging`] - tracing setup

// Foundation
pub mod config;
pub mod logging;
pub mod models;
pub mod money;

// Data sources
pub mod fixtures;
pub mod remote;
pub mod store;

// Device capabilities
pub mod auth;
pub mod contacts;

// Transfer flow
pub mod transfer;

// Convenient re-exports at crate root
pub use auth::{AuthGate, AuthState, BiometricDevice, PinCode, SimulatedBiometrics};
pub use config::AppConfig;
pub use contacts::{ContactsProvider, DeviceContact, PermissionStatus, StaticContacts};
pub use models::{Recipient, User};
pub use money::{AmountInput, format_currency};
pub use store::SessionContext;
pub use transfer::{
    ConfirmOutcome, FlowSettings, Receipt, SimulatedTransferService, Step, TransactionStatus,
    Transaction, TransferBackend, TransferError, TransferFlow,
};
