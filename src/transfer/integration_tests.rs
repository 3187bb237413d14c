//! Integration Tests for the Transfer Flow
//!
//! Drive the full flow against `MockBackend`, simulated biometrics and a
//! static address book. No latency, no randomness.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::auth::{AuthState, BiometricDevice, InvalidPin, PinCode, SimulatedBiometrics};
use crate::config::AuthConfig;
use crate::contacts::{PermissionStatus, StaticContacts};
use crate::models::Recipient;
use crate::remote::{AlwaysFail, Scripted};
use crate::store::SessionContext;
use crate::transfer::error::TransferError;
use crate::transfer::flow::{ConfirmOutcome, FlowSettings, Step, TransferFlow};
use crate::transfer::service::MockBackend;
use crate::transfer::state::TransactionStatus;
use crate::transfer::types::ConfirmParams;

struct TestHarness {
    flow: TransferFlow,
    backend: Arc<MockBackend>,
    session: SessionContext,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_devices(
            Arc::new(SimulatedBiometrics::available()),
            PermissionStatus::Granted,
        )
    }

    fn with_devices(biometrics: Arc<dyn BiometricDevice>, permission: PermissionStatus) -> Self {
        let backend = Arc::new(MockBackend::from_fixtures());
        let session = SessionContext::new();
        let settings = FlowSettings {
            pin_code: PinCode::parse("123456").unwrap(),
            biometric_prompt: "Authenticate to confirm transfer".into(),
            require_authentication: true,
        };
        let flow = TransferFlow::new(
            backend.clone(),
            biometrics,
            Arc::new(StaticContacts::demo(permission).unwrap()),
            session.clone(),
            settings,
        );
        Self {
            flow,
            backend,
            session,
        }
    }

    /// Load the user and walk to CONFIRM with `cents` for `recipient_id`
    async fn to_confirm(&mut self, cents: &str, recipient_id: &str) {
        self.flow.load_user().await.unwrap();
        self.flow.enter_amount(cents).unwrap();
        self.flow.continue_to_recipients().unwrap();
        self.flow.load_recipients().await.unwrap();
        self.flow.select_recipient_by_id(recipient_id).unwrap();
    }
}

fn rm(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

// ========================================================================
// Happy Path
// ========================================================================

/// 5000.00 - 200.00 = 4800.00, one COMPLETED transaction in history
#[tokio::test]
async fn test_transfer_completes_and_deducts_balance() {
    let mut h = TestHarness::new();
    h.flow.load_user().await.unwrap();
    assert_eq!(h.session.balance(), Some(rm(500000)));

    assert_eq!(h.flow.enter_amount("20000").unwrap(), "RM200.00");
    h.flow.set_note("Dinner").unwrap();
    let params = h.flow.continue_to_recipients().unwrap();
    assert_eq!(params.amount, rm(20000));
    assert_eq!(params.note.as_deref(), Some("Dinner"));

    h.flow.load_recipients().await.unwrap();
    let confirm = h.flow.select_recipient_by_id("rcp-001").unwrap();
    assert_eq!(confirm.recipient.name, "Daniel Lim");
    assert_eq!(h.flow.balance_after_transfer(), Some(rm(480000)));

    let outcome = h.flow.confirm().await.unwrap();
    let tx = match outcome {
        ConfirmOutcome::Submitted(tx) => tx,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert_eq!(tx.status(), TransactionStatus::Completed);
    assert!(tx.id.as_str().starts_with("TXN"));

    assert_eq!(h.session.balance(), Some(rm(480000)));
    assert_eq!(h.session.transaction_count(), 1);
    assert_eq!(h.backend.submit_calls(), 1);

    let receipt = h.flow.receipt().unwrap();
    assert_eq!(receipt.headline, "Transfer Successful!");
    assert_eq!(receipt.amount, "RM200.00");
    assert_eq!(receipt.note.as_deref(), Some("Dinner"));

    // Draft discarded
    h.flow.finish().unwrap();
    assert_eq!(h.flow.step(), &Step::EnterAmount);
    assert_eq!(h.flow.amount_display(), "");
    assert!(h.flow.draft().note.is_none());
}

/// Second transfer sees the post-transfer balance, not the fixture
#[tokio::test]
async fn test_consecutive_transfers_share_session() {
    let mut h = TestHarness::new();
    h.to_confirm("20000", "rcp-001").await;
    h.flow.confirm().await.unwrap();
    h.flow.finish().unwrap();

    h.to_confirm("480000", "rcp-002").await;
    h.flow.confirm().await.unwrap();

    assert_eq!(h.session.balance(), Some(Decimal::ZERO));
    let history = h.session.transactions();
    assert_eq!(history.len(), 2);
    assert_ne!(history[0].id, history[1].id);
}

// ========================================================================
// Funds & Validation
// ========================================================================

#[tokio::test]
async fn test_insufficient_funds_blocked_at_amount_step() {
    let mut h = TestHarness::new();
    h.flow.load_user().await.unwrap();

    // Accepted into the field but flagged
    assert_eq!(h.flow.enter_amount("600000").unwrap(), "RM6000.00");
    assert_eq!(h.flow.amount_error(), Some("Insufficient funds"));
    assert!(!h.flow.can_continue());

    assert_eq!(
        h.flow.continue_to_recipients().unwrap_err(),
        TransferError::InsufficientFunds
    );
    assert_eq!(h.flow.step(), &Step::EnterAmount);
    assert_eq!(h.backend.submit_calls(), 0);
}

/// Balance drops between selection and confirm; the backend is never called
#[tokio::test]
async fn test_insufficient_funds_rechecked_at_confirm() {
    let mut h = TestHarness::new();
    h.to_confirm("20000", "rcp-001").await;

    h.session.update_balance(rm(10000));
    assert_eq!(h.flow.confirm().await.unwrap_err(), TransferError::InsufficientFunds);
    assert_eq!(h.backend.submit_calls(), 0);
    assert!(matches!(h.flow.step(), Step::Confirm(_)));
    assert_eq!(h.session.transaction_count(), 0);
}

#[tokio::test]
async fn test_amount_over_cap_keeps_previous_value() {
    let mut h = TestHarness::new();
    h.flow.load_user().await.unwrap();
    h.flow.enter_amount("12345").unwrap();
    assert_eq!(
        h.flow.enter_amount("100000000").unwrap_err(),
        TransferError::AmountTooLarge
    );
    assert_eq!(h.flow.amount_display(), "RM123.45");
}

#[tokio::test]
async fn test_zero_amount_cannot_continue() {
    let mut h = TestHarness::new();
    h.flow.load_user().await.unwrap();
    assert_eq!(
        h.flow.continue_to_recipients().unwrap_err(),
        TransferError::InvalidAmount
    );
}

#[tokio::test]
async fn test_user_fetch_failure_sets_session_error() {
    let mut h = TestHarness::new();
    h.backend.set_fail_fetch(true);
    assert!(h.flow.load_user().await.is_err());
    assert!(h.session.error().is_some());
    assert!(!h.session.is_loading());

    // Retry
    h.backend.set_fail_fetch(false);
    h.flow.load_user().await.unwrap();
    assert!(h.session.error().is_none());
    assert_eq!(h.backend.user_calls(), 2);
}

// ========================================================================
// Failure Outcomes
// ========================================================================

#[tokio::test]
async fn test_failed_settlement_leaves_balance() {
    let mut h = TestHarness::new();
    h.backend.set_settle_as(TransactionStatus::Failed);
    h.to_confirm("20000", "rcp-001").await;

    match h.flow.confirm().await.unwrap() {
        ConfirmOutcome::Submitted(tx) => assert_eq!(tx.status(), TransactionStatus::Failed),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(h.session.balance(), Some(rm(500000)));
    assert_eq!(h.session.transaction_count(), 1);
    assert_eq!(h.flow.receipt().unwrap().headline, "Transfer Failed");
}

#[tokio::test]
async fn test_submission_error_records_failed() {
    let mut h = TestHarness::new();
    h.backend.set_fail_submit(true);
    h.to_confirm("20000", "rcp-001").await;

    match h.flow.confirm().await.unwrap() {
        ConfirmOutcome::Submitted(tx) => assert_eq!(tx.status(), TransactionStatus::Failed),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(h.session.balance(), Some(rm(500000)));
    assert_eq!(h.session.transactions()[0].status(), TransactionStatus::Failed);
}

/// A backend answering with the transaction still PENDING does not leave it
/// pending
#[tokio::test]
async fn test_backend_left_pending_records_failed() {
    let mut h = TestHarness::new();
    h.backend.set_leave_pending(true);
    h.to_confirm("20000", "rcp-001").await;

    match h.flow.confirm().await.unwrap() {
        ConfirmOutcome::Submitted(tx) => assert_eq!(tx.status(), TransactionStatus::Failed),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(h.backend.submit_calls(), 1);
    assert_eq!(h.session.balance(), Some(rm(500000)));
    assert_eq!(h.session.transaction_count(), 1);
    assert_eq!(h.session.transactions()[0].status(), TransactionStatus::Failed);

    let receipt = h.flow.receipt().unwrap();
    assert_eq!(receipt.status, TransactionStatus::Failed);
    assert_eq!(receipt.headline, "Transfer Failed");
}

// ========================================================================
// Authentication
// ========================================================================

#[test]
fn test_flow_settings_reject_bad_pin() {
    let mut config = AuthConfig::default();
    assert!(FlowSettings::from_config(&config).is_ok());

    config.pin_code = "12345".into();
    assert_eq!(FlowSettings::from_config(&config).unwrap_err(), InvalidPin);
}

/// Longer text starting with the right code, or the code with separators,
/// is not the code
#[tokio::test]
async fn test_malformed_pin_text_does_not_submit() {
    let mut h = TestHarness::with_devices(
        Arc::new(SimulatedBiometrics::unavailable()),
        PermissionStatus::Granted,
    );
    h.to_confirm("20000", "rcp-001").await;
    h.flow.confirm().await.unwrap();

    for text in ["1234569", "12345678", "12-34 56"] {
        assert_eq!(
            h.flow.submit_pin(text).await.unwrap(),
            ConfirmOutcome::PinMismatch,
            "{text}"
        );
    }
    assert_eq!(h.backend.submit_calls(), 0);
    assert_eq!(h.session.balance(), Some(rm(500000)));
    assert_eq!(h.flow.auth_state(), Some(AuthState::PinPrompted));
}

#[tokio::test]
async fn test_pin_fallback_when_biometrics_unavailable() {
    let mut h = TestHarness::with_devices(
        Arc::new(SimulatedBiometrics::unavailable()),
        PermissionStatus::Granted,
    );
    h.to_confirm("20000", "rcp-001").await;

    assert_eq!(
        h.flow.confirm().await.unwrap(),
        ConfirmOutcome::AwaitingAuth(AuthState::PinPrompted)
    );
    assert!(matches!(h.flow.step(), Step::Authenticating(_)));
    assert_eq!(h.backend.submit_calls(), 0);

    assert_eq!(h.flow.submit_pin("000000").await.unwrap(), ConfirmOutcome::PinMismatch);
    assert_eq!(h.flow.submit_pin("123").await.unwrap(), ConfirmOutcome::PinIncomplete);
    assert_eq!(h.backend.submit_calls(), 0);

    assert!(matches!(
        h.flow.submit_pin("123456").await.unwrap(),
        ConfirmOutcome::Submitted(_)
    ));
    assert_eq!(h.session.balance(), Some(rm(480000)));
}

#[tokio::test]
async fn test_failed_biometric_retry_and_pin_switch() {
    let sensor = Arc::new(SimulatedBiometrics::new(
        true,
        true,
        Arc::new(Scripted::new([false, false], true)),
    ));
    let mut h = TestHarness::with_devices(sensor, PermissionStatus::Granted);
    h.to_confirm("20000", "rcp-001").await;

    assert_eq!(
        h.flow.confirm().await.unwrap(),
        ConfirmOutcome::AwaitingAuth(AuthState::BiometricFailed)
    );
    assert_eq!(
        h.flow.retry_biometric().await.unwrap(),
        ConfirmOutcome::AwaitingAuth(AuthState::BiometricFailed)
    );

    assert_eq!(h.flow.use_pin().unwrap(), AuthState::PinPrompted);
    for c in "123456".chars() {
        assert!(h.flow.enter_pin_digit(c).unwrap());
    }
    assert!(matches!(
        h.flow.submit_pin("123456").await.unwrap(),
        ConfirmOutcome::Submitted(_)
    ));
    assert_eq!(h.backend.submit_calls(), 1);
}

#[tokio::test]
async fn test_cancel_authentication_returns_to_confirm() {
    let mut h = TestHarness::with_devices(
        Arc::new(SimulatedBiometrics::new(true, true, Arc::new(AlwaysFail))),
        PermissionStatus::Granted,
    );
    h.to_confirm("20000", "rcp-001").await;
    h.flow.confirm().await.unwrap();

    h.flow.cancel_authentication().unwrap();
    assert!(matches!(h.flow.step(), Step::Confirm(_)));
    assert!(h.flow.auth_state().is_none());
    assert_eq!(h.backend.submit_calls(), 0);
    assert_eq!(h.session.balance(), Some(rm(500000)));

    // Back from AUTHENTICATING behaves the same
    h.flow.confirm().await.unwrap();
    h.flow.back().unwrap();
    assert!(matches!(h.flow.step(), Step::Confirm(_)));
}

// ========================================================================
// Contacts & Navigation
// ========================================================================

#[tokio::test]
async fn test_contacts_granted_lists_sorted_contacts() {
    let mut h = TestHarness::new();
    h.flow.load_user().await.unwrap();
    h.flow.enter_amount("5000").unwrap();
    h.flow.continue_to_recipients().unwrap();

    let names: Vec<String> = h
        .flow
        .open_contacts()
        .await
        .unwrap()
        .iter()
        .map(|r| r.name.clone())
        .collect();
    assert_eq!(names, vec!["Amir Hakim", "Chen Wei", "Zainal Abidin"]);
    assert!(matches!(h.flow.step(), Step::Contacts(_)));

    assert_eq!(h.flow.search("chen").len(), 1);
    let confirm = h.flow.select_recipient_by_id("ct-101").unwrap();
    assert_eq!(confirm.recipient.phone_number.as_deref(), Some("+60 19-555 6677"));
    assert_eq!(confirm.amount, rm(5000));
}

#[tokio::test]
async fn test_contacts_denied_keeps_fixture_list() {
    let mut h = TestHarness::with_devices(
        Arc::new(SimulatedBiometrics::available()),
        PermissionStatus::Denied,
    );
    h.flow.load_user().await.unwrap();
    h.flow.enter_amount("5000").unwrap();
    h.flow.continue_to_recipients().unwrap();
    h.flow.load_recipients().await.unwrap();
    let before = h.flow.recipients().to_vec();

    assert_eq!(
        h.flow.open_contacts().await.unwrap_err(),
        TransferError::PermissionDenied
    );
    assert!(matches!(h.flow.step(), Step::SelectRecipient(_)));
    assert_eq!(h.flow.contacts_permission(), Some(PermissionStatus::Denied));
    assert_eq!(h.flow.recipients(), before.as_slice());
    assert!(h.flow.contact_recipients().is_empty());
}

#[tokio::test]
async fn test_open_confirm_validates_payload() {
    let mut h = TestHarness::new();
    let recipient = Recipient::new("rcp-004", "Siti Aminah");
    let payload = |amount| ConfirmParams {
        recipient: recipient.clone(),
        amount,
        note: None,
    };

    // No user yet
    assert_eq!(
        h.flow.open_confirm(payload(rm(2500))).unwrap_err(),
        TransferError::UserNotLoaded
    );
    h.flow.load_user().await.unwrap();

    for bad in [Decimal::new(12345, 3), rm(-100), Decimal::ZERO] {
        assert_eq!(
            h.flow.open_confirm(payload(bad)).unwrap_err(),
            TransferError::InvalidAmount
        );
    }
    assert_eq!(
        h.flow.open_confirm(payload(rm(100_000_000))).unwrap_err(),
        TransferError::AmountTooLarge
    );
    assert_eq!(h.flow.step(), &Step::EnterAmount);

    h.flow.open_confirm(payload(rm(2500))).unwrap();
    assert_eq!(h.flow.balance_after_transfer(), Some(rm(497500)));
    assert!(matches!(h.flow.confirm().await.unwrap(), ConfirmOutcome::Submitted(_)));

    h.flow.finish().unwrap();
    h.flow.open_confirm(payload(rm(2500))).unwrap();
    h.flow.back().unwrap();
    assert_eq!(h.flow.step(), &Step::EnterAmount);
}

#[tokio::test]
async fn test_back_keeps_draft() {
    let mut h = TestHarness::new();
    h.to_confirm("20000", "rcp-003").await;

    let step = h.flow.back().unwrap().clone();
    match step {
        Step::SelectRecipient(params) => assert_eq!(params.amount, rm(20000)),
        other => panic!("unexpected step: {}", other),
    }
    h.flow.back().unwrap();
    assert_eq!(h.flow.step(), &Step::EnterAmount);
    assert_eq!(h.flow.amount_display(), "RM200.00");

    // Nothing before the first step
    assert!(matches!(
        h.flow.back().unwrap_err(),
        TransferError::InvalidStep(_)
    ));
}

#[tokio::test]
async fn test_steps_reject_out_of_order_actions() {
    let mut h = TestHarness::new();
    h.flow.load_user().await.unwrap();
    assert!(matches!(h.flow.confirm().await, Err(TransferError::InvalidStep(_))));
    assert!(matches!(h.flow.finish(), Err(TransferError::InvalidStep(_))));
    assert!(matches!(
        h.flow.load_recipients().await,
        Err(TransferError::InvalidStep(_))
    ));

    h.flow.enter_amount("100").unwrap();
    h.flow.continue_to_recipients().unwrap();
    assert!(matches!(
        h.flow.enter_amount("200"),
        Err(TransferError::InvalidStep(_))
    ));
    assert_eq!(
        h.flow.select_recipient_by_id("nobody").unwrap_err(),
        TransferError::MissingRecipient
    );
}
