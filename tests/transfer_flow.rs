use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;

use peer_transfer::auth::{AuthState, BiometricDevice, BiometricError, BiometricResult};
use peer_transfer::config::AppConfig;
use peer_transfer::contacts::{ContactsProvider, DeviceContact, PermissionStatus};
use peer_transfer::remote::{AlwaysFail, AlwaysSucceed, DelayRange, Scripted, SimulatedCall};
use peer_transfer::store::SessionContext;
use peer_transfer::transfer::{
    ConfirmOutcome, FlowSettings, SimulatedTransferService, Step, TransactionStatus,
    TransferError, TransferFlow,
};

/// Sensor that answers from a fixed script and counts prompts
struct CountingSensor {
    available: bool,
    matches: bool,
    prompts: AtomicUsize,
}

impl CountingSensor {
    fn new(available: bool, matches: bool) -> Self {
        Self {
            available,
            matches,
            prompts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BiometricDevice for CountingSensor {
    async fn has_hardware(&self) -> Result<bool, BiometricError> {
        Ok(self.available)
    }

    async fn is_enrolled(&self) -> Result<bool, BiometricError> {
        Ok(self.available)
    }

    async fn authenticate(&self, _prompt: &str) -> BiometricResult {
        self.prompts.fetch_add(1, Ordering::SeqCst);
        if self.matches {
            BiometricResult::Success
        } else {
            BiometricResult::Failed
        }
    }
}

/// Address book whose permission dialog is never answered
struct UnansweredContacts;

#[async_trait]
impl ContactsProvider for UnansweredContacts {
    async fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Undetermined
    }

    async fn list_contacts(&self) -> Result<Vec<DeviceContact>, TransferError> {
        panic!("contacts listed without permission");
    }
}

fn settings() -> FlowSettings {
    let config = AppConfig::load("test").unwrap();
    FlowSettings::from_config(&config.auth).unwrap()
}

fn flow_with(
    service: SimulatedTransferService,
    sensor: Arc<dyn BiometricDevice>,
) -> (TransferFlow, SessionContext) {
    let session = SessionContext::new();
    let flow = TransferFlow::new(
        Arc::new(service),
        sensor,
        Arc::new(UnansweredContacts),
        session.clone(),
        settings(),
    );
    (flow, session)
}

async fn walk_to_confirm(flow: &mut TransferFlow, digits: &str) {
    flow.load_user().await.unwrap();
    flow.enter_amount(digits).unwrap();
    flow.continue_to_recipients().unwrap();
    flow.load_recipients().await.unwrap();
    flow.select_recipient_by_id("rcp-001").unwrap();
}

#[test]
fn test_config_profile_loads() {
    let config = AppConfig::load("test").unwrap();
    assert_eq!(config.simulation.min_delay_ms, 0);
    assert_eq!(config.simulation.max_delay_ms, 0);
    assert!(config.auth.require_authentication);
}

#[tokio::test]
async fn test_simulated_backend_end_to_end() {
    let sensor = Arc::new(CountingSensor::new(true, true));
    let (mut flow, session) = flow_with(SimulatedTransferService::instant(), sensor.clone());

    assert_eq!(flow.step().name(), "ENTER_AMOUNT");
    walk_to_confirm(&mut flow, "150000").await;
    assert_eq!(flow.draft().amount, Decimal::new(150000, 2));

    let tx = match flow.confirm().await.unwrap() {
        ConfirmOutcome::Submitted(tx) => tx,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert_eq!(tx.status(), TransactionStatus::Completed);
    assert_eq!(sensor.prompts.load(Ordering::SeqCst), 1);
    assert_eq!(session.balance(), Some(Decimal::new(350000, 2)));

    let receipt = flow.receipt().unwrap();
    assert_eq!(receipt.amount, "RM1,500.00");
    assert_eq!(receipt.recipient_name, "Daniel Lim");
}

#[tokio::test]
async fn test_unsettled_transfer_keeps_balance() {
    let service = SimulatedTransferService::new(
        SimulatedCall::new(DelayRange::instant(), Arc::new(AlwaysSucceed)),
        Arc::new(AlwaysFail),
    );
    let (mut flow, session) = flow_with(service, Arc::new(CountingSensor::new(true, true)));
    walk_to_confirm(&mut flow, "20000").await;

    flow.confirm().await.unwrap();
    let history = session.transactions();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status(), TransactionStatus::Failed);
    assert_eq!(session.balance(), Some(Decimal::new(500000, 2)));
}

#[tokio::test]
async fn test_network_failure_on_submit_marks_failed() {
    // fetch user, fetch recipients, then the POST fails
    let service = SimulatedTransferService::new(
        SimulatedCall::new(
            DelayRange::instant(),
            Arc::new(Scripted::new([true, true, false], true)),
        ),
        Arc::new(AlwaysSucceed),
    );
    let (mut flow, session) = flow_with(service, Arc::new(CountingSensor::new(true, true)));
    walk_to_confirm(&mut flow, "20000").await;

    match flow.confirm().await.unwrap() {
        ConfirmOutcome::Submitted(tx) => assert_eq!(tx.status(), TransactionStatus::Failed),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(session.balance(), Some(Decimal::new(500000, 2)));
}

#[tokio::test]
async fn test_wrong_pin_never_submits() {
    let (mut flow, session) = flow_with(
        SimulatedTransferService::instant(),
        Arc::new(CountingSensor::new(false, false)),
    );
    walk_to_confirm(&mut flow, "20000").await;

    assert_eq!(
        flow.confirm().await.unwrap(),
        ConfirmOutcome::AwaitingAuth(AuthState::PinPrompted)
    );
    for _ in 0..3 {
        assert_eq!(
            flow.submit_pin("999999").await.unwrap(),
            ConfirmOutcome::PinMismatch
        );
    }
    assert_eq!(session.transaction_count(), 0);
    assert!(matches!(flow.step(), Step::Authenticating(_)));
}

#[tokio::test]
async fn test_unanswered_permission_is_denial() {
    let (mut flow, _session) = flow_with(
        SimulatedTransferService::instant(),
        Arc::new(CountingSensor::new(true, true)),
    );
    flow.load_user().await.unwrap();
    flow.enter_amount("100").unwrap();
    flow.continue_to_recipients().unwrap();

    assert_eq!(
        flow.open_contacts().await.unwrap_err(),
        TransferError::PermissionDenied
    );
    assert!(matches!(flow.step(), Step::SelectRecipient(_)));
}
