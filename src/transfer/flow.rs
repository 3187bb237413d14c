//! Transfer Flow Controller
//!
//! Walks the user through one transfer and carries the draft between steps.
//!
//! ```text
//! ENTER_AMOUNT ─▶ SELECT_RECIPIENT ─────────────▶ CONFIRM ─▶ [AUTHENTICATING] ─▶ RECEIPT
//!                       │                            ▲              │
//!                       └─▶ CONTACTS ────────────────┘              └─ cancel ─▶ CONFIRM
//! ```
//!
//! Every step operation takes `&mut self`, so one flow never has two
//! submissions in flight. Nothing survives the process; abandoning the flow
//! loses the draft.

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::error::TransferError;
use super::receipt::Receipt;
use super::service::TransferBackend;
use super::state::TransactionStatus;
use super::types::{
    AmountParams, ConfirmParams, ReceiptParams, Transaction, TransferDraft, normalize_note,
};
use crate::auth::{AuthGate, AuthState, BiometricDevice, InvalidPin, PinCode, PinOutcome};
use crate::config::AuthConfig;
use crate::contacts::{self, ContactsProvider, PermissionStatus};
use crate::models::{Recipient, User};
use crate::money::{AmountInput, validate_transfer_amount};
use crate::store::SessionContext;

// ============================================================================
// Steps
// ============================================================================

/// Current screen plus the payload it was entered with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    EnterAmount,
    SelectRecipient(AmountParams),
    Contacts(AmountParams),
    Confirm(ConfirmParams),
    Authenticating(ConfirmParams),
    Receipt(ReceiptParams),
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::EnterAmount => "ENTER_AMOUNT",
            Step::SelectRecipient(_) => "SELECT_RECIPIENT",
            Step::Contacts(_) => "CONTACTS",
            Step::Confirm(_) => "CONFIRM",
            Step::Authenticating(_) => "AUTHENTICATING",
            Step::Receipt(_) => "RECEIPT",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What pressing confirm (or answering an auth prompt) led to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Submitted; the flow is now on the receipt
    Submitted(Transaction),
    /// Waiting on the user at this auth state
    AwaitingAuth(AuthState),
    /// Wrong PIN, entry cleared
    PinMismatch,
    /// Fewer than 6 digits entered
    PinIncomplete,
}

/// Authorization settings for the flow
#[derive(Debug, Clone)]
pub struct FlowSettings {
    pub pin_code: PinCode,
    pub biometric_prompt: String,
    pub require_authentication: bool,
}

impl FlowSettings {
    pub fn from_config(config: &AuthConfig) -> Result<Self, InvalidPin> {
        Ok(Self {
            pin_code: PinCode::parse(&config.pin_code)?,
            biometric_prompt: config.biometric_prompt.clone(),
            require_authentication: config.require_authentication,
        })
    }
}

// ============================================================================
// Controller
// ============================================================================

pub struct TransferFlow {
    backend: Arc<dyn TransferBackend>,
    biometrics: Arc<dyn BiometricDevice>,
    contacts: Arc<dyn ContactsProvider>,
    session: SessionContext,
    settings: FlowSettings,

    step: Step,
    /// Steps to return to on `back()`
    back_stack: Vec<Step>,

    amount: AmountInput,
    amount_error: Option<String>,
    note: String,

    recipients: Vec<Recipient>,
    recipients_error: Option<String>,
    contact_recipients: Vec<Recipient>,
    contacts_permission: Option<PermissionStatus>,

    auth: Option<AuthGate>,
}

impl TransferFlow {
    pub fn new(
        backend: Arc<dyn TransferBackend>,
        biometrics: Arc<dyn BiometricDevice>,
        contacts: Arc<dyn ContactsProvider>,
        session: SessionContext,
        settings: FlowSettings,
    ) -> Self {
        Self {
            backend,
            biometrics,
            contacts,
            session,
            settings,
            step: Step::EnterAmount,
            back_stack: Vec::new(),
            amount: AmountInput::default(),
            amount_error: None,
            note: String::new(),
            recipients: Vec::new(),
            recipients_error: None,
            contact_recipients: Vec::new(),
            contacts_permission: None,
            auth: None,
        }
    }

    // ============================================================
    // READ-ONLY VIEW
    // ============================================================

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn amount_display(&self) -> String {
        self.amount.display()
    }

    pub fn amount_error(&self) -> Option<&str> {
        self.amount_error.as_deref()
    }

    /// Continue is enabled for a non-zero amount with no pending error
    pub fn can_continue(&self) -> bool {
        !self.amount.is_zero() && self.amount_error.is_none()
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    pub fn recipients_error(&self) -> Option<&str> {
        self.recipients_error.as_deref()
    }

    pub fn contact_recipients(&self) -> &[Recipient] {
        &self.contact_recipients
    }

    pub fn contacts_permission(&self) -> Option<PermissionStatus> {
        self.contacts_permission
    }

    pub fn auth_state(&self) -> Option<AuthState> {
        self.auth.as_ref().map(AuthGate::state)
    }

    /// The draft as the current step sees it
    pub fn draft(&self) -> TransferDraft {
        match &self.step {
            Step::EnterAmount => TransferDraft {
                amount: self.amount.value(),
                note: normalize_note(Some(self.note.clone())),
                recipient: None,
            },
            Step::SelectRecipient(p) | Step::Contacts(p) => TransferDraft::from(p.clone()),
            Step::Confirm(p) | Step::Authenticating(p) => TransferDraft::from(p.clone()),
            Step::Receipt(_) => TransferDraft::default(),
        }
    }

    /// Balance preview on the confirm step
    pub fn balance_after_transfer(&self) -> Option<Decimal> {
        match &self.step {
            Step::Confirm(p) | Step::Authenticating(p) => {
                self.session.balance().map(|b| b - p.amount)
            }
            _ => None,
        }
    }

    pub fn receipt(&self) -> Option<Receipt> {
        match &self.step {
            Step::Receipt(p) => Some(Receipt::from(&p.transaction)),
            _ => None,
        }
    }

    // ============================================================
    // NAVIGATION
    // ============================================================

    fn wrong_step(&self, action: &str) -> TransferError {
        TransferError::InvalidStep(format!("{} in {}", action, self.step))
    }

    fn advance(&mut self, next: Step) {
        debug!(from = %self.step, to = %next, "Flow step");
        let prev = std::mem::replace(&mut self.step, next);
        self.back_stack.push(prev);
    }

    /// Return to the previous step without re-validating it.
    ///
    /// Leaving AUTHENTICATING cancels the attempt; leaving RECEIPT is the
    /// same as `finish()`.
    pub fn back(&mut self) -> Result<&Step, TransferError> {
        if matches!(self.step, Step::Authenticating(_)) {
            self.cancel_authentication()?;
            return Ok(&self.step);
        }
        if matches!(self.step, Step::Receipt(_)) {
            self.finish()?;
            return Ok(&self.step);
        }

        let prev = self
            .back_stack
            .pop()
            .ok_or_else(|| self.wrong_step("back"))?;
        debug!(from = %self.step, to = %prev, "Flow back");
        self.step = prev;
        Ok(&self.step)
    }

    // ============================================================
    // STEP 1: AMOUNT
    // ============================================================

    /// Fetch the account holder into the session. On failure the session
    /// error is set; calling again is the retry.
    pub async fn load_user(&mut self) -> Result<User, TransferError> {
        self.session.set_loading(true);
        let result = self.backend.get_current_user(&self.session).await;
        match &result {
            Ok(user) => {
                info!(user = %user.id, balance = %user.balance, "User loaded");
                self.session.set_user(user.clone());
            }
            Err(e) => {
                warn!(error = %e, "Failed to load user data");
                self.session.set_error(e.user_message());
            }
        }
        self.session.set_loading(false);
        result
    }

    /// Feed the amount field's text. Returns the text the field now shows.
    ///
    /// An over-cap entry is rejected and the previous amount stays. An
    /// amount above the balance is accepted but flagged.
    pub fn enter_amount(&mut self, text: &str) -> Result<String, TransferError> {
        if self.step != Step::EnterAmount {
            return Err(self.wrong_step("enter_amount"));
        }

        match self.amount.apply(text) {
            Ok(value) => {
                self.amount_error = match self.session.balance() {
                    Some(balance) if value > balance => {
                        Some(TransferError::InsufficientFunds.user_message())
                    }
                    _ => None,
                };
                Ok(self.amount.display())
            }
            Err(e) => {
                let err = TransferError::from(e);
                self.amount_error = Some(err.user_message());
                Err(err)
            }
        }
    }

    pub fn set_note(&mut self, text: &str) -> Result<(), TransferError> {
        if self.step != Step::EnterAmount {
            return Err(self.wrong_step("set_note"));
        }
        self.note = text.to_string();
        Ok(())
    }

    /// Validate the amount against the balance and move on to recipients
    pub fn continue_to_recipients(&mut self) -> Result<AmountParams, TransferError> {
        if self.step != Step::EnterAmount {
            return Err(self.wrong_step("continue"));
        }

        let amount = self.amount.value();
        if amount.is_zero() {
            self.amount_error = Some(TransferError::InvalidAmount.user_message());
            return Err(TransferError::InvalidAmount);
        }

        let user = self.session.user().ok_or(TransferError::UserNotLoaded)?;
        if !user.can_afford(amount) {
            self.amount_error = Some(TransferError::InsufficientFunds.user_message());
            return Err(TransferError::InsufficientFunds);
        }

        self.amount_error = None;
        let params = self.draft().amount_params();
        self.advance(Step::SelectRecipient(params.clone()));
        Ok(params)
    }

    // ============================================================
    // STEP 2: RECIPIENT
    // ============================================================

    pub async fn load_recipients(&mut self) -> Result<&[Recipient], TransferError> {
        if !matches!(self.step, Step::SelectRecipient(_)) {
            return Err(self.wrong_step("load_recipients"));
        }

        self.recipients_error = None;
        match self.backend.get_recipients().await {
            Ok(list) => {
                debug!(count = list.len(), "Recipients loaded");
                self.recipients = list;
                Ok(&self.recipients)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load recipients");
                self.recipients_error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Switch to the device address book.
    ///
    /// A refused permission ends this path: the flow returns to the fixture
    /// list, which is left exactly as it was.
    pub async fn open_contacts(&mut self) -> Result<&[Recipient], TransferError> {
        let params = match &self.step {
            Step::SelectRecipient(p) => p.clone(),
            _ => return Err(self.wrong_step("open_contacts")),
        };
        self.advance(Step::Contacts(params));

        match contacts::load_contact_recipients(self.contacts.as_ref()).await {
            Ok(list) => {
                self.contacts_permission = Some(PermissionStatus::Granted);
                self.contact_recipients = list;
                Ok(&self.contact_recipients)
            }
            Err(e) => {
                if e == TransferError::PermissionDenied {
                    self.contacts_permission = Some(PermissionStatus::Denied);
                }
                self.contact_recipients.clear();
                if let Some(prev) = self.back_stack.pop() {
                    self.step = prev;
                }
                Err(e)
            }
        }
    }

    /// Filter the list shown on the current step
    pub fn search(&self, query: &str) -> Vec<&Recipient> {
        match &self.step {
            Step::Contacts(_) => contacts::filter_recipients(&self.contact_recipients, query),
            _ => contacts::filter_recipients(&self.recipients, query),
        }
    }

    pub fn select_recipient(
        &mut self,
        recipient: Recipient,
    ) -> Result<ConfirmParams, TransferError> {
        let params = match &self.step {
            Step::SelectRecipient(p) | Step::Contacts(p) => p.clone(),
            _ => return Err(self.wrong_step("select_recipient")),
        };

        info!(recipient = %recipient.id, amount = %params.amount, "Recipient selected");
        let confirm = TransferDraft {
            recipient: Some(recipient),
            ..TransferDraft::from(params)
        }
        .confirm_params()?;
        self.advance(Step::Confirm(confirm.clone()));
        Ok(confirm)
    }

    /// Select from the list shown on the current step
    pub fn select_recipient_by_id(&mut self, id: &str) -> Result<ConfirmParams, TransferError> {
        let list = match &self.step {
            Step::Contacts(_) => &self.contact_recipients,
            _ => &self.recipients,
        };
        let recipient = list
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(TransferError::MissingRecipient)?;
        self.select_recipient(recipient)
    }

    // ============================================================
    // STEP 3: CONFIRM + AUTH
    // ============================================================

    /// Jump straight to CONFIRM with a payload from outside the flow, e.g. a
    /// deserialized deep link. The amount is validated like a typed one.
    pub fn open_confirm(&mut self, params: ConfirmParams) -> Result<(), TransferError> {
        if self.step != Step::EnterAmount {
            return Err(self.wrong_step("open_confirm"));
        }
        validate_transfer_amount(params.amount)?;
        if self.session.user().is_none() {
            return Err(TransferError::UserNotLoaded);
        }

        info!(recipient = %params.recipient.id, amount = %params.amount, "Confirm opened");
        self.advance(Step::Confirm(params));
        Ok(())
    }

    /// Press confirm: re-check funds, authorize, submit.
    pub async fn confirm(&mut self) -> Result<ConfirmOutcome, TransferError> {
        let params = match &self.step {
            Step::Confirm(p) => p.clone(),
            _ => return Err(self.wrong_step("confirm")),
        };

        // Insufficient funds never reaches the backend
        let balance = self.session.balance().ok_or(TransferError::UserNotLoaded)?;
        if params.amount > balance {
            warn!(amount = %params.amount, balance = %balance, "Insufficient funds at confirm");
            return Err(TransferError::InsufficientFunds);
        }

        if !self.settings.require_authentication {
            return self.submit(params).await.map(ConfirmOutcome::Submitted);
        }

        let mut gate = AuthGate::new(
            self.settings.pin_code.clone(),
            self.settings.biometric_prompt.clone(),
        );
        let state = gate.begin(self.biometrics.as_ref()).await?;
        self.after_auth(gate, state, params).await
    }

    async fn after_auth(
        &mut self,
        gate: AuthGate,
        state: AuthState,
        params: ConfirmParams,
    ) -> Result<ConfirmOutcome, TransferError> {
        if state == AuthState::Authenticated {
            info!(trail = ?gate.trail(), "Transfer authorized");
            self.auth = None;
            return self.submit(params).await.map(ConfirmOutcome::Submitted);
        }
        self.auth = Some(gate);
        self.step = Step::Authenticating(params);
        Ok(ConfirmOutcome::AwaitingAuth(state))
    }

    fn take_auth(&mut self, action: &str) -> Result<(AuthGate, ConfirmParams), TransferError> {
        let params = match &self.step {
            Step::Authenticating(p) => p.clone(),
            _ => return Err(self.wrong_step(action)),
        };
        let gate = self.auth.take().ok_or_else(|| self.wrong_step(action))?;
        Ok((gate, params))
    }

    pub async fn retry_biometric(&mut self) -> Result<ConfirmOutcome, TransferError> {
        let (mut gate, params) = self.take_auth("retry_biometric")?;
        let state = match gate.retry_biometric(self.biometrics.as_ref()).await {
            Ok(state) => state,
            Err(e) => {
                self.auth = Some(gate);
                return Err(e);
            }
        };
        self.after_auth(gate, state, params).await
    }

    pub fn use_pin(&mut self) -> Result<AuthState, TransferError> {
        if !matches!(self.step, Step::Authenticating(_)) {
            return Err(self.wrong_step("use_pin"));
        }
        let gate = self.auth.as_mut().ok_or(TransferError::AuthenticationUnavailable)?;
        gate.use_pin()
    }

    pub fn enter_pin_digit(&mut self, c: char) -> Result<bool, TransferError> {
        if !matches!(self.step, Step::Authenticating(_)) {
            return Err(self.wrong_step("enter_pin_digit"));
        }
        let gate = self.auth.as_mut().ok_or(TransferError::AuthenticationUnavailable)?;
        gate.push_pin_digit(c)
    }

    /// Submit a PIN. The right code goes straight into submission.
    pub async fn submit_pin(&mut self, text: &str) -> Result<ConfirmOutcome, TransferError> {
        let (mut gate, params) = self.take_auth("submit_pin")?;
        let outcome = match gate.enter_pin(text) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.auth = Some(gate);
                return Err(e);
            }
        };
        match outcome {
            PinOutcome::Accepted => self.after_auth(gate, AuthState::Authenticated, params).await,
            PinOutcome::Mismatch => {
                self.auth = Some(gate);
                Ok(ConfirmOutcome::PinMismatch)
            }
            PinOutcome::Incomplete => {
                self.auth = Some(gate);
                Ok(ConfirmOutcome::PinIncomplete)
            }
        }
    }

    /// Abandon authorization and return to the confirm step
    pub fn cancel_authentication(&mut self) -> Result<&Step, TransferError> {
        let (mut gate, params) = self.take_auth("cancel_authentication")?;
        gate.cancel()?;
        info!("Authentication cancelled");
        self.step = Step::Confirm(params);
        Ok(&self.step)
    }

    // ============================================================
    // STEP 4: SUBMIT + RECEIPT
    // ============================================================

    async fn submit(&mut self, params: ConfirmParams) -> Result<Transaction, TransferError> {
        let pending = TransferDraft::from(params).into_transaction()?;
        info!(id = %pending.id, amount = %pending.amount, "Submitting transfer");

        let result = self.backend.process_transfer(pending.clone()).await;

        let transaction = match result {
            Ok(tx) if tx.status().is_terminal() => tx,
            Ok(tx) => {
                warn!(id = %tx.id, "Backend left transaction pending, marking failed");
                pending.resolved(TransactionStatus::Failed)?
            }
            Err(e) => {
                warn!(error = %e, "Transfer submission failed");
                pending.resolved(TransactionStatus::Failed)?
            }
        };

        self.session.add_transaction(transaction.clone());
        if transaction.is_completed() {
            let balance = self.session.balance().ok_or(TransferError::UserNotLoaded)?;
            self.session.update_balance(balance - transaction.amount);
        }

        info!(
            id = %transaction.id,
            status = %transaction.status(),
            balance = ?self.session.balance(),
            "Transfer finished"
        );

        // Draft is spent
        self.amount.clear();
        self.amount_error = None;
        self.note.clear();
        self.contact_recipients.clear();
        self.back_stack.clear();
        self.step = Step::Receipt(ReceiptParams {
            transaction: transaction.clone(),
        });
        Ok(transaction)
    }

    /// Leave the receipt and start over
    pub fn finish(&mut self) -> Result<(), TransferError> {
        if !matches!(self.step, Step::Receipt(_)) {
            return Err(self.wrong_step("finish"));
        }
        self.back_stack.clear();
        self.auth = None;
        self.step = Step::EnterAmount;
        Ok(())
    }
}

impl fmt::Debug for TransferFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferFlow")
            .field("backend", &self.backend.name())
            .field("step", &self.step.name())
            .field("depth", &self.back_stack.len())
            .field("auth", &self.auth_state())
            .finish()
    }
}
