//! Authentication Gate
//!
//! Drives one authorization attempt for one submission. A new gate is built
//! every time the user presses confirm.

use std::fmt;

use tracing::{debug, info, warn};

use super::biometric::{self, BiometricDevice, BiometricResult};
use super::pin::{PinCode, PinEntry};
use crate::transfer::error::TransferError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthState {
    NotStarted,
    BiometricPrompted,
    /// Terminal: submission may proceed
    Authenticated,
    BiometricUnavailable,
    /// Prompt failed or errored; user may retry or switch to PIN
    BiometricFailed,
    PinPrompted,
    /// Terminal: user backed out, control returns to confirmation
    Rejected,
}

impl AuthState {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuthState::Authenticated | AuthState::Rejected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthState::NotStarted => "NOT_STARTED",
            AuthState::BiometricPrompted => "BIOMETRIC_PROMPTED",
            AuthState::Authenticated => "AUTHENTICATED",
            AuthState::BiometricUnavailable => "BIOMETRIC_UNAVAILABLE",
            AuthState::BiometricFailed => "BIOMETRIC_FAILED",
            AuthState::PinPrompted => "PIN_PROMPTED",
            AuthState::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of submitting the PIN entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOutcome {
    Accepted,
    /// Wrong code; the entry has been cleared
    Mismatch,
    /// Fewer than 6 digits; the entry is kept
    Incomplete,
}

pub struct AuthGate {
    state: AuthState,
    code: PinCode,
    prompt: String,
    entry: PinEntry,
    /// Every state visited, starting with NotStarted
    trail: Vec<AuthState>,
    failed_pin_attempts: u32,
}

impl AuthGate {
    pub fn new(code: PinCode, prompt: impl Into<String>) -> Self {
        Self {
            state: AuthState::NotStarted,
            code,
            prompt: prompt.into(),
            entry: PinEntry::default(),
            trail: vec![AuthState::NotStarted],
            failed_pin_attempts: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    pub fn trail(&self) -> &[AuthState] {
        &self.trail
    }

    pub fn pin_entry(&self) -> &PinEntry {
        &self.entry
    }

    pub fn failed_pin_attempts(&self) -> u32 {
        self.failed_pin_attempts
    }

    fn enter(&mut self, next: AuthState) {
        debug!(from = %self.state, to = %next, "Auth state change");
        self.state = next;
        self.trail.push(next);
    }

    fn require(&self, allowed: &[AuthState], action: &str) -> Result<(), TransferError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(TransferError::InvalidStateTransition(format!(
                "auth {} not allowed in {}",
                action, self.state
            )))
        }
    }

    /// Start with biometrics. An unavailable sensor falls through to the PIN
    /// prompt straight away.
    pub async fn begin(
        &mut self,
        device: &dyn BiometricDevice,
    ) -> Result<AuthState, TransferError> {
        self.require(&[AuthState::NotStarted], "begin")?;
        self.prompt_biometric(device).await
    }

    /// Prompt again after a failed attempt
    pub async fn retry_biometric(
        &mut self,
        device: &dyn BiometricDevice,
    ) -> Result<AuthState, TransferError> {
        self.require(&[AuthState::BiometricFailed], "retry")?;
        self.prompt_biometric(device).await
    }

    async fn prompt_biometric(
        &mut self,
        device: &dyn BiometricDevice,
    ) -> Result<AuthState, TransferError> {
        self.enter(AuthState::BiometricPrompted);

        if !biometric::is_available(device).await {
            info!("Biometrics unavailable, falling back to PIN");
            self.enter(AuthState::BiometricUnavailable);
            self.enter(AuthState::PinPrompted);
            return Ok(self.state);
        }

        match device.authenticate(&self.prompt).await {
            BiometricResult::Success => {
                info!("Biometric authentication succeeded");
                self.enter(AuthState::Authenticated);
            }
            BiometricResult::Failed => {
                warn!("Biometric authentication failed");
                self.enter(AuthState::BiometricFailed);
            }
            BiometricResult::Error(e) => {
                warn!(error = %e, "Biometric authentication error");
                self.enter(AuthState::BiometricFailed);
            }
        }
        Ok(self.state)
    }

    /// Switch to the PIN prompt
    pub fn use_pin(&mut self) -> Result<AuthState, TransferError> {
        self.require(
            &[AuthState::BiometricFailed, AuthState::BiometricUnavailable],
            "use_pin",
        )?;
        self.entry.clear();
        self.enter(AuthState::PinPrompted);
        Ok(self.state)
    }

    pub fn push_pin_digit(&mut self, c: char) -> Result<bool, TransferError> {
        self.require(&[AuthState::PinPrompted], "pin input")?;
        Ok(self.entry.push_digit(c))
    }

    pub fn pin_backspace(&mut self) -> Result<(), TransferError> {
        self.require(&[AuthState::PinPrompted], "pin input")?;
        self.entry.backspace();
        Ok(())
    }

    /// Replace the entry with `text` and submit it. Text that is not made
    /// of at most six digits is a mismatch without being compared.
    pub fn enter_pin(&mut self, text: &str) -> Result<PinOutcome, TransferError> {
        self.require(&[AuthState::PinPrompted], "pin input")?;
        if !self.entry.set(text) {
            return Ok(self.reject_pin());
        }
        self.submit_pin()
    }

    /// Check the current entry against the configured code
    pub fn submit_pin(&mut self) -> Result<PinOutcome, TransferError> {
        self.require(&[AuthState::PinPrompted], "submit_pin")?;

        if !self.entry.is_complete() {
            return Ok(PinOutcome::Incomplete);
        }

        if self.code.verify(self.entry.as_str()) {
            self.entry.clear();
            info!("PIN accepted");
            self.enter(AuthState::Authenticated);
            Ok(PinOutcome::Accepted)
        } else {
            Ok(self.reject_pin())
        }
    }

    fn reject_pin(&mut self) -> PinOutcome {
        self.entry.clear();
        self.failed_pin_attempts += 1;
        warn!(attempts = self.failed_pin_attempts, "Incorrect PIN");
        PinOutcome::Mismatch
    }

    /// Back out; allowed from any non-terminal state
    pub fn cancel(&mut self) -> Result<AuthState, TransferError> {
        if self.state.is_terminal() {
            return Err(TransferError::InvalidStateTransition(format!(
                "auth cancel not allowed in {}",
                self.state
            )));
        }
        self.entry.clear();
        self.enter(AuthState::Rejected);
        Ok(self.state)
    }
}

impl fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGate")
            .field("state", &self.state)
            .field("entered_digits", &self.entry.len())
            .field("failed_pin_attempts", &self.failed_pin_attempts)
            .finish()
    }
}
