//! Biometric device seam

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::remote::{AlwaysSucceed, OutcomePolicy};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Biometric device error: {0}")]
pub struct BiometricError(pub String);

/// Result of one biometric prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BiometricResult {
    Success,
    /// User did not match or dismissed the prompt
    Failed,
    /// Sensor or OS error while prompting
    Error(String),
}

/// Device sensor capability
#[async_trait]
pub trait BiometricDevice: Send + Sync {
    async fn has_hardware(&self) -> Result<bool, BiometricError>;

    async fn is_enrolled(&self) -> Result<bool, BiometricError>;

    async fn authenticate(&self, prompt: &str) -> BiometricResult;
}

/// Hardware present and enrolled. A failing check counts as unavailable.
pub async fn is_available(device: &dyn BiometricDevice) -> bool {
    let hardware = match device.has_hardware().await {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Biometric hardware check failed");
            return false;
        }
    };
    if !hardware {
        return false;
    }
    match device.is_enrolled().await {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Biometric enrollment check failed");
            false
        }
    }
}

/// Stand-in sensor for the demo; prompt results come from an outcome policy
pub struct SimulatedBiometrics {
    hardware: bool,
    enrolled: bool,
    outcome: Arc<dyn OutcomePolicy>,
}

impl SimulatedBiometrics {
    pub fn new(hardware: bool, enrolled: bool, outcome: Arc<dyn OutcomePolicy>) -> Self {
        Self {
            hardware,
            enrolled,
            outcome,
        }
    }

    /// Enrolled sensor that always matches
    pub fn available() -> Self {
        Self::new(true, true, Arc::new(AlwaysSucceed))
    }

    /// No sensor at all
    pub fn unavailable() -> Self {
        Self::new(false, false, Arc::new(AlwaysSucceed))
    }
}

#[async_trait]
impl BiometricDevice for SimulatedBiometrics {
    async fn has_hardware(&self) -> Result<bool, BiometricError> {
        Ok(self.hardware)
    }

    async fn is_enrolled(&self) -> Result<bool, BiometricError> {
        Ok(self.enrolled)
    }

    async fn authenticate(&self, _prompt: &str) -> BiometricResult {
        if !(self.hardware && self.enrolled) {
            return BiometricResult::Error("sensor not available".to_string());
        }
        if self.outcome.succeeds() {
            BiometricResult::Success
        } else {
            BiometricResult::Failed
        }
    }
}
